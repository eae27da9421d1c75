//! Integration tests for context validity, isolation and inheritance.

use std::sync::{Arc, Barrier};
use std::thread;

use vernacular_config::Locale;
use vernacular_context::{
    ContextProvider, ProviderBase, SharedContextProvider, ThreadContextProvider, WorkId,
};

fn thread_provider(inherited: bool) -> Arc<ThreadContextProvider> {
    Arc::new(ThreadContextProvider::new(
        ProviderBase::new().with_default_locale(Locale::new("en")),
        inherited,
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION INVALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// A valid context turns invalid on `invalidate()` and is replaced on the next
/// access, for both storing providers.
#[test]
fn invalidate_retires_issued_contexts() {
    let providers: [Arc<dyn ContextProvider>; 2] = [
        thread_provider(true),
        Arc::new(SharedContextProvider::new(ProviderBase::new())),
    ];

    for provider in providers {
        let context = provider.get_context();
        assert!(provider.is_valid(&context));

        provider.invalidate();

        assert!(!provider.is_valid(&context));
        let fresh = provider.get_context();
        assert!(!Arc::ptr_eq(&context, &fresh));
        assert_eq!(fresh.session_id(), provider.session_id());
        assert!(provider.is_valid(&fresh));
    }
}

/// Contexts held by other threads are judged stale once those threads observe
/// the new session.
#[test]
fn invalidation_is_visible_across_threads() {
    let provider = thread_provider(true);
    let threads = 4;
    let ready = Arc::new(Barrier::new(threads + 1));
    let invalidated = Arc::new(Barrier::new(threads + 1));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let ready = Arc::clone(&ready);
            let invalidated = Arc::clone(&invalidated);
            thread::spawn(move || {
                let before = provider.get_context();
                ready.wait();
                invalidated.wait();
                let valid_after = provider.is_valid(&before);
                let replaced = !Arc::ptr_eq(&before, &provider.get_context());
                (valid_after, replaced)
            })
        })
        .collect();

    ready.wait();
    provider.invalidate();
    invalidated.wait();

    for handle in handles {
        let (valid_after, replaced) = handle.join().expect("thread panicked");
        assert!(!valid_after);
        assert!(replaced);
    }
}

/// Each `invalidate()` changes the session exactly once.
#[test]
fn session_changes_only_on_invalidate() {
    let provider = thread_provider(true);
    let first = provider.session_id();
    provider.get_context();
    provider.clear_context();
    provider.set_locale(Locale::new("fr"));
    assert_eq!(provider.session_id(), first);

    provider.invalidate();
    let second = provider.session_id();
    assert_ne!(second, first);

    provider.invalidate();
    assert_ne!(provider.session_id(), second);
}

// ═══════════════════════════════════════════════════════════════════════════════
// THREAD ISOLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Two threads get distinct contexts whose locales change independently.
#[test]
fn threads_have_independent_contexts() {
    let provider = thread_provider(false);
    let barrier = Arc::new(Barrier::new(2));

    let spawn = |locale: &'static str| {
        let provider = Arc::clone(&provider);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let context = provider.get_context();
            context.set_locale(Locale::new(locale));
            barrier.wait();
            (context, provider.locale())
        })
    };

    let left = spawn("de");
    let right = spawn("ja");
    let (left_context, left_locale) = left.join().unwrap();
    let (right_context, right_locale) = right.join().unwrap();

    assert!(!Arc::ptr_eq(&left_context, &right_context));
    assert_eq!(left_locale, Locale::new("de"));
    assert_eq!(right_locale, Locale::new("ja"));
    assert_eq!(provider.locale(), Locale::new("en"));
}

/// Plain threads that used the provider leave no slot behind once joined.
#[test]
fn finished_threads_release_their_slots() {
    let provider = thread_provider(true);

    for _ in 0..200 {
        let provider = Arc::clone(&provider);
        thread::spawn(move || {
            provider.get_context();
            provider.invalidate();
            provider.get_context();
        })
        .join()
        .expect("thread panicked");
    }

    assert_eq!(provider.slot_count(), 0);
}

/// A thread that outlives the provider exits cleanly.
#[test]
fn thread_exit_after_provider_drop() {
    let provider = thread_provider(true);
    let used = Arc::new(Barrier::new(2));
    let dropped = Arc::new(Barrier::new(2));

    let worker = thread::spawn({
        let provider = Arc::clone(&provider);
        let used = Arc::clone(&used);
        let dropped = Arc::clone(&dropped);
        move || {
            provider.get_context();
            drop(provider);
            used.wait();
            dropped.wait();
        }
    });

    used.wait();
    drop(provider);
    dropped.wait();
    worker.join().expect("thread panicked");
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Concurrent first access to a fresh shared provider creates one context.
#[test]
fn shared_context_is_created_once_under_contention() {
    let provider = Arc::new(SharedContextProvider::new(ProviderBase::new()));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                provider.get_context()
            })
        })
        .collect();
    let contexts: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    let first = &contexts[0];
    assert!(contexts.iter().all(|context| Arc::ptr_eq(context, first)));
    assert!(provider.is_valid(first));
}

/// Clearing while other threads read never hands out a stale context.
#[test]
fn shared_clear_races_with_readers() {
    let provider = Arc::new(SharedContextProvider::new(ProviderBase::new()));
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads + 1));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let provider = Arc::clone(&provider);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..100 {
                    let context = provider.get_context();
                    assert_eq!(context.session_id(), provider.session_id());
                }
            })
        })
        .collect();

    barrier.wait();
    for _ in 0..100 {
        provider.clear_context();
    }
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let settled = provider.get_context();
    assert!(Arc::ptr_eq(&settled, &provider.get_context()));
}

// ═══════════════════════════════════════════════════════════════════════════════
// INHERITANCE TO CHILD UNITS OF WORK
// ═══════════════════════════════════════════════════════════════════════════════

/// A child starts from the parent's locale at spawn time; later changes on
/// either side stay local.
#[test]
fn child_starts_from_a_copy_of_the_parent() {
    let provider = thread_provider(true);
    provider.set_locale(Locale::new("it"));
    let parent_context = provider.get_context();

    let started = Arc::new(Barrier::new(2));
    let parent_changed = Arc::new(Barrier::new(2));
    let child = provider.spawn_child({
        let provider = Arc::clone(&provider);
        let started = Arc::clone(&started);
        let parent_changed = Arc::clone(&parent_changed);
        move || {
            let context = provider.get_context();
            let inherited = context.locale();
            context.set_locale(Locale::new("ko"));
            started.wait();
            parent_changed.wait();
            (Arc::as_ptr(&context) as usize, inherited, provider.locale())
        }
    });

    started.wait();
    assert_eq!(provider.locale(), Locale::new("it"));
    provider.set_locale(Locale::new("pt"));
    parent_changed.wait();

    let (child_ptr, inherited, child_after) = child.join().unwrap();
    assert_eq!(inherited, Locale::new("it"));
    assert_eq!(child_after, Locale::new("ko"));
    assert_ne!(child_ptr, Arc::as_ptr(&parent_context) as usize);
    assert_eq!(provider.locale(), Locale::new("pt"));
}

/// The explicit hand-off works for units of work that are not threads.
#[test]
fn explicit_hand_off_between_work_ids() {
    let provider = thread_provider(true);
    provider.set_locale(Locale::new("fi"));

    let child = WorkId::reserve();
    provider.on_spawn_child(WorkId::current(), child);

    {
        let _adopted = child.adopt();
        assert_eq!(provider.locale(), Locale::new("fi"));
        provider.set_locale(Locale::new("sv"));
    }
    assert_eq!(provider.locale(), Locale::new("fi"));

    provider.release(child);
    let _adopted = child.adopt();
    assert_eq!(provider.locale(), Locale::new("en"));
}
