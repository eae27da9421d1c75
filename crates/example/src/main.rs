//! Example Vernacular application.
//!
//! An application scope with a plugin scope below it. The plugin introduces
//! its own configuration and therefore gets its own context provider.
//!
//! # Usage
//!
//! ```bash
//! vernacular-demo [config_dir]
//! ```
//!
//! With `config_dir`, the application reads `config_dir/i18n.properties`, the
//! plugin reads `config_dir/plugin/i18n.properties`, and message bundles are
//! looked up under `config_dir`. Without it, an in-memory setup is used.
//!
//! Set `VERNACULAR_LOG_FORMAT` to `pretty`, `compact` or `json`.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use vernacular_config::{ConfigCache, ConfigSources, FileSources, Locale, MemorySources, Settings};
use vernacular_context::{ContextProvider, Factories, I18n, global};
use vernacular_messages::{BundleLoader, MapResources, StaticLoader};
use vernacular_scope::Scope;
use vernacular_telemetry::{TracingConfig, TracingFormat};

fn main() {
    let format = std::env::var("VERNACULAR_LOG_FORMAT")
        .ok()
        .and_then(|name| name.parse().ok())
        .unwrap_or(TracingFormat::Compact);
    TracingConfig::new()
        .with_level(Level::INFO)
        .with_format(format)
        .init();

    let app = Scope::root("app");
    let plugin = app.child("plugin");

    let config_dir = std::env::args().nth(1).map(PathBuf::from);
    let (sources, factories) = match &config_dir {
        Some(dir) if dir.is_dir() => file_setup(dir, &app, &plugin),
        Some(dir) => {
            eprintln!("Error: {} is not a directory", dir.display());
            std::process::exit(1);
        }
        None => memory_setup(&app, &plugin),
    };

    let cache = Arc::new(ConfigCache::new(sources));
    let i18n = match I18n::bootstrap(&app, cache, factories) {
        Ok(i18n) => i18n,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = i18n.configure(&plugin) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    let i18n = global::init(i18n);

    for scope in [&app, &plugin] {
        let _entered = scope.enter();
        tracing::info!(
            %scope,
            locale = %i18n.locale(),
            available = ?i18n.available_locales(),
            message = %i18n.message("Hello {0}", &["greeting"], &[&"Ada"]),
            "resolved"
        );
    }

    // A worker inherits the plugin's current locale, then diverges.
    let worker = {
        let _entered = plugin.enter();
        i18n.set_locale(Locale::new("fr"));
        let shared = Arc::clone(&i18n);
        i18n.spawn(move || {
            let inherited = shared.locale();
            shared.set_locale(Locale::new("it"));
            (inherited, shared.locale())
        })
    };
    match worker.join() {
        Ok((inherited, changed)) => {
            let _entered = plugin.enter();
            tracing::info!(%inherited, %changed, parent = %i18n.locale(), "worker finished");
        }
        Err(_) => tracing::error!("worker panicked"),
    }

    let before = {
        let _entered = plugin.enter();
        i18n.context()
    };
    i18n.invalidate();
    let _entered = plugin.enter();
    tracing::info!(
        still_valid = i18n.provider().is_valid(&before),
        locale = %i18n.locale(),
        "after invalidation"
    );
}

fn file_setup(
    dir: &std::path::Path,
    app: &Scope,
    plugin: &Scope,
) -> (Arc<dyn ConfigSources>, Factories) {
    let sources = FileSources::new();
    sources.attach(app, dir);
    sources.attach(plugin, dir.join("plugin"));
    let factories = Factories::default().with_loader(BundleLoader::new(dir));
    (Arc::new(sources), factories)
}

fn memory_setup(app: &Scope, plugin: &Scope) -> (Arc<dyn ConfigSources>, Factories) {
    let sources = MemorySources::new();
    sources.attach(
        app,
        "memory:app",
        Settings::builder()
            .strategy("scoped")
            .provider("shared")
            .default_locale(Locale::new("en"))
            .available(["en", "de"])
            .resources("app")
            .build()
            .to_properties(),
    );
    sources.attach(
        plugin,
        "memory:plugin",
        Settings::builder()
            .provider("thread")
            .inherited(true)
            .default_locale(Locale::new("de"))
            .resources("plugin")
            .build()
            .to_properties(),
    );

    let loader = StaticLoader::new()
        .with(MapResources::new("app").with_base("greeting", "Hello, {0}!"))
        .with(
            MapResources::new("plugin")
                .with_base("greeting", "Hallo, {0}!")
                .with(Locale::new("fr"), "greeting", "Bonjour, {0} !"),
        );
    (Arc::new(sources), Factories::default().with_loader(loader))
}
