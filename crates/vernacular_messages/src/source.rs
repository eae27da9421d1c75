//! Message lookup with code and template fallback.

use crate::format::format_or_raw;
use crate::resources::Resources;
use core::fmt::Display;
use std::sync::Arc;
use vernacular_config::Locale;

/// Looks up messages in one resource set.
///
/// Lookup never fails: codes are tried in order, then the caller's default
/// template is used. Malformed templates are returned verbatim.
///
/// # Example
///
/// ```
/// use vernacular_config::Locale;
/// use vernacular_messages::{MapResources, MessageSource};
///
/// let source = MessageSource::new(
///     MapResources::new("messages").with_base("greeting", "Welcome, {0}!"),
/// );
/// let en = Locale::new("en");
///
/// assert_eq!(source.message("Hi {0}", &["greeting"], &[&"Ada"], &en), "Welcome, Ada!");
/// assert_eq!(source.message("Hi {0}", &["missing"], &[&"Ada"], &en), "Hi Ada");
/// ```
#[derive(Clone)]
pub struct MessageSource {
    resources: Arc<dyn Resources>,
}

impl core::fmt::Debug for MessageSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageSource")
            .field("resources", &self.resources.base_name())
            .finish()
    }
}

impl MessageSource {
    /// Wraps `resources`.
    #[must_use]
    pub fn new(resources: impl Resources) -> Self {
        Self {
            resources: Arc::new(resources),
        }
    }

    /// Wraps already shared `resources`.
    #[must_use]
    pub fn from_shared(resources: Arc<dyn Resources>) -> Self {
        Self { resources }
    }

    /// Returns the underlying resource set.
    #[must_use]
    pub fn resources(&self) -> &Arc<dyn Resources> {
        &self.resources
    }

    /// Returns the template of the first code that resolves in `locale`.
    #[must_use]
    pub fn find(&self, codes: &[&str], locale: &Locale) -> Option<String> {
        codes.iter().find_map(|code| {
            let template = self.resources.template(code, locale);
            if template.is_none() {
                tracing::trace!(
                    resources = self.resources.base_name(),
                    code,
                    %locale,
                    "message code not found"
                );
            }
            template
        })
    }

    /// Formats the first resolvable code with `args`, falling back to
    /// `default_template`.
    #[must_use]
    pub fn message(
        &self,
        default_template: &str,
        codes: &[&str],
        args: &[&dyn Display],
        locale: &Locale,
    ) -> String {
        message(Some(self), default_template, codes, args, locale)
    }
}

/// Formats a message from `source` when present, or from `default_template`.
///
/// Used by callers whose resource set is optional (no `resources` key
/// configured).
#[must_use]
pub fn message(
    source: Option<&MessageSource>,
    default_template: &str,
    codes: &[&str],
    args: &[&dyn Display],
    locale: &Locale,
) -> String {
    let template = source.and_then(|source| source.find(codes, locale));
    match template {
        Some(template) => format_or_raw(&template, args),
        None => {
            tracing::trace!(?codes, "falling back to default message template");
            format_or_raw(default_template, args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::MapResources;

    fn source() -> MessageSource {
        MessageSource::new(
            MapResources::new("m")
                .with_base("first", "First {0}")
                .with(Locale::new("fr"), "second", "Deuxième {0}"),
        )
    }

    #[test]
    fn codes_are_tried_in_order() {
        let fr = Locale::new("fr");
        assert_eq!(
            source().message("d", &["missing", "second", "first"], &[&1], &fr),
            "Deuxième 1"
        );
        assert_eq!(
            source().message("d", &["first", "second"], &[&1], &fr),
            "First 1"
        );
    }

    #[test]
    fn locale_limits_resolution() {
        let en = Locale::new("en");
        assert_eq!(source().find(&["second"], &en), None);
        assert_eq!(source().message("Default {0}", &["second"], &[&"x"], &en), "Default x");
    }

    #[test]
    fn no_source_uses_default_template() {
        let en = Locale::new("en");
        assert_eq!(message(None, "Hello {0}", &["any"], &[&"x"], &en), "Hello x");
        assert_eq!(message(None, "Hello {0", &["any"], &[&"x"], &en), "Hello {0");
    }
}
