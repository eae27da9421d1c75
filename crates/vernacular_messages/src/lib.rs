//! Message formatting and lookup for Vernacular.
//!
//! - [`MessageFormat`] - Positional `{n}` templates
//! - [`Resources`] - Message templates per code and locale, with
//!   [`MapResources`] and file-backed [`BundleResources`]
//! - [`ResourceLoader`] - Creates resource sets from configured base names
//! - [`MessageSource`] - Code lookup with default-template fallback
//!
//! A missing code or a malformed template never fails a lookup: the caller's
//! default template is used, and a template that cannot be parsed is returned
//! as written.
//!
//! ```
//! use vernacular_config::Locale;
//! use vernacular_messages::{MapResources, MessageSource};
//!
//! let source = MessageSource::new(MapResources::new("empty"));
//! let en = Locale::new("en");
//!
//! assert_eq!(source.message("Hello {0}", &["missing.code"], &[&"x"], &en), "Hello x");
//! assert_eq!(source.message("Hello {0", &["missing.code"], &[&"x"], &en), "Hello {0");
//! ```

mod format;
mod resources;
mod source;

pub use format::{FormatError, MessageFormat, format_or_raw};
pub use resources::{
    BundleLoader, BundleResources, MapResources, ResourceLoader, Resources, StaticLoader,
};
pub use source::{MessageSource, message};
