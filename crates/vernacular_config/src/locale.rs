//! Locale identifiers.

use crate::error::LocaleError;
use core::str::FromStr;

/// A language with optional country and variant, e.g. `en`, `en_US`,
/// `de_DE_POSIX`.
///
/// Parsing accepts `_` or `-` as separator and normalizes case: the language
/// is lowercased, the country uppercased. `Display` renders the underscore
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale {
    language: String,
    country: Option<String>,
    variant: Option<String>,
}

impl Locale {
    /// Creates a locale with only a language.
    ///
    /// # Panics
    ///
    /// Panics if `language` is not 2 to 8 ASCII letters.
    #[must_use]
    pub fn new(language: &str) -> Self {
        assert!(
            is_language(language),
            "'{language}' is not a valid language code"
        );
        Self {
            language: language.to_ascii_lowercase(),
            country: None,
            variant: None,
        }
    }

    /// Returns a copy of this locale with the given country.
    ///
    /// # Panics
    ///
    /// Panics if `country` is not two ASCII letters or three digits.
    #[must_use]
    pub fn with_country(mut self, country: &str) -> Self {
        assert!(is_country(country), "'{country}' is not a valid country code");
        self.country = Some(country.to_ascii_uppercase());
        self
    }

    /// Returns the language code.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the country code, if any.
    #[must_use]
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Returns the variant, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// Returns this locale followed by its progressively less specific
    /// parents: `de_CH_x` → `de_CH` → `de`.
    #[must_use]
    pub fn fallback_chain(&self) -> Vec<Locale> {
        let mut chain = vec![self.clone()];
        if self.variant.is_some() {
            chain.push(Self {
                variant: None,
                ..self.clone()
            });
        }
        if self.country.is_some() {
            chain.push(Self {
                language: self.language.clone(),
                country: None,
                variant: None,
            });
        }
        chain
    }

    /// Determines the locale of the process environment.
    ///
    /// Reads `LC_ALL`, `LC_MESSAGES` and `LANG` in that order, ignoring
    /// encodings (`.UTF-8`) and modifiers (`@euro`). Falls back to `en` when
    /// nothing usable is set, including the `C` and `POSIX` locales.
    #[must_use]
    pub fn system_default() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| {
                let tag = value.split(['.', '@']).next().unwrap_or_default();
                match tag {
                    "" | "C" | "POSIX" => None,
                    tag => tag.parse().ok(),
                }
            })
            .unwrap_or_else(|| Self::new("en"))
    }

    /// Parses a comma-separated list of locales, skipping empty items.
    ///
    /// # Errors
    ///
    /// Returns the first item that is not a valid locale.
    pub fn parse_list(list: &str) -> Result<Vec<Locale>, LocaleError> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LocaleError(s.to_string());
        let mut parts = s.trim().splitn(3, ['_', '-']);

        let language = parts.next().filter(|l| is_language(l)).ok_or_else(invalid)?;
        let country = match parts.next() {
            None | Some("") => None,
            Some(country) if is_country(country) => Some(country.to_ascii_uppercase()),
            Some(_) => return Err(invalid()),
        };
        let variant = match parts.next() {
            None => None,
            Some(variant)
                if !variant.is_empty()
                    && variant
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
            {
                Some(variant.to_string())
            }
            Some(_) => return Err(invalid()),
        };

        Ok(Self {
            language: language.to_ascii_lowercase(),
            country,
            variant,
        })
    }
}

impl core::fmt::Display for Locale {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.language)?;
        match (&self.country, &self.variant) {
            (Some(country), Some(variant)) => write!(f, "_{country}_{variant}"),
            (Some(country), None) => write!(f, "_{country}"),
            (None, Some(variant)) => write!(f, "__{variant}"),
            (None, None) => Ok(()),
        }
    }
}

fn is_language(s: &str) -> bool {
    (2..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_country(s: &str) -> bool {
    (s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
        || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()))
}
