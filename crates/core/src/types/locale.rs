//! Preferred-language normalization.
//!
//! Stripe accepts a fixed set of customer locales. POSIX locale strings such
//! as `es_ES.UTF-8` are reduced to the language Stripe understands, keeping
//! the handful of region-qualified locales Stripe supports.

use core::fmt;

/// Languages Stripe accepts without a region qualifier.
const SUPPORTED: &[&str] = &[
    "bg", "cs", "da", "de", "el", "en", "es", "et", "fi", "fil", "fr", "hr", "hu", "id", "it",
    "ja", "ko", "lt", "lv", "ms", "mt", "nb", "nl", "pl", "pt", "ro", "ru", "sk", "sl", "sv",
    "th", "tr", "vi", "zh", "or",
];

/// A Stripe customer locale, or `auto` when none applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    /// The "let Stripe decide" value.
    pub const AUTO: &'static str = "auto";

    /// Normalize a POSIX-style locale (`lang[_COUNTRY][.encoding]`).
    ///
    /// ```
    /// use subkit_core::Language;
    ///
    /// assert_eq!(Language::normalize("es_ES.UTF-8").as_str(), "es");
    /// assert_eq!(Language::normalize("en_GB").as_str(), "en-GB");
    /// assert_eq!(Language::normalize("xx").as_str(), "auto");
    /// ```
    #[must_use]
    pub fn normalize(locale: &str) -> Self {
        let (language, rest) = locale.split_once('_').unwrap_or((locale, ""));
        let country = rest.split_once('.').map_or(rest, |(country, _)| country);

        let compound = match (language, country) {
            ("en", "GB") => Some("en-GB"),
            ("fr", "CA") => Some("fr-CA"),
            ("pt", "BR") => Some("pt-BR"),
            ("zh", "HK") => Some("zh-HK"),
            ("zh", "TW") => Some("zh-TW"),
            _ => None,
        };
        if let Some(compound) = compound {
            return Self(compound.to_owned());
        }

        if SUPPORTED.contains(&language) {
            Self(language.to_owned())
        } else {
            Self(Self::AUTO.to_owned())
        }
    }

    /// Returns the locale string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization fell back to `auto`.
    #[must_use]
    pub fn is_auto(&self) -> bool {
        self.0 == Self::AUTO
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spanish_variants_collapse() {
        for input in ["es_ES.UTF-8", "es_ES", "es"] {
            assert_eq!(Language::normalize(input).as_str(), "es", "{input}");
        }
    }

    #[test]
    fn test_region_qualified_locales() {
        assert_eq!(Language::normalize("en_GB.UTF-8").as_str(), "en-GB");
        assert_eq!(Language::normalize("fr_CA").as_str(), "fr-CA");
        assert_eq!(Language::normalize("pt_BR").as_str(), "pt-BR");
        assert_eq!(Language::normalize("zh_TW").as_str(), "zh-TW");
        assert_eq!(Language::normalize("en_US").as_str(), "en");
        assert_eq!(Language::normalize("pt_PT").as_str(), "pt");
    }

    #[test]
    fn test_unknown_is_auto() {
        assert!(Language::normalize("xx_YY").is_auto());
        assert!(Language::normalize("").is_auto());
        assert!(Language::normalize("C.UTF-8").is_auto());
    }
}
