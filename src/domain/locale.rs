//! Supported content locales.
//!
//! The site is published in German and Albanian. Any locale string coming
//! from a browser, a query parameter or the command line is folded onto one
//! of the two via [`normalize_locale`]; unknown values fall back to German.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    De,
    Sq,
}

impl Locale {
    pub const DEFAULT: Locale = Locale::De;

    /// Sync order: default locale first.
    pub const ALL: [Locale; 2] = [Locale::De, Locale::Sq];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::De => "de",
            Locale::Sq => "sq",
        }
    }

    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "de" => Some(Locale::De),
            "sq" => Some(Locale::Sq),
            _ => None,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an arbitrary locale string onto a supported locale.
///
/// Only the first two characters are considered, case-insensitively, so
/// `de-CH`, `DE` and `sq_AL` all resolve. Missing or unsupported input yields
/// [`Locale::DEFAULT`].
pub fn normalize_locale(input: Option<&str>) -> Locale {
    let Some(raw) = input else {
        return Locale::DEFAULT;
    };

    let prefix: String = raw.chars().take(2).collect::<String>().to_lowercase();
    Locale::from_code(&prefix).unwrap_or(Locale::DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_codes_map_to_themselves() {
        assert_eq!(normalize_locale(Some("de")), Locale::De);
        assert_eq!(normalize_locale(Some("sq")), Locale::Sq);
    }

    #[test]
    fn region_suffixes_and_case_are_ignored() {
        assert_eq!(normalize_locale(Some("de-CH")), Locale::De);
        assert_eq!(normalize_locale(Some("SQ-AL")), Locale::Sq);
        assert_eq!(normalize_locale(Some("Sq_al")), Locale::Sq);
    }

    #[test]
    fn unknown_or_missing_fall_back_to_default() {
        for input in [None, Some(""), Some("s"), Some("en-US"), Some("fr"), Some("ds")] {
            assert_eq!(normalize_locale(input), Locale::DEFAULT, "input {input:?}");
        }
    }

    #[test]
    fn result_is_always_supported() {
        let samples = ["", "d", "de", "dE-x", "ß", "☃☃", "sqx", "zz", "  de"];
        for sample in samples {
            let locale = normalize_locale(Some(sample));
            assert!(Locale::ALL.contains(&locale));
        }
        assert_eq!(normalize_locale(Some("  sq")), Locale::DEFAULT);
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        let json = serde_json::to_string(&Locale::Sq).expect("serialize");
        assert_eq!(json, "\"sq\"");
    }
}
