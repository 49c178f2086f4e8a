//! Domain types shared across Hearth: locales and owner identities.

use crate::error::HearthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// Language / region / variant selector.
///
/// Equality is structural. Language is stored lower case, region upper case,
/// variant as given. [`Locale::ROOT`] (empty language) names the base bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale {
    language: String,
    region: Option<String>,
    variant: Option<String>,
}

impl Locale {
    /// The locale-neutral base bundle.
    pub const ROOT: Locale = Locale {
        language: String::new(),
        region: None,
        variant: None,
    };

    /// Builds a locale from already-split parts. Empty parts count as absent.
    pub fn new(language: &str, region: Option<&str>, variant: Option<&str>) -> Self {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        Self {
            language: language.trim().to_ascii_lowercase(),
            region: non_empty(region).map(str::to_ascii_uppercase),
            variant: non_empty(variant).map(str::to_string),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.language.is_empty() && self.region.is_none() && self.variant.is_none()
    }

    /// Fallback chain, most specific first. Never includes [`Locale::ROOT`].
    ///
    /// `pl-PL-UNIX` -> `[pl-PL-UNIX, pl-PL, pl]`
    pub fn candidates(&self) -> Vec<Locale> {
        let mut chain = Vec::with_capacity(3);
        if self.is_root() {
            return chain;
        }
        if self.variant.is_some() {
            chain.push(self.clone());
        }
        if self.region.is_some() {
            chain.push(Locale {
                language: self.language.clone(),
                region: self.region.clone(),
                variant: None,
            });
        }
        if !self.language.is_empty() {
            chain.push(Locale {
                language: self.language.clone(),
                region: None,
                variant: None,
            });
        }
        chain
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for Locale {
    /// `pl-PL-UNIX`; a variant without region keeps an empty slot (`en--POSIX`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        match (&self.region, &self.variant) {
            (Some(r), Some(v)) => write!(f, "-{r}-{v}"),
            (Some(r), None) => write!(f, "-{r}"),
            (None, Some(v)) => write!(f, "--{v}"),
            (None, None) => Ok(()),
        }
    }
}

impl FromStr for Locale {
    type Err = HearthError;

    /// Accepts `-` or `_` separators and POSIX-style suffixes
    /// (`pl_PL.UTF-8@euro` parses as `pl-PL`). `C` and `POSIX` map to root.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        let tag = tag.split(['.', '@']).next().unwrap_or_default();
        if tag.is_empty() || tag == "C" || tag == "POSIX" {
            return Ok(Self::ROOT);
        }

        let mut parts = tag.splitn(3, ['-', '_']);
        let language = parts.next().unwrap_or_default();
        let region = parts.next();
        let variant = parts.next();

        let invalid = |what: &str| HearthError::InvalidInput(format!("{what} in locale {s:?}"));

        if !(2..=8).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(invalid("bad language"));
        }
        if let Some(r) = region.filter(|r| !r.is_empty()) {
            if !(2..=3).contains(&r.len()) || !r.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(invalid("bad region"));
            }
        }
        if let Some(v) = variant {
            if v.is_empty() || !v.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(invalid("bad variant"));
            }
        }

        Ok(Self::new(language, region, variant))
    }
}

impl TryFrom<String> for Locale {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.to_string()
    }
}

// ---------------------------------------------------------------------------
// Owner identity
// ---------------------------------------------------------------------------

/// Stable identifier of the component a bundle is loaded for.
///
/// Usually a fully-qualified name (`com.acme.ui.MainWindow`, or a Rust path
/// via [`OwnerId::of`]). `Arc<str>` so cache keys and handles clone cheaply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct OwnerId(Arc<str>);

impl OwnerId {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Owner identity of a Rust type, e.g. `my_app::ui::MainWindow`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-stem form: path separators (`.` and `::`) become `_`.
    pub fn bundle_base_name(&self) -> String {
        self.0.replace("::", "_").replace('.', "_")
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OwnerId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_case() {
        let l: Locale = "PL_pl".parse().unwrap();
        assert_eq!(l.language(), "pl");
        assert_eq!(l.region(), Some("PL"));
        assert_eq!(l.to_string(), "pl-PL");
    }

    #[test]
    fn strips_posix_suffixes() {
        let l: Locale = "pl_PL.UTF-8@euro".parse().unwrap();
        assert_eq!(l, Locale::new("pl", Some("PL"), None));
        assert!("C".parse::<Locale>().unwrap().is_root());
    }

    #[test]
    fn rejects_garbage() {
        assert!("p".parse::<Locale>().is_err());
        assert!("en-TOOLONG".parse::<Locale>().is_err());
        assert!("12-US".parse::<Locale>().is_err());
    }

    #[test]
    fn candidates_most_specific_first() {
        let l: Locale = "pl-PL-UNIX".parse().unwrap();
        let chain: Vec<String> = l.candidates().iter().map(ToString::to_string).collect();
        assert_eq!(chain, ["pl-PL-UNIX", "pl-PL", "pl"]);
        assert!(Locale::ROOT.candidates().is_empty());
    }

    #[test]
    fn variant_without_region_roundtrips_display() {
        let l = Locale::new("en", None, Some("POSIX"));
        assert_eq!(l.to_string(), "en--POSIX");
        assert_eq!(l.to_string().parse::<Locale>().unwrap(), l);
        assert_eq!(l.candidates().len(), 2);
    }

    #[test]
    fn serde_as_string() {
        let l: Locale = "de-AT".parse().unwrap();
        assert_eq!(serde_json::to_string(&l).unwrap(), "\"de-AT\"");
        let back: Locale = serde_json::from_str("\"de_AT\"").unwrap();
        assert_eq!(back, l);
    }

    #[test]
    fn owner_base_name() {
        assert_eq!(
            OwnerId::from("com.acme.ui.MainWindow").bundle_base_name(),
            "com_acme_ui_MainWindow"
        );
        struct MainWindow;
        assert!(OwnerId::of::<MainWindow>().bundle_base_name().ends_with("_MainWindow"));
    }
}
