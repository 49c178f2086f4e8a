//! In-memory bundle source for tests and embedders that ship catalogs
//! inside the binary.

use crate::{fallback, BundleSource, Entries, ResolvedBundle};
use hearth_core::error::{HearthError, HearthResult};
use hearth_core::{Locale, OwnerId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Catalogs keyed by `(owner, exact locale)`, resolved with the same
/// fallback rules as [`DirectorySource`](crate::DirectorySource).
///
/// A catalog can also be marked broken, which makes any resolution that
/// touches it fail with `ResourceLoad`.
#[derive(Debug, Default)]
pub struct MemorySource {
    default_locale: Locale,
    catalogs: RwLock<HashMap<(OwnerId, Locale), Catalog>>,
}

#[derive(Debug, Clone)]
enum Catalog {
    Entries(Entries),
    Broken(String),
}

impl MemorySource {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            catalogs: RwLock::default(),
        }
    }

    /// Adds or replaces a catalog.
    pub fn insert<I, K, V>(&self, owner: impl Into<OwnerId>, locale: Locale, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((owner.into(), locale), Catalog::Entries(entries));
    }

    /// Marks a catalog as present but unreadable.
    pub fn insert_broken(&self, owner: impl Into<OwnerId>, locale: Locale, reason: impl Into<String>) {
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((owner.into(), locale), Catalog::Broken(reason.into()));
    }

    pub fn remove(&self, owner: &OwnerId, locale: &Locale) {
        self.catalogs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(owner.clone(), locale.clone()));
    }
}

impl BundleSource for MemorySource {
    fn load(&self, owner: &OwnerId, locale: &Locale) -> HearthResult<ResolvedBundle> {
        let catalogs = self.catalogs.read().unwrap_or_else(PoisonError::into_inner);
        fallback::resolve(owner, locale, &self.default_locale, |candidate| {
            match catalogs.get(&(owner.clone(), candidate.clone())) {
                None => Ok(None),
                Some(Catalog::Entries(entries)) => Ok(Some(entries.clone())),
                Some(Catalog::Broken(reason)) => Err(HearthError::ResourceLoad {
                    owner: owner.to_string(),
                    reason: reason.clone(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_inserted_catalog() {
        let src = MemorySource::new("en".parse().unwrap());
        src.insert("app", "en".parse().unwrap(), [("hi", "Hello")]);
        let got = src.load(&"app".into(), &"en-AU".parse().unwrap()).unwrap();
        assert_eq!(got.locale.to_string(), "en");
        assert_eq!(got.entries["hi"], "Hello");
    }

    #[test]
    fn broken_catalog_fails_load() {
        let src = MemorySource::new("en".parse().unwrap());
        src.insert_broken("app", "en".parse().unwrap(), "corrupt");
        let err = src.load(&"app".into(), &"en".parse().unwrap()).unwrap_err();
        assert_eq!(
            err,
            HearthError::ResourceLoad {
                owner: "app".into(),
                reason: "corrupt".into()
            }
        );
    }

    #[test]
    fn removed_catalog_is_not_found() {
        let src = MemorySource::new("en".parse().unwrap());
        let owner = OwnerId::from("app");
        let en: Locale = "en".parse().unwrap();
        src.insert(owner.clone(), en.clone(), [("hi", "Hello")]);
        src.remove(&owner, &en);
        assert!(matches!(
            src.load(&owner, &en),
            Err(HearthError::ResourceNotFound { .. })
        ));
    }
}
