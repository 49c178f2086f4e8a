//! Per-owner, locale-scoped resource bundle cache.
//!
//! One [`BundleHandle`] per owner. A handle is stale exactly when it was
//! loaded for a different locale than the one requested; there is no TTL and
//! no file watching. Reloads replace the handle wholesale, so readers holding
//! an `Arc<BundleHandle>` never observe a half-updated bundle.

use hearth_core::error::HearthError;
use hearth_core::{Locale, OwnerId};
use hearth_provider::{BundleSource, ResolvedBundle};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// Returned for lookups made without a key.
pub const NULL_KEY_TEXT: &str = "NULL";

// ---------------------------------------------------------------------------
// Bundle handle
// ---------------------------------------------------------------------------

/// Immutable snapshot of one owner's bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleHandle {
    owner: OwnerId,
    requested_locale: Locale,
    loaded_locale: Option<Locale>,
    entries: HashMap<String, String>,
    #[serde(serialize_with = "serialize_error")]
    load_error: Option<HearthError>,
}

impl BundleHandle {
    pub fn loaded(owner: OwnerId, requested: Locale, resolved: ResolvedBundle) -> Self {
        Self {
            owner,
            requested_locale: requested,
            loaded_locale: Some(resolved.locale),
            entries: resolved.entries,
            load_error: None,
        }
    }

    pub fn failed(owner: OwnerId, requested: Locale, error: HearthError) -> Self {
        Self {
            owner,
            requested_locale: requested,
            loaded_locale: None,
            entries: HashMap::new(),
            load_error: Some(error),
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The locale this handle was loaded for. Staleness is judged on this.
    pub fn requested_locale(&self) -> &Locale {
        &self.requested_locale
    }

    /// The locale whose catalog was actually resolved; `None` if loading failed.
    pub fn loaded_locale(&self) -> Option<&Locale> {
        self.loaded_locale.as_ref()
    }

    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    pub fn load_error(&self) -> Option<&HearthError> {
        self.load_error.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.load_error.is_some()
    }

    /// Localized text for `key`, or `key` itself if the bundle failed to load
    /// or has no such entry.
    pub fn text(&self, key: &str) -> String {
        if self.load_error.is_some() {
            return key.to_string();
        }
        match self.entries.get(key) {
            Some(value) => value.clone(),
            None => {
                tracing::debug!(owner = %self.owner, key, locale = %self.requested_locale, "missing text key");
                key.to_string()
            }
        }
    }

    /// [`text`](Self::text) plus one trailing space, for label concatenation.
    pub fn text_spaced(&self, key: &str) -> String {
        let mut text = self.text(key);
        text.push(' ');
        text
    }

    /// Like [`text`](Self::text) but tolerates a missing key, answering
    /// [`NULL_KEY_TEXT`].
    pub fn text_opt(&self, key: Option<&str>) -> String {
        match key {
            Some(key) => self.text(key),
            None => {
                let error = HearthError::NullKey;
                tracing::warn!(owner = %self.owner, error = %error, "returning {NULL_KEY_TEXT}");
                NULL_KEY_TEXT.to_string()
            }
        }
    }
}

/// `lookupText`: see [`BundleHandle::text`].
pub fn lookup_text(handle: &BundleHandle, key: &str) -> String {
    handle.text(key)
}

/// `lookupTextWithTrailingSpace`: see [`BundleHandle::text_spaced`].
pub fn lookup_text_with_trailing_space(handle: &BundleHandle, key: &str) -> String {
    handle.text_spaced(key)
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<HearthError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Result of [`ResourceCache::reload_all`].
#[derive(Debug, Clone)]
pub struct ReloadReport {
    pub locale: Locale,
    pub reloaded: Vec<OwnerId>,
    pub failed: Vec<(OwnerId, HearthError)>,
}

impl ReloadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owner -> bundle table in front of a [`BundleSource`].
///
/// `get` and `reload_all` hold the table lock across the reload, so
/// concurrent callers never load the same owner twice. Loads are
/// synchronous on the caller's thread.
pub struct ResourceCache {
    source: Arc<dyn BundleSource>,
    default_locale: RwLock<Locale>,
    table: Mutex<HashMap<OwnerId, Arc<BundleHandle>>>,
}

impl ResourceCache {
    /// `default_locale` is what [`get_default`](Self::get_default) asks for,
    /// typically the host's detected locale.
    pub fn new(source: Arc<dyn BundleSource>, default_locale: Locale) -> Self {
        Self {
            source,
            default_locale: RwLock::new(default_locale),
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Cached handle for `owner` if it was loaded for `locale`; otherwise
    /// reloads under `locale`, replaces the entry and returns the new handle.
    pub fn get(&self, owner: &OwnerId, locale: &Locale) -> Arc<BundleHandle> {
        let mut table = self.lock_table();
        self.get_locked(&mut table, owner, locale)
    }

    /// [`get`](Self::get) under the current default locale.
    ///
    /// The default is read under the table lock, so a concurrent
    /// [`reload_all`](Self::reload_all) is observed either fully or not at all.
    pub fn get_default(&self, owner: &OwnerId) -> Arc<BundleHandle> {
        let mut table = self.lock_table();
        let locale = self.default_locale();
        self.get_locked(&mut table, owner, &locale)
    }

    fn get_locked(
        &self,
        table: &mut HashMap<OwnerId, Arc<BundleHandle>>,
        owner: &OwnerId,
        locale: &Locale,
    ) -> Arc<BundleHandle> {
        if let Some(handle) = table.get(owner) {
            if handle.requested_locale == *locale {
                return Arc::clone(handle);
            }
            tracing::debug!(
                owner = %owner,
                cached = %handle.requested_locale,
                requested = %locale,
                "locale changed; reloading bundle"
            );
        }

        let handle = Arc::new(self.load(owner, locale));
        table.insert(owner.clone(), Arc::clone(&handle));
        handle
    }

    /// Reloads every cached owner under `locale` and makes it the default.
    ///
    /// Each owner is independent: a failure is recorded and the rest still
    /// reload.
    pub fn reload_all(&self, locale: &Locale) -> ReloadReport {
        let mut table = self.lock_table();
        self.set_default_locale(locale.clone());
        let owners: Vec<OwnerId> = table.keys().cloned().collect();
        let mut report = ReloadReport {
            locale: locale.clone(),
            reloaded: Vec::with_capacity(owners.len()),
            failed: Vec::new(),
        };

        for owner in owners {
            let handle = self.load(&owner, locale);
            match handle.load_error() {
                Some(e) => report.failed.push((owner.clone(), e.clone())),
                None => report.reloaded.push(owner.clone()),
            }
            table.insert(owner, Arc::new(handle));
        }

        tracing::info!(
            locale = %locale,
            reloaded = report.reloaded.len(),
            failed = report.failed.len(),
            "reloaded all bundles"
        );
        report
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_default_locale(&self, locale: Locale) {
        *self
            .default_locale
            .write()
            .unwrap_or_else(PoisonError::into_inner) = locale;
    }

    /// Owners currently cached, in no particular order.
    pub fn owners(&self) -> Vec<OwnerId> {
        self.lock_table().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One load attempt. Never retried; a failed handle is cached as is.
    fn load(&self, owner: &OwnerId, locale: &Locale) -> BundleHandle {
        let attempt = catch_unwind(AssertUnwindSafe(|| self.source.load(owner, locale)))
            .unwrap_or_else(|payload| {
                Err(HearthError::ResourceLoad {
                    owner: owner.to_string(),
                    reason: format!("source panicked: {}", crate::panic_message(payload.as_ref())),
                })
            });

        match attempt {
            Ok(resolved) => {
                tracing::debug!(
                    owner = %owner,
                    requested = %locale,
                    resolved = %resolved.locale,
                    keys = resolved.entries.len(),
                    "bundle loaded"
                );
                BundleHandle::loaded(owner.clone(), locale.clone(), resolved)
            }
            Err(e @ HearthError::ResourceNotFound { .. }) => {
                tracing::warn!(owner = %owner, locale = %locale, "no resource bundle; keys will echo");
                BundleHandle::failed(owner.clone(), locale.clone(), e)
            }
            Err(e) => {
                tracing::error!(owner = %owner, locale = %locale, error = %e, "failed to load resource bundle");
                BundleHandle::failed(owner.clone(), locale.clone(), e)
            }
        }
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<OwnerId, Arc<BundleHandle>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
