//! Filesystem-backed bundle source.
//!
//! Catalogs live flat in one directory, named after the owner and locale:
//!
//! ```text
//! resources/bundles/com_acme_ui_MainWindow.properties         (base)
//! resources/bundles/com_acme_ui_MainWindow_pl.properties
//! resources/bundles/com_acme_ui_MainWindow_pl_PL.properties
//! resources/bundles/com_acme_ui_MainWindow_pl_PL_UNIX.properties
//! ```

use crate::{fallback, properties, BundleSource, Entries, ResolvedBundle};
use hearth_core::error::{HearthError, HearthResult};
use hearth_core::{Locale, OwnerId};
use std::io;
use std::path::{Path, PathBuf};

pub const CATALOG_EXTENSION: &str = "properties";

/// Resolves `.properties` catalogs from a base directory.
///
/// ```ignore
/// let source = DirectorySource::new("resources/bundles", "en".parse()?);
/// let bundle = source.load(&OwnerId::from("com.acme.ui.MainWindow"), &"pl-PL".parse()?)?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base_dir: PathBuf,
    default_locale: Locale,
}

impl DirectorySource {
    pub fn new(base_dir: impl Into<PathBuf>, default_locale: Locale) -> Self {
        Self {
            base_dir: base_dir.into(),
            default_locale,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Catalog path for one exact `(owner, locale)` pair.
    pub fn catalog_path(&self, owner: &OwnerId, locale: &Locale) -> PathBuf {
        let mut stem = owner.bundle_base_name();
        if !locale.is_root() {
            stem.push('_');
            stem.push_str(locale.language());
            if locale.region().is_some() || locale.variant().is_some() {
                stem.push('_');
                stem.push_str(locale.region().unwrap_or_default());
            }
            if let Some(variant) = locale.variant() {
                stem.push('_');
                stem.push_str(variant);
            }
        }
        self.base_dir.join(format!("{stem}.{CATALOG_EXTENSION}"))
    }

    fn read_catalog(&self, owner: &OwnerId, locale: &Locale) -> HearthResult<Option<Entries>> {
        let path = self.catalog_path(owner, locale);
        let text = match std::fs::read(&path) {
            Ok(bytes) => decode_catalog(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(HearthError::ResourceLoad {
                    owner: owner.to_string(),
                    reason: format!("{}: {e}", path.display()),
                })
            }
        };

        properties::parse(&text)
            .map(Some)
            .map_err(|reason| HearthError::ResourceLoad {
                owner: owner.to_string(),
                reason: format!("{}: {reason}", path.display()),
            })
    }
}

/// UTF-8 when valid, otherwise ISO-8859-1 (every byte is one code point).
fn decode_catalog(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

impl BundleSource for DirectorySource {
    fn load(&self, owner: &OwnerId, locale: &Locale) -> HearthResult<ResolvedBundle> {
        tracing::debug!(
            owner = %owner,
            locale = %locale,
            dir = %self.base_dir.display(),
            "loading bundle"
        );
        fallback::resolve(owner, locale, &self.default_locale, |candidate| {
            self.read_catalog(owner, candidate)
        })
    }
}
