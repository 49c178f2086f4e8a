//! Locale-resource lookup service for Hearth.
//!
//! A [`BundleSource`] turns `(owner, locale)` into a resolved key/value
//! mapping, applying the most-specific-to-least-specific fallback chain.
//! The resource cache depends only on this trait.

pub mod directory;
pub mod fallback;
pub mod memory;
pub mod properties;

use hearth_core::error::HearthResult;
use hearth_core::{Locale, OwnerId};
use std::collections::HashMap;

pub use directory::DirectorySource;
pub use memory::MemorySource;

/// Key/value entries of one bundle.
pub type Entries = HashMap<String, String>;

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    /// Locale whose catalog was actually found (may differ from the request).
    pub locale: Locale,
    pub entries: Entries,
}

/// Abstraction for resolving localized bundles from any backing store.
///
/// Returns `HearthError::ResourceNotFound` when no catalog exists under any
/// fallback locale and `HearthError::ResourceLoad` when one exists but cannot
/// be read.
pub trait BundleSource: Send + Sync {
    fn load(&self, owner: &OwnerId, locale: &Locale) -> HearthResult<ResolvedBundle>;
}
