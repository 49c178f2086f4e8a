//! Locale and owner identity types, and the shared error taxonomy.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod types;

pub use error::{HearthError, HearthResult};
pub use types::{Locale, OwnerId};
