//! Resource bundle cache, queued text-file I/O, and the shutdown registry.

pub mod cache;
pub mod shutdown;
pub mod text_io;

pub use cache::{
    lookup_text, lookup_text_with_trailing_space, BundleHandle, ReloadReport, ResourceCache,
};
pub use shutdown::{FnParticipant, ShutdownParticipant, ShutdownRegistry, ShutdownReport};
pub use text_io::{Completion, ReadHandle, TextIo, WriteHandle};

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
