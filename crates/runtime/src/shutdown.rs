//! Process-wide shutdown registry.
//!
//! Components that own background work register a [`ShutdownParticipant`];
//! the process driver calls [`ShutdownRegistry::shutdown_all`] exactly once
//! on its way out. Every participant runs in isolation: an error or a panic
//! in one is recorded in the [`ShutdownReport`] and the rest still run.

use hearth_core::error::{HearthError, HearthResult};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// A component with a single stop action.
pub trait ShutdownParticipant: Send + Sync {
    /// Label used in logs and in the report.
    fn name(&self) -> &str;

    fn shutdown(&self) -> HearthResult<()>;
}

/// Adapts a closure into a participant.
pub struct FnParticipant<F> {
    name: String,
    action: F,
}

impl<F> FnParticipant<F>
where
    F: Fn() -> HearthResult<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<F> ShutdownParticipant for FnParticipant<F>
where
    F: Fn() -> HearthResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn shutdown(&self) -> HearthResult<()> {
        (self.action)()
    }
}

/// Outcome of [`ShutdownRegistry::shutdown_all`].
#[derive(Debug, Default, Clone)]
pub struct ShutdownReport {
    /// Participants whose stop action returned `Ok`.
    pub completed: Vec<String>,
    /// Participants that returned an error or panicked.
    pub failed: Vec<(String, HearthError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Default)]
struct State {
    participants: Vec<Arc<dyn ShutdownParticipant>>,
    shut_down: bool,
}

/// Ordered list of shutdown participants.
///
/// Construct one at process start and hand `&ShutdownRegistry` to the
/// components that need it. [`ShutdownRegistry::global`] exists for code
/// that cannot be handed a reference.
#[derive(Default)]
pub struct ShutdownRegistry {
    state: Mutex<State>,
}

static GLOBAL: LazyLock<ShutdownRegistry> = LazyLock::new(ShutdownRegistry::new);

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance, created on first access.
    pub fn global() -> &'static ShutdownRegistry {
        &GLOBAL
    }

    /// Appends a participant. No de-duplication.
    ///
    /// Registering after [`shutdown_all`](Self::shutdown_all) has run stops
    /// the participant right away instead of leaking it.
    pub fn register(&self, participant: Arc<dyn ShutdownParticipant>) {
        let mut state = self.lock();
        if state.shut_down {
            drop(state);
            tracing::warn!(
                participant = participant.name(),
                "registered after shutdown; stopping immediately"
            );
            if let Err(e) = run_participant(participant.as_ref()) {
                tracing::error!(participant = participant.name(), error = %e, "late shutdown failed");
            }
            return;
        }
        tracing::debug!(participant = participant.name(), "registered for shutdown");
        state.participants.push(participant);
    }

    /// Registers a closure under `name`.
    pub fn register_fn<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn() -> HearthResult<()> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnParticipant::new(name, action)));
    }

    /// Runs every registered participant once, in registration order.
    ///
    /// Only the first call does any work; later calls log and return an
    /// empty report.
    pub fn shutdown_all(&self) -> ShutdownReport {
        let participants = {
            let mut state = self.lock();
            if state.shut_down {
                tracing::warn!("shutdown_all called more than once; ignoring");
                return ShutdownReport::default();
            }
            state.shut_down = true;
            std::mem::take(&mut state.participants)
        };

        tracing::info!(participants = participants.len(), "shutting down");

        let mut report = ShutdownReport::default();
        for participant in participants {
            let name = participant.name().to_string();
            match run_participant(participant.as_ref()) {
                Ok(()) => {
                    tracing::debug!(participant = %name, "stopped");
                    report.completed.push(name);
                }
                Err(e) => {
                    tracing::error!(participant = %name, error = %e, "shutdown participant failed");
                    report.failed.push((name, e));
                }
            }
        }

        tracing::info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            "shutdown complete"
        );
        report
    }

    /// Number of participants still waiting for shutdown.
    pub fn len(&self) -> usize {
        self.lock().participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs one stop action, converting errors and panics into `Participant`.
fn run_participant(participant: &dyn ShutdownParticipant) -> HearthResult<()> {
    let name = participant.name();
    match catch_unwind(AssertUnwindSafe(|| participant.shutdown())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HearthError::Participant {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(payload) => Err(HearthError::Participant {
            name: name.to_string(),
            reason: format!("panicked: {}", crate::panic_message(payload.as_ref())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> HearthResult<()> + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        (hits, move || {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn failing_participant_does_not_block_others() {
        let registry = ShutdownRegistry::new();
        let (hits, ok) = counter();
        registry.register_fn("panics", || panic!("boom"));
        registry.register_fn("errors", || Err(HearthError::Internal("nope".into())));
        registry.register_fn("ok", ok);

        let report = registry.shutdown_all();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(report.completed, ["ok"]);
        assert_eq!(report.failed.len(), 2);
        match &report.failed[0].1 {
            HearthError::Participant { name, reason } => {
                assert_eq!(name, "panics");
                assert!(reason.contains("boom"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!report.is_clean());
    }

    #[test]
    fn second_shutdown_is_noop() {
        let registry = ShutdownRegistry::new();
        let (hits, ok) = counter();
        registry.register_fn("ok", ok);

        assert!(registry.shutdown_all().is_clean());
        let again = registry.shutdown_all();

        assert!(again.completed.is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_shut_down());
    }

    #[test]
    fn late_registration_runs_immediately() {
        let registry = ShutdownRegistry::new();
        registry.shutdown_all();

        let (hits, ok) = counter();
        registry.register_fn("late", ok);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let registry = ShutdownRegistry::new();
        let (hits, ok) = counter();
        let participant: Arc<dyn ShutdownParticipant> = Arc::new(FnParticipant::new("twice", ok));
        registry.register(participant.clone());
        registry.register(participant);
        assert_eq!(registry.len(), 2);

        registry.shutdown_all();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn global_is_a_single_instance() {
        assert!(std::ptr::eq(ShutdownRegistry::global(), ShutdownRegistry::global()));
    }
}
