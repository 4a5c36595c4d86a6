use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use estimo_core::domain::state::EstimatorState;
use estimo_core::estimator::persistence::{encode_state, StateStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
}

/// Persists estimator states in the background. Submissions never block; while a write
/// is in flight newer submissions replace older pending ones, and the latest submitted
/// state is written before `close` returns.
pub struct StateWriter {
    sender: watch::Sender<Option<String>>,
    task: JoinHandle<WriterStats>,
}

impl StateWriter {
    pub fn spawn(store: Arc<dyn StateStore>, state_key: impl Into<String>) -> Self {
        let state_key = state_key.into();
        let (sender, mut receiver) = watch::channel::<Option<String>>(None);

        let task = tokio::spawn(async move {
            let mut stats = WriterStats::default();

            while receiver.changed().await.is_ok() {
                let Some(payload) = receiver.borrow_and_update().clone() else {
                    continue;
                };

                match store.save(&state_key, &payload).await {
                    Ok(()) => {
                        stats.written += 1;
                        debug!(
                            event_name = "estimator.state.saved",
                            state_key = %state_key,
                            bytes = payload.len(),
                            "estimator state saved"
                        );
                    }
                    Err(error) => {
                        stats.failed += 1;
                        warn!(
                            event_name = "estimator.state.write_failed",
                            state_key = %state_key,
                            error = %error,
                            "estimator state write failed"
                        );
                    }
                }
            }

            stats
        });

        Self { sender, task }
    }

    pub fn submit(&self, state: &EstimatorState) {
        self.submit_encoded(encode_state(state));
    }

    pub fn submit_encoded(&self, payload: String) {
        self.sender.send_replace(Some(payload));
    }

    /// Stops accepting states, flushes the latest one and reports what was written.
    pub async fn close(self) -> WriterStats {
        drop(self.sender);
        match self.task.await {
            Ok(stats) => stats,
            Err(error) => {
                warn!(
                    event_name = "estimator.state.writer_aborted",
                    error = %error,
                    "estimator state writer task ended abnormally"
                );
                WriterStats::default()
            }
        }
    }
}
