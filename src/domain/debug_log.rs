//! Request-scoped debug message log.
//!
//! Every message goes to `tracing` at debug level. When the run was started
//! with debugging enabled the message is also buffered so it can be returned
//! to the caller alongside the result. Clones share one buffer, so the handle
//! can be given to both calculator tasks of a run.

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugMessage {
    pub message: String,
    /// RFC 3339 timestamp
    pub time: String,
}

#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    enabled: bool,
    messages: Arc<Mutex<Vec<DebugMessage>>>,
}

impl DebugLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A log that only forwards to `tracing`.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);

        if !self.enabled {
            return;
        }
        self.buffer().push(DebugMessage {
            message,
            time: Utc::now().to_rfc3339(),
        });
    }

    /// Snapshot of the buffered messages in record order.
    pub fn messages(&self) -> Vec<DebugMessage> {
        self.buffer().clone()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<DebugMessage>> {
        match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("DebugLog: buffer lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
