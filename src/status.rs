//! Single-slot status indicator.

use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct StatusReporter {
    current: Status,
}

impl StatusReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new message.
    pub fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        let message = message.into();
        if is_error {
            warn!(status = %message, "[STATUS]");
        } else {
            info!(status = %message, "[STATUS]");
        }
        self.current = Status { message, is_error };
    }

    pub fn current(&self) -> &Status {
        &self.current
    }

    pub fn message(&self) -> &str {
        &self.current.message
    }

    pub fn is_error(&self) -> bool {
        self.current.is_error
    }
}
