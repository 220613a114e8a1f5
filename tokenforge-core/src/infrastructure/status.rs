//! User-facing output sinks
//!
//! The pipeline reports progress and failures as human-readable lines, and
//! the fee quote as a separate display value.

use std::sync::Mutex;

pub trait StatusSink: Send + Sync {
    /// Status or error message
    fn show_status(&self, message: &str);

    /// Fee display, e.g. `0.0042 BNB` or an estimation failure message
    fn show_fee(&self, fee: &str);
}

/// Writes to stdout and mirrors every line into the log
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleStatusSink;

impl StatusSink for ConsoleStatusSink {
    fn show_status(&self, message: &str) {
        log::info!("{}", message);
        println!("{}", message);
    }

    fn show_fee(&self, fee: &str) {
        log::info!("Estimated fee: {}", fee);
        println!("Estimated fee: {}", fee);
    }
}

/// Keeps everything shown, in order
#[derive(Debug, Default)]
pub struct RecordingStatusSink {
    statuses: Mutex<Vec<String>>,
    fees: Mutex<Vec<String>>,
}

impl RecordingStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn fees(&self) -> Vec<String> {
        self.fees.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses().pop()
    }
}

impl StatusSink for RecordingStatusSink {
    fn show_status(&self, message: &str) {
        log::info!("{}", message);
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(message.to_string());
        }
    }

    fn show_fee(&self, fee: &str) {
        if let Ok(mut fees) = self.fees.lock() {
            fees.push(fee.to_string());
        }
    }
}
