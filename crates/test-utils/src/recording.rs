use std::sync::{Arc, Mutex};

use anyhow::bail;
use proctrack::event::{EventHandler, Observer};
use proctrack::{ExecutionRecord, Status};

/// Handler/observer that remembers the status of the record every time it is
/// invoked. Optionally fails after recording.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<Status>>,
    fail_with: Option<String>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A handler that records, then returns an error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        })
    }

    pub fn seen(&self) -> Vec<Status> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn record(&self, record: &ExecutionRecord) {
        self.seen.lock().unwrap().push(record.status());
    }
}

impl EventHandler<ExecutionRecord> for RecordingHandler {
    fn handle(&self, record: &ExecutionRecord) -> anyhow::Result<()> {
        self.record(record);
        if let Some(message) = &self.fail_with {
            bail!("{message}");
        }
        Ok(())
    }
}

impl Observer<ExecutionRecord> for RecordingHandler {
    fn update(&self, record: &ExecutionRecord) {
        self.record(record);
    }
}
