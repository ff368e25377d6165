use std::sync::{Arc, Mutex};

use proctrack::ExecutionRequest;
use proctrack::exec::{ExecutorStrategy, direct_command_line};

/// A custom strategy that runs commands directly and remembers every command
/// line it produced.
#[derive(Debug, Default)]
pub struct FakeStrategy {
    prepared: Mutex<Vec<Vec<String>>>,
}

impl FakeStrategy {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn prepared(&self) -> Vec<Vec<String>> {
        self.prepared.lock().unwrap().clone()
    }
}

impl ExecutorStrategy for FakeStrategy {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn command_line(&self, request: &ExecutionRequest) -> Vec<String> {
        let argv = direct_command_line(request);
        self.prepared.lock().unwrap().push(argv.clone());
        argv
    }
}
