#![allow(dead_code, unused_imports)]

pub use proctrack_test_utils::builders;
pub use proctrack_test_utils::fake_strategy;
pub use proctrack_test_utils::recording;
pub use proctrack_test_utils::{init_tracing, with_timeout};

use std::error::Error;

pub type TestResult = Result<(), Box<dyn Error>>;
