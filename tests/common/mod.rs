// tests/common/mod.rs

#![allow(dead_code)]

use std::error::Error;

pub use sitepipe_test_utils::builders;
pub use sitepipe_test_utils::stubs;
pub use sitepipe_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;
