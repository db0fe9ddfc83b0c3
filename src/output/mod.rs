// src/output/mod.rs
//! Delivery of the extraction report, planned first and executed after.
//!
//! The plan is pure data; [`deliver`] is the only place that touches the
//! filesystem or stdout.

mod writer;

pub use writer::{deliver, render_extraction};

use std::path::PathBuf;

/// The operations to run, in order.
#[derive(Debug, Clone, Default)]
pub struct OutputPlan {
    pub operations: Vec<DeliveryTarget>,
}

impl OutputPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: DeliveryTarget) -> Self {
        self.operations.push(operation);
        self
    }
}

/// A single output operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryTarget {
    WriteFile { path: PathBuf, content: String },
    PrintToStdout { content: String },
}

/// What happened when a plan ran.
#[derive(Debug, Clone, Default)]
pub struct OutputReport {
    pub completed: Vec<DeliveryTarget>,
    /// Failed operations with their error text.
    pub failed: Vec<(DeliveryTarget, String)>,
    pub bytes_written: usize,
}

impl OutputReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}
