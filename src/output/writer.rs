// src/output/writer.rs
//! Executes output plans and renders the extraction report.

use super::{DeliveryTarget, OutputPlan, OutputReport};
use crate::error::AppError;
use crate::pipeline::Extraction;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Renders an extraction as pretty JSON with blocks in Notion wire format.
pub fn render_extraction(extraction: &Extraction) -> Result<String, AppError> {
    let blocks: Vec<_> = extraction.blocks.iter().map(|b| b.to_notion_json()).collect();
    let report = json!({
        "selector": extraction.selector,
        "extracted_at": extraction.extracted_at.to_rfc3339(),
        "blocks": blocks,
        "videos": extraction.videos,
        "diagnostics": extraction.diagnostics,
        "validation": extraction.validation,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs every operation in the plan. Failures are collected, not raised.
pub fn deliver(plan: OutputPlan) -> OutputReport {
    let mut report = OutputReport::default();
    log::debug!("Executing output plan with {} operation(s)", plan.operations.len());

    for operation in plan.operations {
        match execute_operation(&operation) {
            Ok(bytes) => {
                report.bytes_written += bytes;
                report.completed.push(operation);
            }
            Err(e) => {
                log::error!("Operation failed: {}", e);
                report.failed.push((operation, e.to_string()));
            }
        }
    }
    report
}

fn execute_operation(operation: &DeliveryTarget) -> Result<usize, AppError> {
    match operation {
        DeliveryTarget::WriteFile { path, content } => write_file(path, content),
        DeliveryTarget::PrintToStdout { content } => {
            let mut stdout = std::io::stdout();
            writeln!(stdout, "{}", content)?;
            stdout.flush()?;
            Ok(content.len())
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<usize, AppError> {
    log::debug!("Writing {} bytes to {}", content.len(), path.display());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    log::info!("Wrote file: {}", path.display());
    Ok(content.len())
}
