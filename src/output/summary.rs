//! End-of-run summary

use crate::crawler::FrontierState;
use crate::output::traits::OutputResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Summary reported at the end of every run, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub agents_scraped: u32,
    pub unique_agents: usize,
    pub pages_processed: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunSummary {
    pub fn completed(state: &FrontierState) -> Self {
        Self {
            status: RunStatus::Success,
            agents_scraped: state.scraped_count(),
            unique_agents: state.unique_entities(),
            pages_processed: state.current_page(),
            completed_at: Some(Utc::now().to_rfc3339()),
            failed_at: None,
            error: None,
        }
    }

    /// A failed run; counters reflect whatever progress was made before the failure
    pub fn failed(state: &FrontierState, error: impl ToString) -> Self {
        Self {
            status: RunStatus::Error,
            agents_scraped: state.scraped_count(),
            unique_agents: state.unique_entities(),
            pages_processed: state.current_page(),
            completed_at: None,
            failed_at: Some(Utc::now().to_rfc3339()),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Writes the summary as pretty-printed JSON
pub fn write_summary(path: &Path, summary: &RunSummary) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)?;
    tracing::info!("Run summary written to {}", path.display());
    Ok(())
}
