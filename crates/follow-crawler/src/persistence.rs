use crate::api::AccountId;
use crate::crawler::CrawlOutcome;
use crate::error::Result;
use crate::report::GraphSummary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SNAPSHOT_FILE: &str = "social_graph.json";
pub const DOT_FILE: &str = "social_graph.dot";
pub const REPORT_FILE: &str = "graph_data.txt";

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub seed: Option<AccountId>,
    pub crawled_at: String,
    pub nodes: Vec<AccountId>,
    pub edges: Vec<(AccountId, AccountId)>,
    pub visitation: Vec<AccountId>,
}

impl GraphSnapshot {
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        Self {
            seed: outcome.seed,
            crawled_at: chrono::Utc::now().to_rfc3339(),
            nodes: outcome.graph.nodes().to_vec(),
            edges: outcome.graph.edges(),
            visitation: outcome.visitation.clone(),
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        info!("Graph saved to {}", path.display());
        Ok(())
    }
}

/// Writes the JSON snapshot, the DOT rendering and the text report into `dir`.
/// Returns the written paths.
pub fn write_outputs(dir: &Path, outcome: &CrawlOutcome, summary: &GraphSummary) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let snapshot_path = dir.join(SNAPSHOT_FILE);
    GraphSnapshot::from_outcome(outcome).save_to_file(&snapshot_path)?;

    let dot_path = dir.join(DOT_FILE);
    fs::write(&dot_path, outcome.graph.to_dot())?;

    let report_path = dir.join(REPORT_FILE);
    fs::write(&report_path, summary.render())?;

    Ok(vec![snapshot_path, dot_path, report_path])
}
