// file: src/exporter/json.rs
// description: json export of the knowledge graph

use crate::database::{GraphEngine, GraphSnapshot};
use crate::error::{MemoryError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct GraphExporter {
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub exported_at: String,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub files: Vec<String>,
}

impl GraphExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| MemoryError::file(&output_dir, e))?;
        Ok(Self { output_dir })
    }

    /// Writes `graph_<timestamp>.json` and `manifest.json` into the output directory.
    pub async fn export(&self, graph: &dyn GraphEngine, pretty: bool) -> Result<ExportManifest> {
        info!("Starting graph export to {:?}", self.output_dir);

        let (nodes, edges) = graph.get_graph_data().await?;
        let snapshot = GraphSnapshot { nodes, edges };

        let now = Utc::now();
        let file_name = format!("graph_{}.json", now.format("%Y%m%d_%H%M%S"));
        self.write_json(&file_name, &snapshot, pretty)?;

        let manifest = ExportManifest {
            exported_at: now.to_rfc3339(),
            total_nodes: snapshot.nodes.len(),
            total_edges: snapshot.edges.len(),
            files: vec![file_name],
        };
        self.write_json("manifest.json", &manifest, true)?;

        info!(
            "Export complete: {} nodes, {} edges",
            manifest.total_nodes, manifest.total_edges
        );
        Ok(manifest)
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T, pretty: bool) -> Result<()> {
        let contents = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        let path = self.output_dir.join(file_name);
        fs::write(&path, contents).map_err(|e| MemoryError::file(&path, e))
    }
}
