use std::path::Path;

use anyhow::{Context, Result};

use omiverse::config::OmiverseConfig;
use omiverse::server::build_services;

/// Run a transcript JSON file through the ingestion pipeline without the HTTP server.
pub async fn ingest(config: &OmiverseConfig, file: &Path, uid: &str) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&contents).context("transcript file is not valid JSON")?;

    let services = build_services(config)?;
    let report = services.ingestor.ingest(uid, payload).await?;

    println!("Transcript stored: {}", report.transcript_id);
    println!("  Nouns created:          {}", report.graph.nouns_created);
    println!("  Nouns already known:    {}", report.graph.nouns_existing);
    println!("  Relationships stored:   {}", report.graph.relationships_stored);
    println!("  Relationships dropped:  {}", report.graph.relationships_dropped);

    Ok(())
}
