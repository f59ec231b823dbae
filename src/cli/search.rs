use anyhow::Result;

use omiverse::config::OmiverseConfig;
use omiverse::server::build_services;

/// Answer a question from the terminal.
pub async fn search(config: &OmiverseConfig, uid: &str, query: &str) -> Result<()> {
    let services = build_services(config)?;
    let result = services.answers.answer(uid, query).await?;

    println!("{}\n", result.answer);

    if result.context.transcripts.is_empty() {
        return Ok(());
    }

    println!("Transcripts used:");
    for (i, t) in result.context.transcripts.iter().enumerate() {
        let preview: String = t.overview.chars().take(100).collect();
        let ellipsis = if t.overview.chars().count() > 100 { "..." } else { "" };
        println!("  {}. ({:.4}) {}{}", i + 1, t.similarity, preview, ellipsis);
    }

    if !result.graph_data.edges.is_empty() {
        println!();
        println!("Supported by:");
        for rel in result
            .context
            .relationships
            .iter()
            .filter(|r| {
                result
                    .graph_data
                    .edges
                    .iter()
                    .any(|e| e.source == r.relationship.source_noun_id
                        && e.target == r.relationship.target_noun_id
                        && e.label == r.relationship.action)
            })
        {
            println!("  - {}", rel.statement());
        }
    }

    Ok(())
}
