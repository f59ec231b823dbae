use anyhow::Result;

use omiverse::config::OmiverseConfig;

/// Print a user's whole graph as JSON.
pub fn graph(config: &OmiverseConfig, uid: &str) -> Result<()> {
    let conn = omiverse::db::open_database(config.resolved_db_path())?;
    let view = omiverse::graph::view::list_graph(&conn, uid)?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
