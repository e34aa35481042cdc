//! SQLite dataset sink
//!
//! Records land in a single `agents` table keyed by profile URL. Pushing a
//! record whose URL is already stored replaces the earlier row.

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::EntityRecord;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQL schema for the dataset
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS agents (
    url TEXT PRIMARY KEY,
    agent_id TEXT,
    name TEXT NOT NULL,
    phone TEXT,
    email TEXT,
    website TEXT,
    logo TEXT,
    branch_type TEXT NOT NULL,
    description TEXT,
    address TEXT,
    properties_for_sale INTEGER,
    properties_to_let INTEGER,
    team_members INTEGER,
    services_offered TEXT,
    extraction_method TEXT NOT NULL,
    scraped_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_agents_agent_id ON agents(agent_id);
"#;

const INSERT_SQL: &str = "INSERT OR REPLACE INTO agents (
        url, agent_id, name, phone, email, website, logo, branch_type, description, address,
        properties_for_sale, properties_to_let, team_members, services_offered,
        extraction_method, scraped_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Number of stored agents
    pub fn count(&self) -> OutputResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn insert_all(&mut self, records: &[EntityRecord]) -> OutputResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_SQL)?;
            for record in records {
                let info = &record.info;
                let services = record
                    .services_offered
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;

                stmt.execute(params![
                    info.url,
                    info.agent_id,
                    info.name,
                    info.phone,
                    record.email,
                    record.website,
                    info.logo,
                    info.branch_type.as_str(),
                    info.description,
                    info.address,
                    record.properties_for_sale,
                    record.properties_to_let,
                    record.team_members,
                    services,
                    record.extraction_method.as_str(),
                    record.scraped_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    async fn push_batch(&mut self, records: &[EntityRecord]) -> OutputResult<()> {
        self.insert_all(records)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
