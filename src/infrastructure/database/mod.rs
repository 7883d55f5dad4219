use rusqlite::{Connection, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How often a command has been used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandUsage {
    pub command: String,
    pub uses: i64,
    pub last_used: String,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_tables()?;
        Ok(db)
    }

    pub fn in_memory() -> SqliteResult<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_tables()?;
        Ok(db)
    }

    fn init_tables(&self) -> SqliteResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS command_usage (
                command TEXT PRIMARY KEY NOT NULL,
                uses INTEGER NOT NULL DEFAULT 0,
                last_used TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_command_usage_uses ON command_usage(uses)",
            [],
        )?;

        Ok(())
    }

    /// Switch the journal to write-ahead logging, returning the mode now in use.
    /// In-memory databases report `memory`.
    pub fn enable_wal_mode(&self) -> SqliteResult<String> {
        self.conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
    }

    pub fn record_command_use(&self, command: &str) -> SqliteResult<()> {
        self.conn.execute(
            "INSERT INTO command_usage (command, uses, last_used) VALUES (?1, 1, datetime('now'))
             ON CONFLICT(command) DO UPDATE SET uses = uses + 1, last_used = datetime('now')",
            [command],
        )?;
        Ok(())
    }

    /// Most used commands first, ties broken by name
    pub fn top_commands(&self, limit: usize, offset: usize) -> SqliteResult<Vec<CommandUsage>> {
        let mut stmt = self.conn.prepare(
            "SELECT command, uses, last_used FROM command_usage
             ORDER BY uses DESC, command ASC LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(rusqlite::params![limit as i64, offset as i64], |row| {
            Ok(CommandUsage {
                command: row.get(0)?,
                uses: row.get(1)?,
                last_used: row.get(2)?,
            })
        })?;

        let mut usage = Vec::new();
        for row in rows {
            usage.push(row?);
        }
        Ok(usage)
    }

    /// Number of distinct commands ever used
    pub fn tracked_commands(&self) -> SqliteResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM command_usage", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn total_uses(&self) -> SqliteResult<i64> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(uses), 0) FROM command_usage",
            [],
            |row| row.get(0),
        )
    }

    /// Size of the main database file in bytes
    pub fn size_bytes(&self) -> SqliteResult<u64> {
        let pages: i64 = self.conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self.conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((pages * page_size).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_rank_usage() {
        let db = Database::in_memory().unwrap();
        db.record_command_use("help").unwrap();
        db.record_command_use("sync").unwrap();
        db.record_command_use("sync").unwrap();
        db.record_command_use("about").unwrap();

        let top = db.top_commands(2, 0).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].command, "sync");
        assert_eq!(top[0].uses, 2);
        assert_eq!(top[1].command, "about");

        let rest = db.top_commands(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].command, "help");

        assert_eq!(db.tracked_commands().unwrap(), 3);
        assert_eq!(db.total_uses().unwrap(), 4);
    }

    #[test]
    fn test_wal_mode_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("bot.db")).unwrap();
        assert_eq!(db.enable_wal_mode().unwrap().to_lowercase(), "wal");
        assert!(db.size_bytes().unwrap() > 0);
    }
}
