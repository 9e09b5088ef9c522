use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension};

use super::{COMMENT_SELECT, comment_from_row, timestamp};
use crate::Database;
use crate::models::CommentRow;

impl Database {
    pub fn insert_comment(
        &self,
        id: &str,
        cheep_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<CommentRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, cheep_id, author_id, text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, cheep_id, author_id, text, timestamp()],
            )?;
            query_comment(conn, id)?.ok_or_else(|| anyhow!("Comment {} vanished after insert", id))
        })
    }

    /// Oldest first, so a thread reads top to bottom.
    pub fn comments_for(&self, cheep_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE m.cheep_id = ?1 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let rows = stmt
                .query_map([cheep_id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| query_comment(conn, id))
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn query_comment(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    let mut stmt = conn.prepare(&format!("{COMMENT_SELECT} WHERE m.id = ?1"))?;
    let row = stmt.query_row([id], comment_from_row).optional()?;
    Ok(row)
}
