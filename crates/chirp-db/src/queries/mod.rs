//! Repository operations, one `impl Database` block per aggregate.

mod authors;
mod cheeps;
mod comments;
mod engagement;
mod follows;

use chrono::{SecondsFormat, Utc};
use rusqlite::Row;

use crate::models::{CheepRow, CommentRow};

/// Shared projection for cheeps joined with their author.
pub(crate) const CHEEP_SELECT: &str =
    "SELECT c.id, c.author_id, a.username, c.text, c.image, c.created_at
     FROM cheeps c
     JOIN authors a ON a.id = c.author_id";

pub(crate) const COMMENT_SELECT: &str =
    "SELECT m.id, m.cheep_id, m.author_id, a.username, m.text, m.created_at
     FROM comments m
     JOIN authors a ON a.id = m.author_id";

/// RFC 3339 with milliseconds, so text order matches time order.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `?start, ?start+1, ...` for `n` bound parameters.
pub(crate) fn placeholders(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn cheep_from_row(row: &Row<'_>) -> rusqlite::Result<CheepRow> {
    Ok(CheepRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        text: row.get(3)?,
        image: row.get(4)?,
        created_at: row.get(5)?,
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        cheep_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        text: row.get(4)?,
        created_at: row.get(5)?,
    })
}
