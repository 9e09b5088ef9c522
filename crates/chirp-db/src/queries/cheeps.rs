use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, ToSql};

use chirp_types::limits::Page;

use super::{CHEEP_SELECT, cheep_from_row, timestamp};
use crate::Database;
use crate::models::{CheepRow, TimelineRows};

/// Newest first. `rowid` breaks ties between cheeps posted in the same
/// millisecond.
const NEWEST_FIRST: &str = "ORDER BY c.created_at DESC, c.rowid DESC";

/// Cheeps by the author in `?1` or by anyone they follow.
const OWN_AND_FOLLOWED: &str =
    "c.author_id = ?1 OR c.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)";

impl Database {
    pub fn insert_cheep(
        &self,
        id: &str,
        author_id: &str,
        text: &str,
        image: Option<&str>,
    ) -> Result<CheepRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO cheeps (id, author_id, text, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, author_id, text, image, timestamp()],
            )?;
            query_cheep(conn, id)?.ok_or_else(|| anyhow!("Cheep {} vanished after insert", id))
        })
    }

    pub fn get_cheep(&self, id: &str) -> Result<Option<CheepRow>> {
        self.with_conn(|conn| query_cheep(conn, id))
    }

    /// Likes, dislikes, reactions and comments go with it.
    pub fn delete_cheep(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM cheeps WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn public_timeline(&self, page: Page) -> Result<TimelineRows> {
        self.with_conn(|conn| query_timeline(conn, None, rusqlite::params![], page))
    }

    /// Only the cheeps written by `author_id`.
    pub fn author_timeline(&self, author_id: &str, page: Page) -> Result<TimelineRows> {
        self.with_conn(|conn| query_timeline(conn, Some("c.author_id = ?1"), rusqlite::params![author_id], page))
    }

    /// The author's own cheeps merged with those of everyone they follow.
    pub fn private_timeline(&self, author_id: &str, page: Page) -> Result<TimelineRows> {
        self.with_conn(|conn| query_timeline(conn, Some(OWN_AND_FOLLOWED), rusqlite::params![author_id], page))
    }
}

fn query_cheep(conn: &Connection, id: &str) -> Result<Option<CheepRow>> {
    let mut stmt = conn.prepare(&format!("{CHEEP_SELECT} WHERE c.id = ?1"))?;
    let row = stmt.query_row([id], cheep_from_row).optional()?;
    Ok(row)
}

/// Page query and total count share one filter so page counts always
/// agree with the rows that can actually be paged through.
fn query_timeline(
    conn: &Connection,
    filter: Option<&str>,
    filter_params: &[&dyn ToSql],
    page: Page,
) -> Result<TimelineRows> {
    let where_clause = filter.map(|f| format!("WHERE {}", f)).unwrap_or_default();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM cheeps c {where_clause}"),
        filter_params,
        |row| row.get(0),
    )?;

    let n = filter_params.len();
    let sql = format!(
        "{CHEEP_SELECT} {where_clause} {NEWEST_FIRST} LIMIT ?{} OFFSET ?{}",
        n + 1,
        n + 2
    );
    let limit = i64::from(page.limit());
    let offset = page.offset() as i64;
    let mut params: Vec<&dyn ToSql> = filter_params.to_vec();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), cheep_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(TimelineRows {
        rows,
        total: total as u64,
    })
}
