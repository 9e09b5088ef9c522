use anyhow::Result;
use rusqlite::Connection;

use super::timestamp;
use crate::Database;

impl Database {
    /// Returns true if the follow is new. Following twice is a no-op.
    pub fn follow(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![follower_id, followee_id, timestamp()],
            )?;
            Ok(n > 0)
        })
    }

    /// Returns true if a follow was removed.
    pub fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                [follower_id, followee_id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2)",
                [follower_id, followee_id],
                |row| row.get(0),
            )?;
            Ok(found)
        })
    }

    /// Usernames `author_id` follows, alphabetically.
    pub fn following(&self, author_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| following_of(conn, author_id))
    }

    /// Usernames following `author_id`, alphabetically.
    pub fn followers(&self, author_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| followers_of(conn, author_id))
    }
}

pub(super) fn following_of(conn: &Connection, author_id: &str) -> Result<Vec<String>> {
    usernames(
        conn,
        "SELECT a.username FROM follows f
         JOIN authors a ON a.id = f.followee_id
         WHERE f.follower_id = ?1
         ORDER BY a.username",
        author_id,
    )
}

pub(super) fn followers_of(conn: &Connection, author_id: &str) -> Result<Vec<String>> {
    usernames(
        conn,
        "SELECT a.username FROM follows f
         JOIN authors a ON a.id = f.follower_id
         WHERE f.followee_id = ?1
         ORDER BY a.username",
        author_id,
    )
}

fn usernames(conn: &Connection, sql: &str, author_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let names = stmt
        .query_map([author_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}
