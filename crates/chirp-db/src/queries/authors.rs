use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use chirp_types::limits;

use super::{COMMENT_SELECT, CHEEP_SELECT, cheep_from_row, comment_from_row, timestamp};
use crate::Database;
use crate::models::{AuthorExportRows, AuthorRow, AuthorStats};

/// Upper bound on `-N` suffixes tried for a GitHub login.
const MAX_NAME_SUFFIX: u32 = 10_000;

const AUTHOR_SELECT: &str =
    "SELECT id, username, email, password, github_id, created_at FROM authors";

impl Database {
    /// `email` and `password_hash` are absent for GitHub-only authors.
    pub fn create_author(
        &self,
        id: &str,
        username: &str,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO authors (id, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, email, password_hash, timestamp()],
            )?;
            Ok(())
        })
    }

    pub fn get_author_by_id(&self, id: &str) -> Result<Option<AuthorRow>> {
        self.with_conn(|conn| query_author(conn, "id = ?1", id))
    }

    /// Usernames compare case-insensitively.
    pub fn get_author_by_username(&self, username: &str) -> Result<Option<AuthorRow>> {
        self.with_conn(|conn| query_author(conn, "username = ?1", username))
    }

    pub fn get_author_by_email(&self, email: &str) -> Result<Option<AuthorRow>> {
        self.with_conn(|conn| query_author(conn, "email = ?1", email))
    }

    /// Login accepts either the username or the email address.
    pub fn get_author_by_login(&self, ident: &str) -> Result<Option<AuthorRow>> {
        self.with_conn(|conn| query_author(conn, "username = ?1 OR email = ?1", ident))
    }

    /// Resolve a GitHub identity to an author: an already linked author
    /// first, then an author with the same email (which gets linked), and
    /// otherwise a new author named after the GitHub login.
    pub fn find_or_create_github_author(
        &self,
        id: &str,
        github_id: i64,
        login: &str,
        email: Option<&str>,
    ) -> Result<AuthorRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if let Some(author) = query_author_i64(&tx, "github_id = ?1", github_id)? {
                return Ok(author);
            }

            if let Some(email) = email {
                if let Some(author) = query_author(&tx, "email = ?1", email)? {
                    tx.execute(
                        "UPDATE authors SET github_id = ?1 WHERE id = ?2",
                        rusqlite::params![github_id, &author.id],
                    )?;
                    tx.commit()?;
                    info!(author = %author.username, github_id, "Linked GitHub account to existing author");
                    return Ok(AuthorRow {
                        github_id: Some(github_id),
                        ..author
                    });
                }
            }

            let username = free_username(&tx, login)?;
            let created_at = timestamp();
            tx.execute(
                "INSERT INTO authors (id, username, email, password, github_id, created_at)
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5)",
                rusqlite::params![id, &username, email, github_id, &created_at],
            )?;
            tx.commit()?;
            info!(author = %username, github_id, "Created author from GitHub login");

            Ok(AuthorRow {
                id: id.to_string(),
                username,
                email: email.map(str::to_string),
                password: None,
                github_id: Some(github_id),
                created_at,
            })
        })
    }

    pub fn author_stats(&self, id: &str) -> Result<AuthorStats> {
        self.with_conn(|conn| {
            let (cheeps, followers, following): (i64, i64, i64) = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM cheeps WHERE author_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE followee_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE follower_id = ?1)",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;
            Ok(AuthorStats {
                cheeps: cheeps as u64,
                followers: followers as u64,
                following: following as u64,
            })
        })
    }

    /// Remove an author and, through cascades, everything they own.
    /// Returns false if there was no such author.
    pub fn delete_author(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM authors WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn export_author(&self, id: &str) -> Result<Option<AuthorExportRows>> {
        self.with_conn(|conn| {
            let Some(author) = query_author(conn, "id = ?1", id)? else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(&format!(
                "{CHEEP_SELECT} WHERE c.author_id = ?1 ORDER BY c.created_at DESC, c.rowid DESC"
            ))?;
            let cheeps = stmt
                .query_map([id], cheep_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE m.author_id = ?1 ORDER BY m.created_at ASC, m.rowid ASC"
            ))?;
            let comments = stmt
                .query_map([id], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let following = super::follows::following_of(conn, id)?;
            let followers = super::follows::followers_of(conn, id)?;

            Ok(Some(AuthorExportRows {
                author,
                cheeps,
                comments,
                following,
                followers,
            }))
        })
    }
}

fn author_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuthorRow> {
    Ok(AuthorRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        github_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn query_author(conn: &Connection, filter: &str, value: &str) -> Result<Option<AuthorRow>> {
    let mut stmt = conn.prepare(&format!("{AUTHOR_SELECT} WHERE {filter}"))?;
    let row = stmt.query_row([value], author_from_row).optional()?;
    Ok(row)
}

fn query_author_i64(conn: &Connection, filter: &str, value: i64) -> Result<Option<AuthorRow>> {
    let mut stmt = conn.prepare(&format!("{AUTHOR_SELECT} WHERE {filter}"))?;
    let row = stmt.query_row([value], author_from_row).optional()?;
    Ok(row)
}

/// First of `login`, `login-2`, `login-3`, ... that is a valid, unreserved
/// and unused username. The login is shortened as needed so the suffix fits.
fn free_username(conn: &Connection, login: &str) -> Result<String> {
    let base: String = login
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(limits::USERNAME_MAX)
        .collect();
    let base = if base.is_empty() { "chirper".to_string() } else { base };

    let usable = |name: &str| -> Result<bool> {
        if limits::username(name).is_err() {
            return Ok(false);
        }
        Ok(query_author(conn, "username = ?1", name)?.is_none())
    };

    if usable(&base)? {
        return Ok(base);
    }
    for n in 2..=MAX_NAME_SUFFIX {
        let suffix = format!("-{}", n);
        let stem: String = base.chars().take(limits::USERNAME_MAX - suffix.len()).collect();
        let candidate = format!("{}{}", stem, suffix);
        if usable(&candidate)? {
            return Ok(candidate);
        }
    }
    bail!("no free username left for GitHub login '{}'", login)
}
