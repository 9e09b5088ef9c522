use std::collections::HashMap;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, ToSql};

use chirp_types::limits::TOP_REACTIONS;
use chirp_types::models::{ReactionCount, Vote};

use super::{placeholders, timestamp};
use crate::Database;
use crate::models::Engagement;

impl Database {
    /// Toggle a like: removes it if present, otherwise adds it and drops
    /// any dislike by the same author. Returns the resulting vote.
    pub fn toggle_like(&self, cheep_id: &str, author_id: &str) -> Result<Vote> {
        self.toggle_vote(cheep_id, author_id, Vote::Like)
    }

    /// Mirror image of [`Database::toggle_like`].
    pub fn toggle_dislike(&self, cheep_id: &str, author_id: &str) -> Result<Vote> {
        self.toggle_vote(cheep_id, author_id, Vote::Dislike)
    }

    fn toggle_vote(&self, cheep_id: &str, author_id: &str, vote: Vote) -> Result<Vote> {
        let (table, opposite) = match vote {
            Vote::Like => ("likes", "dislikes"),
            Vote::Dislike => ("dislikes", "likes"),
            Vote::Neutral => return Ok(Vote::Neutral),
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let removed = tx.execute(
                &format!("DELETE FROM {table} WHERE cheep_id = ?1 AND author_id = ?2"),
                [cheep_id, author_id],
            )?;

            let result = if removed > 0 {
                Vote::Neutral
            } else {
                tx.execute(
                    &format!("DELETE FROM {opposite} WHERE cheep_id = ?1 AND author_id = ?2"),
                    [cheep_id, author_id],
                )?;
                tx.execute(
                    &format!(
                        "INSERT INTO {table} (cheep_id, author_id, created_at) VALUES (?1, ?2, ?3)"
                    ),
                    rusqlite::params![cheep_id, author_id, timestamp()],
                )?;
                vote
            };

            tx.commit()?;
            Ok(result)
        })
    }

    /// (likes, dislikes) for one cheep.
    pub fn vote_counts(&self, cheep_id: &str) -> Result<(u32, u32)> {
        self.with_conn(|conn| {
            let counts: (i64, i64) = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM likes WHERE cheep_id = ?1),
                    (SELECT COUNT(*) FROM dislikes WHERE cheep_id = ?1)",
                [cheep_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok((counts.0 as u32, counts.1 as u32))
        })
    }

    /// Set the author's reaction on a cheep. Picking the current emoji
    /// again clears it, a different emoji replaces it. Returns the
    /// reaction now in place.
    pub fn set_reaction(
        &self,
        id: &str,
        cheep_id: &str,
        author_id: &str,
        emoji: &str,
    ) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT id, emoji FROM reactions WHERE cheep_id = ?1 AND author_id = ?2",
                    [cheep_id, author_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let result = match existing {
                Some((existing_id, current)) if current == emoji => {
                    tx.execute("DELETE FROM reactions WHERE id = ?1", [&existing_id])?;
                    None
                }
                Some((existing_id, _)) => {
                    tx.execute(
                        "UPDATE reactions SET emoji = ?1, created_at = ?2 WHERE id = ?3",
                        rusqlite::params![emoji, timestamp(), &existing_id],
                    )?;
                    Some(emoji.to_string())
                }
                None => {
                    tx.execute(
                        "INSERT INTO reactions (id, cheep_id, author_id, emoji, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![id, cheep_id, author_id, emoji, timestamp()],
                    )?;
                    Some(emoji.to_string())
                }
            };

            tx.commit()?;
            Ok(result)
        })
    }

    pub fn top_reactions(&self, cheep_id: &str) -> Result<Vec<ReactionCount>> {
        let ids = [cheep_id.to_string()];
        self.with_conn(|conn| {
            let mut grouped = reaction_counts(conn, &ids)?;
            Ok(grouped.remove(cheep_id).unwrap_or_default())
        })
    }

    /// Batch-fetch engagement for a page of cheeps. `viewer` adds the
    /// viewer's own vote and reaction. Every requested id gets an entry.
    pub fn engagement_for(
        &self,
        cheep_ids: &[String],
        viewer: Option<&str>,
    ) -> Result<HashMap<String, Engagement>> {
        let mut out: HashMap<String, Engagement> = cheep_ids
            .iter()
            .map(|id| (id.clone(), Engagement::default()))
            .collect();
        if cheep_ids.is_empty() {
            return Ok(out);
        }

        self.with_conn(|conn| {
            for (id, n) in grouped_counts(conn, "likes", cheep_ids)? {
                if let Some(e) = out.get_mut(&id) {
                    e.likes = n;
                }
            }
            for (id, n) in grouped_counts(conn, "dislikes", cheep_ids)? {
                if let Some(e) = out.get_mut(&id) {
                    e.dislikes = n;
                }
            }
            for (id, n) in grouped_counts(conn, "comments", cheep_ids)? {
                if let Some(e) = out.get_mut(&id) {
                    e.comments = n;
                }
            }
            for (id, top) in reaction_counts(conn, cheep_ids)? {
                if let Some(e) = out.get_mut(&id) {
                    e.top_reactions = top;
                }
            }

            if let Some(viewer) = viewer {
                for (id, vote) in viewer_votes(conn, viewer, cheep_ids)? {
                    if let Some(e) = out.get_mut(&id) {
                        e.viewer_vote = vote;
                    }
                }
                for (id, emoji) in viewer_reactions(conn, viewer, cheep_ids)? {
                    if let Some(e) = out.get_mut(&id) {
                        e.viewer_reaction = Some(emoji);
                    }
                }
            }

            Ok(out)
        })
    }
}

fn id_params(ids: &[String]) -> Vec<&dyn ToSql> {
    ids.iter().map(|id| id as &dyn ToSql).collect()
}

/// `cheep_id -> COUNT(*)` over one of the per-cheep tables.
fn grouped_counts(conn: &Connection, table: &str, ids: &[String]) -> Result<Vec<(String, u32)>> {
    let sql = format!(
        "SELECT cheep_id, COUNT(*) FROM {table} WHERE cheep_id IN ({}) GROUP BY cheep_id",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(id_params(ids).as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Reactions grouped by emoji, ranked by count then emoji, cut to the top
/// `TOP_REACTIONS` per cheep.
fn reaction_counts(
    conn: &Connection,
    ids: &[String],
) -> Result<HashMap<String, Vec<ReactionCount>>> {
    let sql = format!(
        "SELECT cheep_id, emoji, COUNT(*) AS n FROM reactions
         WHERE cheep_id IN ({})
         GROUP BY cheep_id, emoji
         ORDER BY cheep_id, n DESC, emoji ASC",
        placeholders(1, ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(id_params(ids).as_slice(), |row| {
        Ok((
            row.get::<_, String>(0)?,
            ReactionCount {
                emoji: row.get(1)?,
                count: row.get::<_, i64>(2)? as u32,
            },
        ))
    })?;

    let mut grouped: HashMap<String, Vec<ReactionCount>> = HashMap::new();
    for row in rows {
        let (cheep_id, count) = row?;
        let top = grouped.entry(cheep_id).or_default();
        if top.len() < TOP_REACTIONS {
            top.push(count);
        }
    }
    Ok(grouped)
}

fn viewer_votes(conn: &Connection, viewer: &str, ids: &[String]) -> Result<Vec<(String, Vote)>> {
    let list = placeholders(2, ids.len());
    let sql = format!(
        "SELECT cheep_id, 'like' FROM likes WHERE author_id = ?1 AND cheep_id IN ({list})
         UNION ALL
         SELECT cheep_id, 'dislike' FROM dislikes WHERE author_id = ?1 AND cheep_id IN ({list})"
    );
    let mut params: Vec<&dyn ToSql> = vec![&viewer as &dyn ToSql];
    params.extend(id_params(ids));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), |row| {
            let kind: String = row.get(1)?;
            let vote = if kind == "like" { Vote::Like } else { Vote::Dislike };
            Ok((row.get::<_, String>(0)?, vote))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn viewer_reactions(
    conn: &Connection,
    viewer: &str,
    ids: &[String],
) -> Result<Vec<(String, String)>> {
    let sql = format!(
        "SELECT cheep_id, emoji FROM reactions WHERE author_id = ?1 AND cheep_id IN ({})",
        placeholders(2, ids.len())
    );
    let mut params: Vec<&dyn ToSql> = vec![&viewer as &dyn ToSql];
    params.extend(id_params(ids));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
