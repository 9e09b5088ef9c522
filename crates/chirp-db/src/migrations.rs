use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub const SCHEMA_VERSION: i64 = 2;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (authors, cheeps, follows)");
        conn.execute_batch(
            "
            CREATE TABLE authors (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
                email       TEXT UNIQUE COLLATE NOCASE,
                password    TEXT,
                github_id   INTEGER UNIQUE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE cheeps (
                id          TEXT PRIMARY KEY,
                author_id   TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                image       TEXT,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_cheeps_created ON cheeps(created_at);
            CREATE INDEX idx_cheeps_author ON cheeps(author_id, created_at);

            CREATE TABLE follows (
                follower_id TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                followee_id TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                PRIMARY KEY (follower_id, followee_id),
                CHECK (follower_id <> followee_id)
            );

            CREATE INDEX idx_follows_followee ON follows(followee_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (likes, dislikes, reactions, comments)");
        conn.execute_batch(
            "
            CREATE TABLE likes (
                cheep_id    TEXT NOT NULL REFERENCES cheeps(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                PRIMARY KEY (cheep_id, author_id)
            );

            CREATE TABLE dislikes (
                cheep_id    TEXT NOT NULL REFERENCES cheeps(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                PRIMARY KEY (cheep_id, author_id)
            );

            CREATE TABLE reactions (
                id          TEXT PRIMARY KEY,
                cheep_id    TEXT NOT NULL REFERENCES cheeps(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                emoji       TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                UNIQUE(cheep_id, author_id)
            );

            CREATE INDEX idx_reactions_cheep ON reactions(cheep_id, emoji);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                cheep_id    TEXT NOT NULL REFERENCES cheeps(id) ON DELETE CASCADE,
                author_id   TEXT NOT NULL REFERENCES authors(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_cheep ON comments(cheep_id, created_at);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", SCHEMA_VERSION);
    Ok(())
}
