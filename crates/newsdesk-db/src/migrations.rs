use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            role            TEXT NOT NULL,
            profile_url     TEXT NOT NULL DEFAULT '',
            pdf_url         TEXT NOT NULL DEFAULT '',
            pdf_public_id   TEXT NOT NULL DEFAULT '',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS articles (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            content     TEXT NOT NULL,
            author_id   TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            media       TEXT NOT NULL DEFAULT '[]',
            category    TEXT NOT NULL DEFAULT '',
            published   INTEGER NOT NULL DEFAULT 0,
            status      TEXT NOT NULL DEFAULT 'draft',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_articles_author
            ON articles(author_id);
        CREATE INDEX IF NOT EXISTS idx_articles_category
            ON articles(category, created_at);

        CREATE TABLE IF NOT EXISTS article_interactions (
            id          TEXT PRIMARY KEY,
            article_id  TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            comment     TEXT,
            liked       INTEGER NOT NULL DEFAULT 0,
            saved       INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(article_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_article
            ON article_interactions(article_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
