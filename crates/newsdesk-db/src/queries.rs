use crate::models::{ArticleRow, CommentRow, InteractionRow, UserRow};
use crate::{Database, now_timestamp};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

/// The one counting rule for likes, used by every surface that reports
/// `likes_count`.
pub const LIKED_PREDICATE: &str = "i.liked = 1";

/// The one counting rule for comments: a row counts iff its comment is
/// non-null and non-empty.
pub const COMMENT_PREDICATE: &str = "i.comment IS NOT NULL AND i.comment != ''";

fn article_select() -> String {
    format!(
        "SELECT a.id, a.title, a.content, a.author_id, u.username, u.email,
                a.media, a.category, a.published, a.status,
                (SELECT COUNT(*) FROM article_interactions i
                    WHERE i.article_id = a.id AND {LIKED_PREDICATE}),
                (SELECT COUNT(*) FROM article_interactions i
                    WHERE i.article_id = a.id AND {COMMENT_PREDICATE}),
                a.created_at, a.updated_at
         FROM articles a
         LEFT JOIN users u ON a.author_id = u.id"
    )
}

fn map_article_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ArticleRow> {
    Ok(ArticleRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row
            .get::<_, Option<String>>(4)?
            .unwrap_or_else(|| "unknown".to_string()),
        author_email: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        media: row.get(6)?,
        category: row.get(7)?,
        published: row.get(8)?,
        status: row.get(9)?,
        likes_count: row.get(10)?,
        comments_count: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        profile_url: &str,
    ) -> Result<()> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, role, profile_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![id, username, email, password_hash, role, profile_url, now],
            )?;
            Ok(())
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                [email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn update_user_profile(
        &self,
        id: &str,
        username: &str,
        role: &str,
        profile_url: &str,
    ) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?2, role = ?3, profile_url = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![id, username, role, profile_url, now],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, password_hash, now],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_profile_url(&self, id: &str, profile_url: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET profile_url = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, profile_url, now],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_pdf(&self, id: &str, pdf_url: &str, pdf_public_id: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET pdf_url = ?2, pdf_public_id = ?3, updated_at = ?4 WHERE id = ?1",
                params![id, pdf_url, pdf_public_id, now],
            )?;
            Ok(changed > 0)
        })
    }

    /// Hard delete; articles and interactions follow via ON DELETE CASCADE.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, password, role, profile_url, pdf_url, pdf_public_id,
                        created_at, updated_at
                 FROM users ORDER BY created_at DESC, id",
            )?;
            let rows = stmt
                .query_map([], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Articles --

    #[allow(clippy::too_many_arguments)]
    pub fn create_article(
        &self,
        id: &str,
        title: &str,
        content_json: &str,
        author_id: &str,
        media_json: &str,
        category: &str,
        published: bool,
        status: &str,
    ) -> Result<()> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO articles (id, title, content, author_id, media, category, published, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![id, title, content_json, author_id, media_json, category, published, status, now],
            )?;
            Ok(())
        })
    }

    pub fn get_article(&self, id: &str) -> Result<Option<ArticleRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} WHERE a.id = ?1", article_select());
            let row = conn
                .query_row(&sql, [id], map_article_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_articles(&self) -> Result<Vec<ArticleRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY a.created_at DESC, a.id", article_select());
            query_articles(conn, &sql, [])
        })
    }

    pub fn list_articles_by_category(&self, category: &str) -> Result<Vec<ArticleRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE a.category = ?1 ORDER BY a.created_at DESC, a.id",
                article_select()
            );
            query_articles(conn, &sql, [category])
        })
    }

    pub fn list_articles_by_author(&self, author_id: &str) -> Result<Vec<ArticleRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE a.author_id = ?1 ORDER BY a.created_at DESC, a.id",
                article_select()
            );
            query_articles(conn, &sql, [author_id])
        })
    }

    pub fn update_article(
        &self,
        id: &str,
        title: &str,
        content_json: &str,
        media_json: &str,
        category: &str,
        published: bool,
        status: &str,
    ) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE articles SET title = ?2, content = ?3, media = ?4, category = ?5,
                        published = ?6, status = ?7, updated_at = ?8
                 WHERE id = ?1",
                params![id, title, content_json, media_json, category, published, status, now],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_article(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM articles WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Interactions --

    /// Atomic like toggle: one upsert, no read-modify-write window. A fresh
    /// row starts liked; an existing row has its flag flipped. Comment and
    /// saved are untouched. Returns the resulting liked state.
    pub fn toggle_like(&self, id: &str, article_id: &str, user_id: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let liked = conn.query_row(
                "INSERT INTO article_interactions (id, article_id, user_id, liked, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4, ?4)
                 ON CONFLICT(article_id, user_id)
                 DO UPDATE SET liked = NOT liked, updated_at = ?4
                 RETURNING liked",
                params![id, article_id, user_id, now],
                |row| row.get(0),
            )?;
            Ok(liked)
        })
    }

    /// Symmetric to [`Database::toggle_like`] for the saved flag.
    pub fn toggle_save(&self, id: &str, article_id: &str, user_id: &str) -> Result<bool> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let saved = conn.query_row(
                "INSERT INTO article_interactions (id, article_id, user_id, saved, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4, ?4)
                 ON CONFLICT(article_id, user_id)
                 DO UPDATE SET saved = NOT saved, updated_at = ?4
                 RETURNING saved",
                params![id, article_id, user_id, now],
                |row| row.get(0),
            )?;
            Ok(saved)
        })
    }

    /// Creates the row with the comment, or overwrites the existing row's
    /// comment without touching liked/saved. Returns the interaction id.
    pub fn upsert_comment(
        &self,
        id: &str,
        article_id: &str,
        user_id: &str,
        comment: &str,
    ) -> Result<String> {
        let now = now_timestamp();
        self.with_conn_mut(|conn| {
            let interaction_id = conn.query_row(
                "INSERT INTO article_interactions (id, article_id, user_id, comment, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(article_id, user_id)
                 DO UPDATE SET comment = excluded.comment, updated_at = ?5
                 RETURNING id",
                params![id, article_id, user_id, comment, now],
                |row| row.get(0),
            )?;
            Ok(interaction_id)
        })
    }

    pub fn get_interaction(&self, article_id: &str, user_id: &str) -> Result<Option<InteractionRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, article_id, user_id, comment, liked, saved, created_at, updated_at
                     FROM article_interactions WHERE article_id = ?1 AND user_id = ?2",
                    [article_id, user_id],
                    |row| {
                        Ok(InteractionRow {
                            id: row.get(0)?,
                            article_id: row.get(1)?,
                            user_id: row.get(2)?,
                            comment: row.get(3)?,
                            liked: row.get(4)?,
                            saved: row.get(5)?,
                            created_at: row.get(6)?,
                            updated_at: row.get(7)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Commented interactions for an article, newest first, with commenter
    /// identity joined in (avoids N+1 user lookups).
    pub fn get_comments(&self, article_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT i.id, i.comment, i.liked, i.saved, i.user_id, u.username, u.email, i.created_at
                 FROM article_interactions i
                 LEFT JOIN users u ON i.user_id = u.id
                 WHERE i.article_id = ?1 AND {COMMENT_PREDICATE}
                 ORDER BY i.created_at DESC, i.id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([article_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        comment: row.get(1)?,
                        liked: row.get(2)?,
                        saved: row.get(3)?,
                        user_id: row.get(4)?,
                        username: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                        email: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `(likes_count, comments_count)` for an article, computed with the same
    /// predicates as the article list/detail subqueries.
    pub fn interaction_counts(&self, article_id: &str) -> Result<(i64, i64)> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT
                    (SELECT COUNT(*) FROM article_interactions i
                        WHERE i.article_id = ?1 AND {LIKED_PREDICATE}),
                    (SELECT COUNT(*) FROM article_interactions i
                        WHERE i.article_id = ?1 AND {COMMENT_PREDICATE})"
            );
            let counts = conn.query_row(&sql, [article_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            Ok(counts)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is always a literal from this module, never caller input
    let sql = format!(
        "SELECT id, username, email, password, role, profile_url, pdf_url, pdf_public_id,
                created_at, updated_at
         FROM users WHERE {column} = ?1"
    );
    let row = conn.query_row(&sql, [value], map_user_row).optional()?;
    Ok(row)
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: row.get(4)?,
        profile_url: row.get(5)?,
        pdf_url: row.get(6)?,
        pdf_public_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn query_articles<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<ArticleRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_article_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
