//! Row-to-view conversions shared by the auth, article and interaction
//! handlers, so every surface shapes users/articles/comments identically.

use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use newsdesk_db::models::{ArticleRow, CommentRow, UserRow};
use newsdesk_types::api::{ArticleView, AuthorRef, CommentView, PublicUser};

pub fn parse_uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str, what: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // Rows created by SQLite's datetime('now') default carry
            // "YYYY-MM-DD HH:MM:SS" without a timezone.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, raw, e);
            chrono::DateTime::default()
        })
}

pub fn public_user(row: &UserRow) -> PublicUser {
    PublicUser {
        id: parse_uuid(&row.id, "user id"),
        username: row.username.clone(),
        email: row.email.clone(),
        role: row.role.clone(),
        profile_url: row.profile_url.clone(),
        pdf_url: row.pdf_url.clone(),
        created_at: parse_timestamp(&row.created_at, "user created_at"),
        updated_at: parse_timestamp(&row.updated_at, "user updated_at"),
    }
}

pub fn article_view(row: &ArticleRow) -> ArticleView {
    // Stored content is a JSON block array; anything unparsable is surfaced
    // as the raw string rather than dropped.
    let content = serde_json::from_str::<Value>(&row.content)
        .unwrap_or_else(|_| Value::String(row.content.clone()));
    let media = serde_json::from_str::<Vec<String>>(&row.media).unwrap_or_default();

    ArticleView {
        id: parse_uuid(&row.id, "article id"),
        title: row.title.clone(),
        content,
        author: AuthorRef {
            id: parse_uuid(&row.author_id, "author id"),
            username: row.author_username.clone(),
            email: row.author_email.clone(),
        },
        media,
        category: row.category.clone(),
        published: row.published,
        status: row.status.clone(),
        likes_count: row.likes_count,
        comments_count: row.comments_count,
        created_at: parse_timestamp(&row.created_at, "article created_at"),
        updated_at: parse_timestamp(&row.updated_at, "article updated_at"),
    }
}

pub fn comment_view(row: &CommentRow) -> CommentView {
    CommentView {
        id: parse_uuid(&row.id, "interaction id"),
        comment: row.comment.clone(),
        liked: row.liked,
        saved: row.saved,
        author: AuthorRef {
            id: parse_uuid(&row.user_id, "commenter id"),
            username: row.username.clone(),
            email: row.email.clone(),
        },
        created_at: parse_timestamp(&row.created_at, "interaction created_at"),
    }
}
