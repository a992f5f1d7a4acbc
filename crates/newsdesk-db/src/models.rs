//! Database row types mapping directly to SQLite rows. Distinct from the
//! newsdesk-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Always an argon2 hash; the API layer only ever writes `HashedPassword`
    /// values into this field.
    pub password: String,
    pub role: String,
    pub profile_url: String,
    pub pdf_url: String,
    pub pdf_public_id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ArticleRow {
    pub id: String,
    pub title: String,
    /// JSON-encoded block array.
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub author_email: String,
    /// JSON-encoded URL array.
    pub media: String,
    pub category: String,
    pub published: bool,
    pub status: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct InteractionRow {
    pub id: String,
    pub article_id: String,
    pub user_id: String,
    pub comment: Option<String>,
    pub liked: bool,
    pub saved: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Interaction joined with the commenting user's public identity.
pub struct CommentRow {
    pub id: String,
    pub comment: String,
    pub liked: bool,
    pub saved: bool,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
}
