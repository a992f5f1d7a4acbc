use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// -- Roles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Reader,
    Journalist,
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Journalist => "journalist",
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reader" => Ok(Role::Reader),
            "journalist" => Ok(Role::Journalist),
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Article status --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Deleted,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Deleted => "deleted",
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            "deleted" => Ok(ArticleStatus::Deleted),
            _ => Err(()),
        }
    }
}

// -- Auth --

/// Register payload. Fields are validated (and role parsed) in the handler so
/// a missing field yields a field-specific message rather than a serde error.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, rename = "profileUrl")]
    pub profile_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    #[serde(rename = "profileUrl")]
    pub profile_url: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// User shape returned by every auth endpoint; never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(rename = "profileUrl")]
    pub profile_url: String,
    #[serde(rename = "pdfUrl")]
    pub pdf_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// -- Articles --

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    #[serde(default)]
    pub title: String,
    /// Block array, or a JSON string encoding one (multipart sends a string).
    pub content: Option<Value>,
    #[serde(default)]
    pub category: String,
    pub media: Option<Value>,
    /// Trusted-caller fallback; only honored when no bearer token is present.
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<Value>,
    pub media: Option<Value>,
    pub category: Option<String>,
    pub published: Option<Value>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ArticleView {
    pub id: Uuid,
    pub title: String,
    /// Parsed block array; falls back to the raw string when the stored
    /// content is not valid JSON.
    pub content: Value,
    pub author: AuthorRef,
    pub media: Vec<String>,
    pub category: String,
    pub published: bool,
    pub status: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// -- Interactions --

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub article_id: Option<String>,
    pub user_id: Option<String>,
    /// Older frontend builds send `userid`.
    pub userid: Option<String>,
}

impl InteractionRequest {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.userid.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub article_id: Option<String>,
    pub user_id: Option<String>,
    /// Frontend typo kept for compatibility.
    pub user_d: Option<String>,
    #[serde(default)]
    pub comment: String,
}

impl AddCommentRequest {
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref().or(self.user_d.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct CountsRequest {
    pub article_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub comment: String,
    pub liked: bool,
    pub saved: bool,
    pub author: AuthorRef,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct InteractionState {
    pub liked: bool,
    pub saved: bool,
    pub has_comment: bool,
}
