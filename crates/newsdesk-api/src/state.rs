use std::sync::Arc;

use newsdesk_db::Database;
use newsdesk_media::MediaUploader;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub token_secret: String,
    pub media: Arc<dyn MediaUploader>,
}
