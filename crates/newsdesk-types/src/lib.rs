pub mod api;
pub mod content;
pub mod envelope;
