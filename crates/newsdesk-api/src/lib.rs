pub mod articles;
pub mod auth;
pub mod convert;
pub mod error;
pub mod interactions;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod state;
pub mod token;
pub mod uploads;
