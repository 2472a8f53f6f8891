pub mod articles;
pub mod auth;
pub mod engagement;
pub mod posts;
pub mod users;
