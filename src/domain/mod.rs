pub mod article;
pub mod engagement;
pub mod post;
pub mod user;
