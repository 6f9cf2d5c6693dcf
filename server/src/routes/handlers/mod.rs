pub mod analysis;
pub mod auth;
pub mod common;
pub mod compose;
pub mod reword;
