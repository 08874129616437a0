pub mod auth;
pub mod share;
pub mod upload;
