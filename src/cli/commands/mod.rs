pub mod auth;
pub mod plan;
pub mod route;
