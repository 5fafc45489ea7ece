pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod plans;
pub mod query;
pub mod session;
pub mod types;
pub mod view;

#[cfg(test)]
pub mod testing;
