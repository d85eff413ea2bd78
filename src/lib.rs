pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod enums;
pub mod error;
pub mod filter;
pub mod models;
pub mod registry;
pub mod resource;
pub mod sync;
pub mod transport;
pub mod types;

pub use error::ClientError;
pub use registry::{Mutation, Registry};

#[cfg(test)]
pub mod testing;
