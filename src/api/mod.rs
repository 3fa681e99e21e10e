//! HTTP API for galleries and news

pub mod response;
pub mod routes;
pub mod server;

pub use server::{cors_layer, ApiServer};
