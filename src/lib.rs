// PSTN Transfer Lambda - library root for the binary and tests

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http_client;
pub mod models;
pub mod resolver;
pub mod service;
