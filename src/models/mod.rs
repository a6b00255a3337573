// Data models for the Connect event and the backend API

pub mod api;
pub mod connect;

pub use connect::{ConnectEvent, ConnectResponse};
