pub mod auth;
mod client;
mod proto;

pub use client::{VertexBuildError, VertexClient};
