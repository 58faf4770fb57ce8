mod client;

pub use client::NewApiClient;
