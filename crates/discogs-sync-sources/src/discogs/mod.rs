pub mod api;
pub mod client;

pub use api::PageEnvelope;
pub use client::DiscogsClient;
