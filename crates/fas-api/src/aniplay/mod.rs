pub mod client;
pub mod types;

pub use client::{AniPlayClient, API_URL, BASE_URL};
