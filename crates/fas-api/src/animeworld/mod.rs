pub mod client;
pub mod types;

pub use client::{AnimeWorldClient, BASE_URL};
