pub mod client;
pub mod types;

pub use client::{AnimeUnityClient, BASE_URL};
