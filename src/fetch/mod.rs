pub mod client;

pub use client::{decode_websites, FetchError, WebsiteClient};
