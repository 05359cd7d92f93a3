mod client;

pub use client::ScraperClient;
