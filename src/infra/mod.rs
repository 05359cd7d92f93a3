//! Concrete review sources.

pub mod dump;
pub mod scraper;
