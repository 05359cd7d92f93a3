//! Seams to external collaborators.

pub mod review_source;
