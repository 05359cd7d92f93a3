pub mod analyzers;
pub mod app_id;
pub mod chart;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod output;
pub mod services;
pub mod stats;
pub mod types;
