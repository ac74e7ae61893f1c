//! ShopLens core: sales dataset repair and analytics.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod generator;
pub mod imputation;
pub mod name_generator;
pub mod pricing;
pub mod recommender;
pub mod record;
pub mod reports;
pub mod rng;
pub mod snapshot;
pub mod stats;
pub mod types;
