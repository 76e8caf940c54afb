pub mod engine;
pub mod keywords;
pub mod trends;

pub use engine::{RecommendationEngine, RecommendationPayload};
pub use trends::NewsApiClient;
