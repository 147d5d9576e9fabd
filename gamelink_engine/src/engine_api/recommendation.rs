use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// A scored suggestion from the external recommendation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecommendation {
    pub player_id: i64,
    pub nickname: String,
    pub score: f64,
    pub reason: String,
}

/// An external service that ranks players for an order. Its answers are advisory: the engine logs and ignores
/// failures.
#[allow(async_fn_in_trait)]
pub trait RecommendationClient {
    type Error: std::fmt::Display;

    async fn recommend(&self, order: &Order) -> Result<Vec<CandidateRecommendation>, Self::Error>;
}

/// Placeholder used when no recommendation service is configured. It is never called.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecommender;

impl RecommendationClient for NoRecommender {
    type Error = Infallible;

    async fn recommend(&self, _order: &Order) -> Result<Vec<CandidateRecommendation>, Self::Error> {
        Ok(Vec::new())
    }
}
