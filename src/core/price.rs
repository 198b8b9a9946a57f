//! Quote abstractions shared by the providers and the CLI layer.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A resolved market quote for one symbol. The currency stays a raw provider
/// string here; the CLI layer parses it into the closed
/// [`crate::core::currency::Currency`] set and drops quotes it cannot
/// classify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub currency: String,
    pub short_name: Option<String>,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote>;
}
