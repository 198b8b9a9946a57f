//! Currency abstractions and conversion into the budget currency.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The closed set of currencies a quote may be denominated in. The budget
/// itself is always CAD; unknown currency strings are rejected at the
/// provider boundary and never reach the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cad,
    Usd,
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Currency::Cad => "CAD",
                Currency::Usd => "USD",
            }
        )
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CAD" => Ok(Currency::Cad),
            "USD" => Ok(Currency::Usd),
            _ => Err(anyhow::anyhow!("Unsupported currency: {}", s)),
        }
    }
}

/// Converts a native-currency unit price into CAD using the single USD→CAD
/// exchange rate. Non-positive or non-finite prices convert to 0.0, which the
/// allocator treats as "not purchasable".
pub fn cad_price(price: f64, currency: Currency, usd_to_cad: f64) -> f64 {
    if !price.is_finite() || price <= 0.0 {
        return 0.0;
    }
    match currency {
        Currency::Usd => price * usd_to_cad,
        Currency::Cad => price,
    }
}

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}
