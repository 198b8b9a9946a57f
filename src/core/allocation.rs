//! Whole-share purchase allocation from a CAD cash budget.
//!
//! [`allocate`] maps a budget, a set of weighted priced holdings and one
//! USD→CAD rate to integer purchase quantities that spend as much of the
//! budget as possible without exceeding it. The priority symbol soaks up
//! leftover cash before any other top-up step.

use crate::core::currency::{Currency, cad_price};
use crate::core::weights::weight_fractions;
use std::collections::BTreeMap;

/// Comparison tolerance for budget arithmetic.
pub const TOLERANCE: f64 = 1e-9;

/// Hard bound on fill iterations, unrelated to input size. Valid input
/// terminates long before this; the cap only guards degenerate prices.
const MAX_FILL_STEPS: usize = 10_000;

/// Normalizes a symbol into its unique key form: trimmed, uppercased.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// One holding ready for allocation: a resolved native-currency price plus a
/// relative weight. Weights here are any non-negative reals; only their
/// proportions matter.
#[derive(Debug, Clone)]
pub struct PricedHolding {
    pub symbol: String,
    pub currency: Currency,
    pub price: f64,
    pub weight_pct: f64,
}

/// Outcome of one allocation run. `spent + leftover` equals the budget up to
/// [`TOLERANCE`] and every share count is non-negative.
#[derive(Debug, Clone, Default)]
pub struct AllocationResult {
    pub shares: BTreeMap<String, u32>,
    pub spent: f64,
    pub leftover: f64,
}

struct Lot {
    symbol: String,
    price: f64,
    remainder: f64,
    bought: u32,
    ceiling: u32,
}

impl Lot {
    fn affordable(&self, leftover: f64) -> bool {
        self.price > 0.0 && self.price <= leftover + TOLERANCE
    }
}

/// Computes whole-share purchase quantities for `budget` CAD.
///
/// Floor allocation first: each holding gets `floor(budget * fraction /
/// price)` shares of its CAD price. The leftover then goes to the priority
/// symbol for as many whole shares as it affords, and finally to the
/// remainder fill: among affordable holdings still under the ceiling of
/// their proportional target, the largest fractional remainder buys next
/// (ties to the lowest price); when none qualifies, the cheapest affordable
/// holding does. Stops when nothing is affordable.
///
/// Holdings with a non-positive price are never purchasable but still
/// participate in weight normalization. An empty holding set or non-positive
/// budget yields an empty plan.
pub fn allocate(
    budget: f64,
    holdings: &[PricedHolding],
    usd_to_cad: f64,
    priority: Option<&str>,
) -> AllocationResult {
    if holdings.is_empty() || budget <= 0.0 {
        return AllocationResult {
            shares: BTreeMap::new(),
            spent: 0.0,
            leftover: budget.max(0.0),
        };
    }

    let weights: Vec<f64> = holdings.iter().map(|h| h.weight_pct).collect();
    let fractions = weight_fractions(&weights);

    let mut leftover = budget;
    let mut lots: Vec<Lot> = Vec::with_capacity(holdings.len());
    for (holding, fraction) in holdings.iter().zip(fractions) {
        let price = cad_price(holding.price, holding.currency, usd_to_cad);
        let mut lot = Lot {
            symbol: normalize_symbol(&holding.symbol),
            price,
            remainder: 0.0,
            bought: 0,
            ceiling: 0,
        };
        if price > 0.0 {
            let target = budget * fraction / price;
            lot.bought = target.floor() as u32;
            lot.ceiling = target.ceil() as u32;
            lot.remainder = target - target.floor();
            leftover -= f64::from(lot.bought) * price;
        }
        lots.push(lot);
    }
    leftover = leftover.max(0.0);

    let priority_key = priority.map(normalize_symbol);
    let priority_lot = priority_key
        .as_deref()
        .and_then(|key| lots.iter().position(|lot| lot.symbol == key));

    let mut steps = 0usize;

    // Priority fill: exhaust leftover on the priority symbol before any
    // other top-up, so it never rounds down while spare budget could buy
    // one more share.
    if let Some(p) = priority_lot {
        while lots[p].affordable(leftover) && steps < MAX_FILL_STEPS {
            lots[p].bought += 1;
            leftover -= lots[p].price;
            steps += 1;
        }
    }

    while steps < MAX_FILL_STEPS {
        steps += 1;

        let mut pick: Option<usize> = None;
        for (i, lot) in lots.iter().enumerate() {
            if !lot.affordable(leftover) || lot.bought >= lot.ceiling {
                continue;
            }
            pick = match pick {
                None => Some(i),
                Some(best) => {
                    let current = &lots[best];
                    let wins = lot.remainder > current.remainder + TOLERANCE
                        || ((lot.remainder - current.remainder).abs() <= TOLERANCE
                            && lot.price < current.price);
                    if wins { Some(i) } else { Some(best) }
                }
            };
        }

        if pick.is_none() {
            // Nothing qualifies by the remainder rule; buy the cheapest
            // holding the leftover still covers.
            for (i, lot) in lots.iter().enumerate() {
                if !lot.affordable(leftover) {
                    continue;
                }
                if pick.is_none_or(|best| lot.price < lots[best].price) {
                    pick = Some(i);
                }
            }
        }

        match pick {
            Some(i) => {
                lots[i].bought += 1;
                leftover -= lots[i].price;
            }
            None => break,
        }
    }

    leftover = leftover.max(0.0);
    let mut shares = BTreeMap::new();
    for lot in &lots {
        *shares.entry(lot.symbol.clone()).or_insert(0) += lot.bought;
    }

    AllocationResult {
        shares,
        spent: budget - leftover,
        leftover,
    }
}
