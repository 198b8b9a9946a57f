//! The purchase-plan command: resolve quotes and the FX rate, run the
//! allocator, render the result.

use super::ui;
use crate::core::allocation::{AllocationResult, PricedHolding, allocate, normalize_symbol};
use crate::core::config::AppConfig;
use crate::core::currency::{Currency, CurrencyRateProvider, cad_price};
use crate::core::price::{PriceProvider, Quote};
use crate::core::weights::normalize_to_100;
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

pub async fn run(
    config: &AppConfig,
    quote_provider: &(dyn PriceProvider + Send + Sync),
    currency_provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> Result<()> {
    let raw_weights: Vec<f64> = config.holdings.iter().map(|h| h.weight).collect();
    let weights = normalize_to_100(&raw_weights);

    // Resolve each distinct symbol once, concurrently
    let mut symbols_to_fetch: Vec<String> = config
        .holdings
        .iter()
        .map(|h| normalize_symbol(&h.symbol))
        .collect();
    symbols_to_fetch.sort();
    symbols_to_fetch.dedup();

    let pb = ui::new_progress_bar(symbols_to_fetch.len() as u64, true);
    pb.set_message("Fetching quotes...");

    let quote_futures = symbols_to_fetch.iter().map(|symbol| {
        let pb_clone = pb.clone();
        async move {
            let res = quote_provider.fetch_quote(symbol).await;
            pb_clone.inc(1);
            (symbol.clone(), res)
        }
    });
    let quotes: HashMap<String, Result<Quote>> =
        join_all(quote_futures).await.into_iter().collect();
    pb.finish_and_clear();

    // A quote is usable once its currency parses into the closed set and
    // its price is positive; everything else is excluded from allocation.
    let mut resolved: HashMap<String, (Quote, Currency)> = HashMap::new();
    for (symbol, quote) in &quotes {
        if let Ok(quote) = quote {
            match quote.currency.parse::<Currency>() {
                Ok(currency) if quote.price > 0.0 => {
                    resolved.insert(symbol.clone(), (quote.clone(), currency));
                }
                Ok(_) => warn!(symbol, "Ignoring quote with non-positive price"),
                Err(e) => warn!(symbol, error = %e, "Ignoring quote in unsupported currency"),
            }
        }
    }

    let needs_fx = resolved
        .values()
        .any(|(_, currency)| *currency == Currency::Usd);
    let usd_to_cad = if needs_fx {
        match currency_provider.get_rate("USD", "CAD").await {
            Ok(rate) => rate,
            Err(e) => {
                warn!(error = %e, "FX fetch failed, using configured rate");
                config.usd_to_cad
            }
        }
    } else {
        config.usd_to_cad
    };
    debug!(usd_to_cad, "Using exchange rate");

    let priced: Vec<PricedHolding> = config
        .holdings
        .iter()
        .zip(&weights)
        .filter_map(|(holding, weight)| {
            let symbol = normalize_symbol(&holding.symbol);
            resolved.get(&symbol).map(|(quote, currency)| PricedHolding {
                symbol,
                currency: *currency,
                price: quote.price,
                weight_pct: f64::from(*weight),
            })
        })
        .collect();

    let priority = config.effective_priority();
    let result = allocate(config.budget, &priced, usd_to_cad, priority.as_deref());

    display_plan_table(config, &weights, &quotes, &resolved, usd_to_cad, &result);
    Ok(())
}

fn display_plan_table(
    config: &AppConfig,
    weights: &[u32],
    quotes: &HashMap<String, Result<Quote>>,
    resolved: &HashMap<String, (Quote, Currency)>,
    usd_to_cad: f64,
    result: &AllocationResult,
) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Currency"),
        ui::header_cell("Price"),
        ui::header_cell("Price (CAD)"),
        ui::header_cell("Weight (%)"),
        ui::header_cell("Shares"),
        ui::header_cell("Cost (CAD)"),
    ]);

    for (holding, weight) in config.holdings.iter().zip(weights) {
        let symbol = normalize_symbol(&holding.symbol);
        let has_error = quotes.get(&symbol).is_some_and(|q| q.is_err());

        match resolved.get(&symbol) {
            Some((quote, currency)) => {
                let unit_cad = cad_price(quote.price, *currency, usd_to_cad);
                let shares = result.shares.get(&symbol).copied().unwrap_or(0);
                let name = quote.short_name.clone().unwrap_or_else(|| symbol.clone());
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(currency.to_string()),
                    ui::amount_cell(format!("{:.2}", quote.price)),
                    ui::amount_cell(ui::style_text(
                        &format!("{unit_cad:.2}"),
                        ui::StyleType::Subtle,
                    )),
                    ui::amount_cell(format!("{weight}")),
                    ui::amount_cell(format!("{shares}")),
                    ui::amount_cell(format!("{:.2}", f64::from(shares) * unit_cad)),
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(symbol),
                    ui::na_cell(has_error),
                    ui::na_cell(has_error),
                    ui::na_cell(has_error),
                    ui::amount_cell(format!("{weight}")),
                    ui::na_cell(has_error),
                    ui::na_cell(has_error),
                ]);
            }
        }
    }

    println!(
        "\n{}\n",
        ui::style_text("Purchase plan", ui::StyleType::Title)
    );
    println!("{table}");
    println!(
        "\n{} {:.2} CAD",
        ui::style_text("Budget:", ui::StyleType::TotalLabel),
        config.budget
    );
    println!(
        "{} {}",
        ui::style_text("Spent:", ui::StyleType::TotalLabel),
        ui::style_text(&format!("{:.2} CAD", result.spent), ui::StyleType::TotalValue)
    );
    println!(
        "{} {:.2} CAD\n",
        ui::style_text("Leftover:", ui::StyleType::TotalLabel),
        result.leftover
    );
    ui::print_separator();
}
