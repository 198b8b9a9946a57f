//! Commands that edit or display the target weight table. These own the
//! storage side of the rebalancer: load, apply one edit, persist, render.

use super::ui;
use crate::core::allocation::normalize_symbol;
use crate::core::config::{AppConfig, Holding};
use crate::core::rebalance::{priority_after_removal, rebalance, remove_holding as drop_weight};
use crate::core::weights::{normalize_to_100, to_integer_pct};
use anyhow::{Result, bail};
use comfy_table::Cell;
use std::path::Path;

/// Current integer weights, renormalized to a 100-point total.
fn normalized_weights(config: &AppConfig) -> Vec<u32> {
    let raw: Vec<f64> = config.holdings.iter().map(|h| h.weight).collect();
    normalize_to_100(&raw)
}

fn find_holding(config: &AppConfig, symbol: &str) -> Option<usize> {
    let key = normalize_symbol(symbol);
    config
        .holdings
        .iter()
        .position(|h| normalize_symbol(&h.symbol) == key)
}

/// Index of the priority holding; the first holding when none is configured
/// or the configured symbol no longer exists.
fn priority_index(config: &AppConfig) -> usize {
    config
        .effective_priority()
        .and_then(|symbol| find_holding(config, &symbol))
        .unwrap_or(0)
}

fn apply_weights(config: &mut AppConfig, weights: &[u32]) {
    for (holding, weight) in config.holdings.iter_mut().zip(weights) {
        holding.weight = f64::from(*weight);
    }
}

/// Displays the target weight table.
pub fn show(config: &AppConfig) -> Result<()> {
    let weights = normalized_weights(config);
    let priority = priority_index(config);

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Priority"),
        ui::header_cell("Symbol"),
        ui::header_cell("Weight (%)"),
    ]);

    for (i, holding) in config.holdings.iter().enumerate() {
        let marker = if i == priority { "●" } else { "" };
        table.add_row(vec![
            Cell::new(marker),
            Cell::new(normalize_symbol(&holding.symbol)),
            ui::amount_cell(format!("{}", weights[i])),
        ]);
    }

    println!(
        "\n{}\n",
        ui::style_text("Target weights", ui::StyleType::Title)
    );
    println!("{table}");
    println!(
        "\nBudget: {} CAD\n",
        ui::style_text(&format!("{:.2}", config.budget), ui::StyleType::TotalValue)
    );
    Ok(())
}

/// Sets one holding's weight and rebalances the rest so the table keeps
/// summing to 100.
pub fn set_weight(mut config: AppConfig, path: &Path, symbol: &str, weight: f64) -> Result<()> {
    let Some(edited) = find_holding(&config, symbol) else {
        bail!("No holding with symbol: {}", normalize_symbol(symbol));
    };

    let weights = normalized_weights(&config);
    let priority = priority_index(&config);
    let requested = to_integer_pct(weight);

    let next = rebalance(&weights, edited, requested, priority);
    if next == weights && requested != weights[edited] {
        println!(
            "{}",
            ui::style_text(
                "No spare weight to take from other holdings; targets unchanged.",
                ui::StyleType::Error,
            )
        );
        return Ok(());
    }

    apply_weights(&mut config, &next);
    config.save_to_path(path)?;
    show(&config)
}

/// Adds a holding at weight 0.
pub fn add_holding(mut config: AppConfig, path: &Path, symbol: &str) -> Result<()> {
    let key = normalize_symbol(symbol);
    if key.is_empty() {
        bail!("Symbol must not be empty");
    }
    if find_holding(&config, &key).is_some() {
        bail!("Holding already exists: {key}");
    }

    let mut weights = normalized_weights(&config);
    weights.push(0);
    config.holdings.push(Holding {
        symbol: key,
        weight: 0.0,
    });
    // A first holding starts with the full 100 points
    let weights: Vec<f64> = weights.iter().map(|w| f64::from(*w)).collect();
    apply_weights(&mut config, &normalize_to_100(&weights));

    config.save_to_path(path)?;
    show(&config)
}

/// Removes a holding, renormalizes the remaining weights and keeps the
/// priority reference pointing at the same logical holding.
pub fn remove_holding(mut config: AppConfig, path: &Path, symbol: &str) -> Result<()> {
    let Some(removed) = find_holding(&config, symbol) else {
        bail!("No holding with symbol: {}", normalize_symbol(symbol));
    };

    let weights = normalized_weights(&config);
    let priority = priority_index(&config);

    let next = drop_weight(&weights, removed);
    config.holdings.remove(removed);
    apply_weights(&mut config, &next);

    let new_priority = priority_after_removal(priority, removed);
    config.priority = config
        .holdings
        .get(new_priority)
        .map(|h| normalize_symbol(&h.symbol));

    config.save_to_path(path)?;
    show(&config)
}

/// Marks a holding as the priority.
pub fn set_priority(mut config: AppConfig, path: &Path, symbol: &str) -> Result<()> {
    let key = normalize_symbol(symbol);
    if find_holding(&config, &key).is_none() {
        bail!("No holding with symbol: {key}");
    }

    config.priority = Some(key);
    config.save_to_path(path)?;
    show(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config() -> AppConfig {
        AppConfig {
            budget: 100.0,
            holdings: vec![
                Holding {
                    symbol: "SPUS".to_string(),
                    weight: 50.0,
                },
                Holding {
                    symbol: "SPRE".to_string(),
                    weight: 25.0,
                },
                Holding {
                    symbol: "SPSK".to_string(),
                    weight: 15.0,
                },
                Holding {
                    symbol: "WSHR".to_string(),
                    weight: 10.0,
                },
            ],
            priority: Some("SPUS".to_string()),
            providers: Default::default(),
            usd_to_cad: 1.4,
        }
    }

    fn saved_weights(path: &Path) -> Vec<(String, f64)> {
        let config = AppConfig::load_from_path(path).unwrap();
        config
            .holdings
            .iter()
            .map(|h| (h.symbol.clone(), h.weight))
            .collect()
    }

    #[test]
    fn test_set_weight_persists_rebalanced_table() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        set_weight(test_config(), &path, "spre", 5.0)?;

        let holdings = saved_weights(&path);
        let total: f64 = holdings.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 100.0);
        // Freed weight lands on the priority holding
        assert_eq!(holdings[0], ("SPUS".to_string(), 70.0));
        assert_eq!(holdings[1], ("SPRE".to_string(), 5.0));
        Ok(())
    }

    #[test]
    fn test_set_weight_unknown_symbol_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let result = set_weight(test_config(), &path, "ZZZZ", 10.0);
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_rejected_edit_saves_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        let mut config = test_config();
        config.holdings.truncate(2);
        config.holdings[0].weight = 100.0;
        config.holdings[1].weight = 0.0;

        // SPRE can only grow by taking from the priority, which is shielded
        set_weight(config, &path, "SPRE", 30.0)?;
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_add_holding_starts_at_zero() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        add_holding(test_config(), &path, "vti")?;

        let holdings = saved_weights(&path);
        assert_eq!(holdings.len(), 5);
        assert_eq!(holdings[4], ("VTI".to_string(), 0.0));
        assert_eq!(holdings.iter().map(|(_, w)| w).sum::<f64>(), 100.0);
        Ok(())
    }

    #[test]
    fn test_add_first_holding_takes_all_weight() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        let mut config = test_config();
        config.holdings.clear();
        config.priority = None;

        add_holding(config, &path, "SPUS")?;
        assert_eq!(saved_weights(&path), vec![("SPUS".to_string(), 100.0)]);
        Ok(())
    }

    #[test]
    fn test_add_duplicate_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(add_holding(test_config(), &path, " spus ").is_err());
    }

    #[test]
    fn test_remove_renormalizes_and_keeps_priority() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        remove_holding(test_config(), &path, "SPRE")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.holdings.len(), 3);
        let total: f64 = config.holdings.iter().map(|h| h.weight).sum();
        assert_eq!(total, 100.0);
        assert_eq!(config.priority.as_deref(), Some("SPUS"));
        Ok(())
    }

    #[test]
    fn test_remove_priority_resets_to_first() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        remove_holding(test_config(), &path, "SPUS")?;

        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.priority.as_deref(), Some("SPRE"));
        Ok(())
    }

    #[test]
    fn test_set_priority_requires_existing_symbol() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("config.yaml");

        assert!(set_priority(test_config(), &path, "ZZZZ").is_err());

        set_priority(test_config(), &path, "wshr")?;
        let config = AppConfig::load_from_path(&path)?;
        assert_eq!(config.priority.as_deref(), Some("WSHR"));
        Ok(())
    }
}
