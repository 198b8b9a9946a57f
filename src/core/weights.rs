//! Integer weight normalization and largest-remainder apportionment.

use std::cmp::Ordering;

/// Clamps a raw weight input to `[0, 100]` and rounds to the nearest integer
/// percentage point. Non-finite input maps to 0.
pub fn to_integer_pct(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u32
}

/// Distributes `units` whole points across positions proportionally to
/// `shares` using the largest-remainder (Hamilton) method: floor each
/// proportional quota, then hand the remaining units one each to the largest
/// fractional remainders, ties broken by original position.
///
/// Positions with a zero share receive nothing; the result always sums to
/// `units` when the share total is positive.
pub fn apportion(shares: &[f64], units: u32) -> Vec<u32> {
    let mut allotted = vec![0u32; shares.len()];
    let total: f64 = shares.iter().sum();
    if units == 0 || total <= 0.0 {
        return allotted;
    }

    let mut remainders: Vec<(usize, f64)> = Vec::with_capacity(shares.len());
    let mut assigned = 0u32;
    for (i, share) in shares.iter().enumerate() {
        let quota = f64::from(units) * (share / total);
        let floor = quota.floor();
        allotted[i] = floor as u32;
        assigned += allotted[i];
        remainders.push((i, quota - floor));
    }

    remainders.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut remaining = units - assigned;
    for (i, _) in remainders {
        if remaining == 0 {
            break;
        }
        allotted[i] += 1;
        remaining -= 1;
    }

    allotted
}

/// Turns arbitrary weight inputs into integer percentage points summing to
/// exactly 100.
///
/// A set already summing to 100 is returned unchanged. A zero-sum non-empty
/// set defaults to the first entry holding all 100 points, which avoids a
/// division by zero while staying deterministic. Anything else is scaled
/// proportionally via [`apportion`].
pub fn normalize_to_100(weights: &[f64]) -> Vec<u32> {
    let ints: Vec<u32> = weights.iter().map(|w| to_integer_pct(*w)).collect();
    if ints.is_empty() {
        return ints;
    }

    let sum: u32 = ints.iter().sum();
    match sum {
        100 => ints,
        0 => {
            let mut defaulted = vec![0u32; ints.len()];
            defaulted[0] = 100;
            defaulted
        }
        _ => apportion(&ints.iter().map(|w| f64::from(*w)).collect::<Vec<_>>(), 100),
    }
}

/// Returns each weight as a fraction of the total, for relative weighting in
/// the allocator. A non-positive total falls back to an equal `1/n` split.
pub fn weight_fractions(weights: &[f64]) -> Vec<f64> {
    let sanitized: Vec<f64> = weights
        .iter()
        .map(|w| if w.is_finite() { *w } else { 0.0 })
        .collect();
    let total: f64 = sanitized.iter().sum();

    if total > 0.0 {
        sanitized.iter().map(|w| w / total).collect()
    } else {
        let equal = 1.0 / sanitized.len() as f64;
        vec![equal; sanitized.len()]
    }
}
