use rand::Rng;

use super::catalog::{CatalogEntry, RewardKind};

/// Cumulative-weight sampling: walk the catalog subtracting each entry's
/// weight from `roll` and return the first entry where the remainder drops
/// to or below zero. Ties are impossible by construction.
pub fn pick(catalog: &[CatalogEntry; 5], roll: f64) -> RewardKind {
    let mut remainder = roll;
    for entry in catalog.iter() {
        remainder -= entry.weight as f64;
        if remainder <= 0.0 {
            return entry.kind;
        }
    }
    // Float rounding can leave a hair of remainder past the last entry.
    catalog[catalog.len() - 1].kind
}

/// Draw one reward. The roll is uniform in `[0, total_weight)` against the
/// weight sum of the catalog actually passed in, so a VIP-adjusted table
/// keeps every entry's configured probability.
pub fn draw<R: Rng + ?Sized>(catalog: &[CatalogEntry; 5], rng: &mut R) -> RewardKind {
    let total: u32 = catalog.iter().map(|e| e.weight).sum();
    pick(catalog, rng.random_range(0.0..total as f64))
}
