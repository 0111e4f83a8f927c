use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Percent10,
    Percent20,
    FreeShipping,
    PointsBonus,
    VipUpgrade,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub kind: RewardKind,
    pub weight: u32,
}

pub const PERCENT10_VALID_DAYS: i64 = 7;
pub const PERCENT20_VALID_DAYS: i64 = 5;
pub const FREE_SHIPPING_VALID_DAYS: i64 = 7;
pub const POINTS_BONUS_BASE: u64 = 80;
pub const POINTS_BONUS_VIP: u64 = 120;
pub const VIP_WINDOW_DAYS: i64 = 14;

/// The weighted reward table. The points-bonus weight depends on the drawing
/// user's VIP status at call time, so the summed weight is 98 or 103 and the
/// selector must normalize against the actual sum, never a constant.
pub fn catalog_for(vip_active: bool) -> [CatalogEntry; 5] {
    let points_weight = if vip_active { 18 } else { 13 };
    [
        CatalogEntry { kind: RewardKind::Percent10, weight: 45 },
        CatalogEntry { kind: RewardKind::Percent20, weight: 25 },
        CatalogEntry { kind: RewardKind::FreeShipping, weight: 15 },
        CatalogEntry { kind: RewardKind::PointsBonus, weight: points_weight },
        CatalogEntry { kind: RewardKind::VipUpgrade, weight: 2 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summed_weight_tracks_vip_state() {
        let base: u32 = catalog_for(false).iter().map(|e| e.weight).sum();
        let vip: u32 = catalog_for(true).iter().map(|e| e.weight).sum();
        assert_eq!(base, 98);
        assert_eq!(vip, 103);
    }
}
