use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percent,
    FreeShipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    Scratch,
    Points,
    Admin,
}

/// An issued discount code. Never mutated after creation; dropped from the
/// active list once expired (moved to display history, not erased).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountGrant {
    pub code: String,
    pub kind: DiscountKind,
    /// 1..=100 for percent grants, 0 for free shipping.
    pub percent: u8,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub source: GrantSource,
}

impl DiscountGrant {
    pub fn percent_off(
        tg_id: i64,
        percent: u8,
        valid_days: i64,
        source: GrantSource,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code: generate_code(&format!("P{}", percent), tg_id, now),
            kind: DiscountKind::Percent,
            percent,
            expires_at: now + Duration::days(valid_days),
            created_at: now,
            source,
        }
    }

    pub fn free_shipping(tg_id: i64, valid_days: i64, source: GrantSource, now: DateTime<Utc>) -> Self {
        Self {
            code: generate_code("SHIP", tg_id, now),
            kind: DiscountKind::FreeShipping,
            percent: 0,
            expires_at: now + Duration::days(valid_days),
            created_at: now,
            source,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn label(&self) -> String {
        match self.kind {
            DiscountKind::Percent => format!("{}% off", self.percent),
            DiscountKind::FreeShipping => "free shipping".to_string(),
        }
    }
}

/// Codes carry a short prefix, the tail of the Telegram id and timestamp for
/// eyeballing, and a random UUID fragment so uniqueness does not depend on
/// timestamp granularity.
fn generate_code(prefix: &str, tg_id: i64, now: DateTime<Utc>) -> String {
    let id_tail = (tg_id.unsigned_abs() % 10_000) as u32;
    let ts_tail = (now.timestamp().unsigned_abs() % 100_000) as u32;
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let nonce = &nonce[..6];
    format!("{}-{:04}-{:05}-{}", prefix, id_tail, ts_tail, nonce.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_grant_fields() {
        let now = Utc::now();
        let g = DiscountGrant::percent_off(123456789, 10, 7, GrantSource::Scratch, now);
        assert_eq!(g.kind, DiscountKind::Percent);
        assert_eq!(g.percent, 10);
        assert_eq!(g.expires_at, now + Duration::days(7));
        assert!(g.code.starts_with("P10-6789-"));
        assert!(!g.is_expired(now));
        assert!(g.is_expired(now + Duration::days(7)));
    }

    #[test]
    fn codes_do_not_collide_within_one_second() {
        let now = Utc::now();
        let a = DiscountGrant::percent_off(42, 20, 5, GrantSource::Points, now);
        let b = DiscountGrant::percent_off(42, 20, 5, GrantSource::Points, now);
        assert_ne!(a.code, b.code);
    }

    #[test]
    fn free_shipping_has_zero_percent() {
        let now = Utc::now();
        let g = DiscountGrant::free_shipping(7, 7, GrantSource::Scratch, now);
        assert_eq!(g.kind, DiscountKind::FreeShipping);
        assert_eq!(g.percent, 0);
        assert!(g.code.starts_with("SHIP-"));
        assert_eq!(g.label(), "free shipping");
    }
}
