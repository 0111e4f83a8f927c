use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::discount::DiscountGrant;

/// Most recent scratch draws kept on the record, oldest dropped first.
pub const TICKET_HISTORY_CAP: usize = 30;
/// Expired/used grants kept around for the profile panel.
pub const USED_DISCOUNTS_CAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VipTier {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
}

impl std::fmt::Display for VipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VipTier::None => "none",
            VipTier::Bronze => "bronze",
            VipTier::Silver => "silver",
            VipTier::Gold => "gold",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for VipTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(VipTier::None),
            "bronze" => Ok(VipTier::Bronze),
            "silver" => Ok(VipTier::Silver),
            "gold" => Ok(VipTier::Gold),
            other => Err(format!("unknown VIP tier: {}", other)),
        }
    }
}

/// One entry of the bounded scratch history, for the profile panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRecord {
    pub summary: String,
    pub at: DateTime<Utc>,
}

/// One chat-platform end user. Whole record is the persistence unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub tg_id: i64,
    pub username: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub vip_tier: VipTier,
    pub vip_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub active_discounts: Vec<DiscountGrant>,
    #[serde(default)]
    pub used_discounts: Vec<DiscountGrant>,
    #[serde(default)]
    pub ticket_history: Vec<TicketRecord>,
    pub last_ticket_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(
        tg_id: i64,
        username: Option<&str>,
        full_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tg_id,
            username: username.map(str::to_string),
            full_name: full_name.map(str::to_string),
            vip_tier: VipTier::None,
            vip_until: None,
            points: 0,
            active_discounts: Vec::new(),
            used_discounts: Vec::new(),
            ticket_history: Vec::new(),
            last_ticket_at: None,
            created_at: now,
        }
    }

    /// Invariant: a non-None tier implies a `vip_until` in the future at the
    /// last normalization.
    pub fn vip_active(&self, now: DateTime<Utc>) -> bool {
        self.vip_tier != VipTier::None && self.vip_until.map(|until| now < until).unwrap_or(false)
    }

    /// Lazy expiry, applied on every read path. Reverts an elapsed VIP tier
    /// and moves expired grants from the active list to the display history.
    /// Returns whether the record changed so callers can persist.
    pub fn normalize(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if self.vip_tier != VipTier::None {
            let elapsed = self.vip_until.map(|until| now >= until).unwrap_or(true);
            if elapsed {
                self.vip_tier = VipTier::None;
                self.vip_until = None;
                changed = true;
            }
        }

        if self.active_discounts.iter().any(|g| g.is_expired(now)) {
            let (expired, live): (Vec<_>, Vec<_>) = self
                .active_discounts
                .drain(..)
                .partition(|g| g.is_expired(now));
            self.active_discounts = live;
            self.used_discounts.extend(expired);
            let overflow = self.used_discounts.len().saturating_sub(USED_DISCOUNTS_CAP);
            if overflow > 0 {
                self.used_discounts.drain(..overflow);
            }
            changed = true;
        }

        changed
    }

    pub fn push_ticket_record(&mut self, summary: String, at: DateTime<Utc>) {
        self.ticket_history.push(TicketRecord { summary, at });
        let overflow = self.ticket_history.len().saturating_sub(TICKET_HISTORY_CAP);
        if overflow > 0 {
            self.ticket_history.drain(..overflow);
        }
    }

    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.tg_id.to_string())
    }
}
