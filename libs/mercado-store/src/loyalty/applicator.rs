use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::catalog::{
    catalog_for, RewardKind, FREE_SHIPPING_VALID_DAYS, PERCENT10_VALID_DAYS, PERCENT20_VALID_DAYS,
    POINTS_BONUS_BASE, POINTS_BONUS_VIP, VIP_WINDOW_DAYS,
};
use super::cooldown::time_until_next_draw;
use super::selector;
use crate::error::StoreError;
use crate::models::{DiscountGrant, GrantSource, UserAccount, VipTier};

/// What a drawn reward did to the record, for rendering back to the user.
#[derive(Debug, Clone)]
pub enum AppliedReward {
    Discount(DiscountGrant),
    Points { added: u64, total: u64 },
    Vip { tier: VipTier, until: DateTime<Utc> },
}

impl AppliedReward {
    pub fn summary(&self) -> String {
        match self {
            AppliedReward::Discount(grant) => {
                format!("{} code {}", grant.label(), grant.code)
            }
            AppliedReward::Points { added, .. } => format!("+{} points", added),
            AppliedReward::Vip { tier, until } => {
                format!("VIP {} until {}", tier, until.format("%Y-%m-%d"))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TicketOutcome {
    pub kind: RewardKind,
    pub applied: AppliedReward,
}

/// One full scratch-ticket draw against a user record. The cooldown check
/// runs before any reward computation so a refused draw consumes no
/// randomness and changes nothing. Run inside the store's `update` closure.
pub fn scratch_ticket<R: Rng + ?Sized>(
    user: &mut UserAccount,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<TicketOutcome, StoreError> {
    let remaining = time_until_next_draw(user, now);
    if remaining > Duration::zero() {
        return Err(StoreError::CooldownActive { remaining });
    }

    let catalog = catalog_for(user.vip_active(now));
    let kind = selector::draw(&catalog, rng);
    let applied = apply_reward(user, kind, now);

    user.push_ticket_record(applied.summary(), now);
    user.last_ticket_at = Some(now);

    Ok(TicketOutcome { kind, applied })
}

/// Mutate the record according to the drawn reward kind. Split out from
/// [`scratch_ticket`] so a known kind can be applied directly under test.
pub fn apply_reward(user: &mut UserAccount, kind: RewardKind, now: DateTime<Utc>) -> AppliedReward {
    match kind {
        RewardKind::Percent10 => {
            let grant = DiscountGrant::percent_off(
                user.tg_id,
                10,
                PERCENT10_VALID_DAYS,
                GrantSource::Scratch,
                now,
            );
            user.active_discounts.push(grant.clone());
            AppliedReward::Discount(grant)
        }
        RewardKind::Percent20 => {
            let grant = DiscountGrant::percent_off(
                user.tg_id,
                20,
                PERCENT20_VALID_DAYS,
                GrantSource::Scratch,
                now,
            );
            user.active_discounts.push(grant.clone());
            AppliedReward::Discount(grant)
        }
        RewardKind::FreeShipping => {
            let grant = DiscountGrant::free_shipping(
                user.tg_id,
                FREE_SHIPPING_VALID_DAYS,
                GrantSource::Scratch,
                now,
            );
            user.active_discounts.push(grant.clone());
            AppliedReward::Discount(grant)
        }
        RewardKind::PointsBonus => {
            let added = if user.vip_active(now) {
                POINTS_BONUS_VIP
            } else {
                POINTS_BONUS_BASE
            };
            user.points += added;
            AppliedReward::Points { added, total: user.points }
        }
        RewardKind::VipUpgrade => {
            let extension = Duration::days(VIP_WINDOW_DAYS);
            if user.vip_active(now) {
                // Keep the current tier; extend from whichever is later so
                // an upgrade never shortens the window.
                let base = user.vip_until.filter(|until| *until > now).unwrap_or(now);
                user.vip_until = Some(base + extension);
            } else {
                user.vip_tier = VipTier::Bronze;
                user.vip_until = Some(now + extension);
            }
            AppliedReward::Vip {
                tier: user.vip_tier,
                until: user.vip_until.unwrap_or(now),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fresh_user(now: DateTime<Utc>) -> UserAccount {
        UserAccount::new(555, Some("drawer"), None, now)
    }

    #[test]
    fn cooldown_refusal_changes_nothing_and_consumes_no_randomness() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        user.last_ticket_at = Some(now - Duration::days(1));
        user.points = 10;

        let mut rng = StdRng::seed_from_u64(3);
        let before = rng.clone();
        let err = scratch_ticket(&mut user, &mut rng, now).unwrap_err();

        match err {
            StoreError::CooldownActive { remaining } => {
                assert_eq!(remaining, Duration::days(13));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(user.points, 10);
        assert_eq!(user.last_ticket_at, Some(now - Duration::days(1)));
        assert!(user.active_discounts.is_empty());
        assert!(user.ticket_history.is_empty());
        // The RNG was never touched.
        let mut untouched = before;
        assert_eq!(
            rng.random_range(0.0_f64..98.0).to_bits(),
            untouched.random_range(0.0_f64..98.0).to_bits()
        );
    }

    #[test]
    fn points_bonus_credits_eighty_for_non_vip() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        let applied = apply_reward(&mut user, RewardKind::PointsBonus, now);
        assert_eq!(user.points, 80);
        match applied {
            AppliedReward::Points { added, total } => {
                assert_eq!(added, 80);
                assert_eq!(total, 80);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn points_bonus_credits_one_twenty_for_vip() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        user.vip_tier = VipTier::Gold;
        user.vip_until = Some(now + Duration::days(5));
        apply_reward(&mut user, RewardKind::PointsBonus, now);
        assert_eq!(user.points, 120);
    }

    #[test]
    fn percent_rewards_append_grants_with_stated_windows() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        apply_reward(&mut user, RewardKind::Percent10, now);
        apply_reward(&mut user, RewardKind::Percent20, now);
        apply_reward(&mut user, RewardKind::FreeShipping, now);

        assert_eq!(user.active_discounts.len(), 3);
        assert_eq!(user.active_discounts[0].expires_at, now + Duration::days(7));
        assert_eq!(user.active_discounts[1].expires_at, now + Duration::days(5));
        assert_eq!(user.active_discounts[2].expires_at, now + Duration::days(7));
        assert_eq!(user.active_discounts[0].source, GrantSource::Scratch);
    }

    #[test]
    fn vip_upgrade_grants_bronze_for_two_weeks() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        apply_reward(&mut user, RewardKind::VipUpgrade, now);
        assert_eq!(user.vip_tier, VipTier::Bronze);
        assert_eq!(user.vip_until, Some(now + Duration::days(14)));
    }

    #[test]
    fn vip_upgrade_keeps_tier_and_extends_from_the_later_timestamp() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        user.vip_tier = VipTier::Silver;
        user.vip_until = Some(now + Duration::days(3));

        apply_reward(&mut user, RewardKind::VipUpgrade, now);
        assert_eq!(user.vip_tier, VipTier::Silver);
        assert_eq!(user.vip_until, Some(now + Duration::days(17)));
    }

    #[test]
    fn vip_extension_is_monotonic() {
        let now = Utc::now();

        let mut once = fresh_user(now);
        apply_reward(&mut once, RewardKind::VipUpgrade, now);

        let mut twice = fresh_user(now);
        apply_reward(&mut twice, RewardKind::VipUpgrade, now);
        apply_reward(&mut twice, RewardKind::VipUpgrade, now);

        assert!(twice.vip_until.unwrap() >= once.vip_until.unwrap());
        assert_eq!(twice.vip_until, Some(now + Duration::days(28)));
    }

    #[test]
    fn scratch_records_history_and_timestamp() {
        let now = Utc::now();
        let mut user = fresh_user(now);
        let mut rng = StdRng::seed_from_u64(99);

        let outcome = scratch_ticket(&mut user, &mut rng, now).unwrap();
        assert_eq!(user.last_ticket_at, Some(now));
        assert_eq!(user.ticket_history.len(), 1);
        assert_eq!(user.ticket_history[0].summary, outcome.applied.summary());

        // One second later the gate refuses with ~13d 23:59:59 left.
        let err = scratch_ticket(&mut user, &mut rng, now + Duration::seconds(1)).unwrap_err();
        match err {
            StoreError::CooldownActive { remaining } => {
                assert_eq!(remaining, Duration::days(14) - Duration::seconds(1));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(user.ticket_history.len(), 1);
    }

    #[test]
    fn fixed_roll_end_to_end_points_bonus() {
        // A fresh user drawing a roll inside the points-bonus band lands on
        // exactly 80 points, per the example flow.
        let now = Utc::now();
        let mut user = fresh_user(now);
        let catalog = catalog_for(user.vip_active(now));
        let kind = selector::pick(&catalog, 90.0);
        assert_eq!(kind, RewardKind::PointsBonus);

        apply_reward(&mut user, kind, now);
        user.push_ticket_record("test draw".into(), now);
        user.last_ticket_at = Some(now);

        assert_eq!(user.points, 80);
        assert_eq!(user.ticket_history.len(), 1);
        assert_eq!(user.last_ticket_at, Some(now));
    }
}
