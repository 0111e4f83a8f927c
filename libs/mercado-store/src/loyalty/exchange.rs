use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{DiscountGrant, GrantSource, UserAccount};

/// Fixed price points exposed in the bot UI.
pub const REDEEM_COST_SMALL: u64 = 200;
pub const REDEEM_COST_LARGE: u64 = 500;

const REDEEMED_VALID_DAYS: i64 = 7;
/// Any cost below this threshold buys the 10% grant, everything else 20%.
/// Two fixed tiers, deliberately not a continuous scale.
const LARGE_THRESHOLD: u64 = 500;

/// Convert accumulated points into a percent discount. Refuses without any
/// state change when the balance is short; points can never go negative.
pub fn redeem_points(
    user: &mut UserAccount,
    cost: u64,
    now: DateTime<Utc>,
) -> Result<DiscountGrant, StoreError> {
    if cost == 0 {
        return Err(StoreError::validation("redemption cost must be positive"));
    }
    if user.points < cost {
        return Err(StoreError::InsufficientPoints {
            have: user.points,
            need: cost,
        });
    }

    user.points -= cost;
    let percent = if cost < LARGE_THRESHOLD { 10 } else { 20 };
    let grant = DiscountGrant::percent_off(
        user.tg_id,
        percent,
        REDEEMED_VALID_DAYS,
        GrantSource::Points,
        now,
    );
    user.active_discounts.push(grant.clone());
    Ok(grant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_with_points(points: u64) -> (UserAccount, DateTime<Utc>) {
        let now = Utc::now();
        let mut u = UserAccount::new(9, None, None, now);
        u.points = points;
        (u, now)
    }

    #[test]
    fn exact_balance_redeems_to_ten_percent() {
        let (mut u, now) = user_with_points(200);
        let grant = redeem_points(&mut u, 200, now).unwrap();
        assert_eq!(u.points, 0);
        assert_eq!(grant.percent, 10);
        assert_eq!(grant.source, GrantSource::Points);
        assert_eq!(grant.expires_at, now + Duration::days(7));
        assert_eq!(u.active_discounts.len(), 1);
    }

    #[test]
    fn one_point_short_refuses_without_mutation() {
        let (mut u, now) = user_with_points(199);
        let err = redeem_points(&mut u, 200, now).unwrap_err();
        match err {
            StoreError::InsufficientPoints { have, need } => {
                assert_eq!(have, 199);
                assert_eq!(need, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(u.points, 199);
        assert!(u.active_discounts.is_empty());
    }

    #[test]
    fn five_hundred_buys_twenty_percent() {
        let (mut u, now) = user_with_points(700);
        let grant = redeem_points(&mut u, 500, now).unwrap();
        assert_eq!(grant.percent, 20);
        assert_eq!(u.points, 200);
    }

    #[test]
    fn any_cost_maps_onto_the_two_tiers() {
        let (mut u, now) = user_with_points(10_000);
        assert_eq!(redeem_points(&mut u, 499, now).unwrap().percent, 10);
        assert_eq!(redeem_points(&mut u, 501, now).unwrap().percent, 20);
    }

    #[test]
    fn zero_cost_is_rejected() {
        let (mut u, now) = user_with_points(100);
        assert!(matches!(
            redeem_points(&mut u, 0, now),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(u.points, 100);
    }
}
