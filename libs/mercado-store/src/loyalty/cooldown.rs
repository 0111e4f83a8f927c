use chrono::{DateTime, Duration, Utc};

use crate::models::UserAccount;

pub const TICKET_COOLDOWN_DAYS: i64 = 14;

/// Zero means a draw is permitted right now. Never negative; monotonically
/// non-increasing as `now` advances. An unset `last_ticket_at` (fresh user,
/// or admin force-reset) unlocks immediately.
pub fn time_until_next_draw(user: &UserAccount, now: DateTime<Utc>) -> Duration {
    match user.last_ticket_at {
        None => Duration::zero(),
        Some(last) => {
            let cooldown = Duration::days(TICKET_COOLDOWN_DAYS);
            let elapsed = now - last;
            if elapsed >= cooldown {
                Duration::zero()
            } else {
                cooldown - elapsed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_draw_at(at: DateTime<Utc>) -> UserAccount {
        let mut u = UserAccount::new(1, None, None, at);
        u.last_ticket_at = Some(at);
        u
    }

    #[test]
    fn fresh_user_may_draw_immediately() {
        let now = Utc::now();
        let u = UserAccount::new(1, None, None, now);
        assert_eq!(time_until_next_draw(&u, now), Duration::zero());
    }

    #[test]
    fn full_wait_right_after_a_draw() {
        let now = Utc::now();
        let u = user_with_draw_at(now);
        assert_eq!(
            time_until_next_draw(&u, now),
            Duration::days(TICKET_COOLDOWN_DAYS)
        );
    }

    #[test]
    fn monotonically_non_increasing_as_time_advances() {
        let start = Utc::now();
        let u = user_with_draw_at(start);
        let mut prev = time_until_next_draw(&u, start);
        for hours in (1..=15 * 24).step_by(7) {
            let current = time_until_next_draw(&u, start + Duration::hours(hours));
            assert!(current <= prev);
            assert!(current >= Duration::zero());
            prev = current;
        }
    }

    #[test]
    fn unlocks_exactly_at_fourteen_days() {
        let start = Utc::now();
        let u = user_with_draw_at(start);
        let just_before = start + Duration::days(14) - Duration::seconds(1);
        assert_eq!(time_until_next_draw(&u, just_before), Duration::seconds(1));
        assert_eq!(
            time_until_next_draw(&u, start + Duration::days(14)),
            Duration::zero()
        );
    }

    #[test]
    fn admin_reset_unlocks_regardless_of_history() {
        let start = Utc::now();
        let mut u = user_with_draw_at(start);
        assert!(time_until_next_draw(&u, start) > Duration::zero());
        u.last_ticket_at = None;
        assert_eq!(time_until_next_draw(&u, start), Duration::zero());
    }
}
