//! Bucketed expiration calculator.
//!
//! Expirations are rounded up to a coarse grid so that many distinct
//! credit times collapse into at most `max_slices` distinct expirations
//! per TTL window. Rounding is always upward: a slice lives at least its
//! full TTL, at the cost of up to one bucket of extra life.

use ember_types::{Expiry, Timestamp};

/// Compute the bucketed expiration for a credit at `now`.
///
/// `ttl_secs == 0` means the balance never expires. Otherwise the bucket
/// size is `max(1, ttl / max_slices)` and the expiration is the first
/// bucket boundary strictly after `now + ttl`. Arithmetic that would
/// overflow saturates to `Expiry::NEVER`.
///
/// Pure function of its inputs; no side effects.
pub fn bucketed_expiry(ttl_secs: u64, max_slices: u32, now: Timestamp) -> Expiry {
    if ttl_secs == 0 {
        return Expiry::NEVER;
    }
    let bucket = (ttl_secs / u64::from(max_slices.max(1))).max(1);
    let target = match now.as_secs().checked_add(ttl_secs) {
        Some(t) => t,
        None => return Expiry::NEVER,
    };
    match (target / bucket)
        .checked_add(1)
        .and_then(|q| q.checked_mul(bucket))
    {
        // u64::MAX is reserved as the never-expires sentinel.
        Some(secs) if secs != u64::MAX => Expiry::at(secs),
        _ => Expiry::NEVER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ttl_never_expires() {
        assert_eq!(bucketed_expiry(0, 30, Timestamp::new(12345)), Expiry::NEVER);
    }

    #[test]
    fn reference_scenario() {
        // ttl 3600, max_slices 30 => bucket 120.
        assert_eq!(
            bucketed_expiry(3600, 30, Timestamp::EPOCH),
            Expiry::at(3720)
        );
        assert_eq!(
            bucketed_expiry(3600, 30, Timestamp::new(1800)),
            Expiry::at(5520)
        );
    }

    #[test]
    fn lives_at_least_ttl() {
        for now in [0u64, 1, 59, 119, 120, 3599, 10_000] {
            let e = bucketed_expiry(3600, 30, Timestamp::new(now));
            assert!(e.as_secs() > now + 3600, "now={now} expiry={e}");
            assert!(e.as_secs() <= now + 3600 + 120, "now={now} expiry={e}");
        }
    }

    #[test]
    fn bucket_floor_is_one_second() {
        // ttl smaller than max_slices: bucket clamps to 1, expiry is the
        // next second after now + ttl.
        assert_eq!(bucketed_expiry(5, 30, Timestamp::new(10)), Expiry::at(16));
    }

    #[test]
    fn overflow_saturates_to_never() {
        assert_eq!(
            bucketed_expiry(u64::MAX - 1, 30, Timestamp::new(10)),
            Expiry::NEVER
        );
        assert_eq!(
            bucketed_expiry(3600, 30, Timestamp::new(u64::MAX - 10)),
            Expiry::NEVER
        );
    }

    #[test]
    fn exact_boundary_rounds_to_next_bucket() {
        // now + ttl landing exactly on a boundary still moves up one
        // bucket, so the slice strictly outlives its TTL.
        assert_eq!(
            bucketed_expiry(3600, 30, Timestamp::new(120)),
            Expiry::at(3840)
        );
    }
}
