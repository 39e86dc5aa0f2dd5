use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::firestore::error::{out_of_range, FirestoreResult};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A point in time with nanosecond precision, independent of any time zone.
///
/// `nanos` is always normalized into `0..1_000_000_000`, so instants before the epoch carry a
/// negative `seconds` and a positive `nanos`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    /// `0001-01-01T00:00:00Z`
    pub const MIN_SECONDS: i64 = -62_135_596_800;
    /// `9999-12-31T23:59:59Z`
    pub const MAX_SECONDS: i64 = 253_402_300_799;
    pub const MAX_NANOS: i32 = 999_999_999;

    /// Builds a timestamp, carrying any overflowing or negative `nanos` into `seconds`.
    ///
    /// The carry saturates at the `i64` bounds; such instants fail [`Timestamp::try_new`].
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let nanos = i64::from(nanos);
        Self {
            seconds: seconds.saturating_add(nanos.div_euclid(NANOS_PER_SECOND)),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND) as i32,
        }
    }

    /// Like [`Timestamp::new`] but rejects instants outside the supported calendar range.
    pub fn try_new(seconds: i64, nanos: i32) -> FirestoreResult<Self> {
        let timestamp = Self::new(seconds, nanos);
        if !timestamp.is_in_range() {
            return Err(out_of_range(format!(
                "Timestamp ({seconds}s, {nanos}ns) is outside 0001-01-01 to 9999-12-31"
            )));
        }
        Ok(timestamp)
    }

    pub fn min() -> Self {
        Self::new(Self::MIN_SECONDS, 0)
    }

    pub fn max() -> Self {
        Self::new(Self::MAX_SECONDS, Self::MAX_NANOS)
    }

    pub fn now() -> Self {
        let now = Utc::now();
        Self::new(now.timestamp(), now.timestamp_subsec_nanos() as i32)
    }

    pub fn is_in_range(&self) -> bool {
        (Self::MIN_SECONDS..=Self::MAX_SECONDS).contains(&self.seconds)
    }

    /// Total nanoseconds since the epoch. Never overflows for any `i64` seconds value.
    pub fn to_nanos(&self) -> i128 {
        i128::from(self.seconds) * i128::from(NANOS_PER_SECOND) + i128::from(self.nanos)
    }

    /// Inverse of [`Timestamp::to_nanos`], range-checked.
    pub fn from_nanos(total: i128) -> FirestoreResult<Self> {
        let seconds = total.div_euclid(i128::from(NANOS_PER_SECOND));
        let nanos = total.rem_euclid(i128::from(NANOS_PER_SECOND)) as i32;
        let seconds = i64::try_from(seconds)
            .map_err(|_| out_of_range("Timestamp seconds overflow a 64-bit integer"))?;
        Self::try_new(seconds, nanos)
    }

    pub fn to_rfc3339(&self) -> Option<String> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanos as u32)
            .map(|time| time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seconds
            .cmp(&other.seconds)
            .then_with(|| self.nanos.cmp(&other.nanos))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_rfc3339() {
            Some(text) => f.write_str(&text),
            None => write!(f, "Timestamp(seconds={}, nanos={})", self.seconds, self.nanos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanosecond_carry_saturates_at_extreme_seconds() {
        let high = Timestamp::new(i64::MAX, 1_500_000_000);
        assert_eq!(high.seconds, i64::MAX);
        assert_eq!(high.nanos, 500_000_000);

        let low = Timestamp::new(i64::MIN, -1);
        assert_eq!(low.seconds, i64::MIN);
        assert_eq!(low.nanos, 999_999_999);

        assert!(Timestamp::try_new(i64::MAX, 1_500_000_000).is_err());
    }

    #[test]
    fn normalize_nanoseconds() {
        let timestamp = Timestamp::new(1, 1_500_000_000);
        assert_eq!(timestamp.seconds, 2);
        assert_eq!(timestamp.nanos, 500_000_000);

        let negative = Timestamp::new(0, -1);
        assert_eq!(negative.seconds, -1);
        assert_eq!(negative.nanos, 999_999_999);
    }

    #[test]
    fn ordering() {
        assert!(Timestamp::new(1, 0) < Timestamp::new(1, 1));
        assert!(Timestamp::new(-1, 999_999_999) < Timestamp::new(0, 0));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(Timestamp::try_new(Timestamp::MIN_SECONDS, 0).is_ok());
        assert!(Timestamp::try_new(Timestamp::MAX_SECONDS, Timestamp::MAX_NANOS).is_ok());
        let err = Timestamp::try_new(Timestamp::MIN_SECONDS, -1).unwrap_err();
        assert_eq!(err.code_str(), "firestore/out-of-range");
        assert!(Timestamp::try_new(Timestamp::MAX_SECONDS + 1, 0).is_err());
    }

    #[test]
    fn nanos_roundtrip_keeps_sign() {
        let ts = Timestamp::new(-5, 250);
        assert_eq!(Timestamp::from_nanos(ts.to_nanos()).unwrap(), ts);
    }

    #[test]
    fn renders_rfc3339() {
        assert_eq!(Timestamp::new(0, 0).to_string(), "1970-01-01T00:00:00Z");
        assert_eq!(Timestamp::min().to_string(), "0001-01-01T00:00:00Z");
    }
}
