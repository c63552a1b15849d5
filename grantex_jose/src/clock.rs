//! Time as seen by claim validation
//!
//! Validation asks a [`Clock`] for the current time rather than reading the
//! system clock directly, so expiry boundaries can be exercised in tests.

use std::{fmt, time::SystemTime};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Unix time
///
/// The number of whole seconds elapsed since 1970-01-01T00:00:00Z.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct UnixTime(pub i64);

impl UnixTime {
    /// Adds a number of seconds, saturating at the bounds
    #[inline]
    #[must_use]
    pub const fn saturating_add_secs(self, secs: u64) -> Self {
        let secs = if secs > i64::MAX as u64 {
            i64::MAX
        } else {
            secs as i64
        };
        Self(self.0.saturating_add(secs))
    }

    /// Subtracts a number of seconds, saturating at the bounds
    #[inline]
    #[must_use]
    pub const fn saturating_sub_secs(self, secs: u64) -> Self {
        let secs = if secs > i64::MAX as u64 {
            i64::MAX
        } else {
            secs as i64
        };
        Self(self.0.saturating_sub(secs))
    }
}

impl From<SystemTime> for UnixTime {
    fn from(t: SystemTime) -> Self {
        match t.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => Self(0).saturating_add_secs(d.as_secs()),
            Err(e) => Self(0).saturating_sub_secs(e.duration().as_secs()),
        }
    }
}

impl fmt::Display for UnixTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for UnixTime {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Accepts any JSON number; fractional seconds are truncated toward zero
impl<'de> Deserialize<'de> for UnixTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UnixTimeVisitor;

        impl<'de> de::Visitor<'de> for UnixTimeVisitor {
            type Value = UnixTime;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a numeric timestamp in seconds")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(UnixTime(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(UnixTime(0).saturating_add_secs(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                if v.is_finite() {
                    #[allow(clippy::cast_possible_truncation)]
                    let secs = v.trunc() as i64;
                    Ok(UnixTime(secs))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(UnixTimeVisitor)
    }
}

/// Represents a clock, which can tell the current time
pub trait Clock {
    /// Gets the current time according to this clock
    fn now(&self) -> UnixTime;
}

impl<C: Clock + ?Sized> Clock for &'_ C {
    #[inline]
    fn now(&self) -> UnixTime {
        C::now(self)
    }
}

/// The system clock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        UnixTime::from(SystemTime::now())
    }
}

/// A clock frozen at a settable instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a new test clock with the specified time
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Updates the clock's current time to `val`
    pub fn set(&mut self, val: UnixTime) {
        self.0 = val;
    }

    /// Advances the clock by `secs` seconds
    pub fn advance(&mut self, secs: u64) {
        self.0 = self.0.saturating_add_secs(secs);
    }
}
