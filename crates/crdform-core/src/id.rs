//! Identifier generation policies
//!
//! Every projection gets a fresh 64-bit identifier. The default policy is
//! wall-clock nanoseconds since the Unix epoch: calls more than a nanosecond
//! apart get distinct ids, calls within the same nanosecond (or across a
//! clock step backwards) may collide. `Monotonic` and `RandomId` are there for
//! callers that need stronger guarantees.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of record identifiers
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn next_id(&self) -> u64;
}

/// Current wall-clock time in nanoseconds since the Unix epoch
fn now_nanos() -> u64 {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|n| u64::try_from(n).ok())
        .unwrap_or_default()
}

/// Nanoseconds since the Unix epoch, read at call time
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl IdGenerator for WallClock {
    fn next_id(&self) -> u64 {
        now_nanos()
    }
}

/// Wall-clock nanoseconds, bumped so ids strictly increase within a process
#[derive(Debug, Default)]
pub struct Monotonic {
    last: AtomicU64,
}

impl Monotonic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for Monotonic {
    fn next_id(&self) -> u64 {
        let now = now_nanos();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Random non-negative 63-bit ids (fit a signed 64-bit state attribute)
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomId;

impl IdGenerator for RandomId {
    fn next_id(&self) -> u64 {
        rand::random::<u64>() >> 1
    }
}

/// Configurable identifier policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdPolicy {
    #[default]
    WallClock,
    Monotonic,
    Random,
}

impl IdPolicy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            Self::WallClock => Box::new(WallClock),
            Self::Monotonic => Box::new(Monotonic::new()),
            Self::Random => Box::new(RandomId),
        }
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WallClock => "wall-clock",
            Self::Monotonic => "monotonic",
            Self::Random => "random",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for IdPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wall-clock" | "wallclock" | "time" => Ok(Self::WallClock),
            "monotonic" => Ok(Self::Monotonic),
            "random" => Ok(Self::Random),
            other => Err(format!(
                "unknown id policy '{}' (expected wall-clock, monotonic or random)",
                other
            )),
        }
    }
}
