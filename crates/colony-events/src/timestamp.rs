//! Mars Clock
//!
//! Simulated time expressed in sols and millisols. Every duration in the
//! scheduler is a number of millisols consumed from a tick budget.
//!
//! # Example
//!
//! ```
//! use colony_events::MarsClock;
//!
//! let mut clock = MarsClock::new(1, 990.0);
//! clock.advance(25.0);
//! assert_eq!(clock.sol(), 2);
//! assert_eq!(clock.to_string(), "sol_2.msol_015.000");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Number of millisols in one sol.
pub const MILLISOLS_PER_SOL: f64 = 1000.0;

/// A point in simulated Mars time.
///
/// Serializes to strings like "sol_3.msol_421.500".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct MarsClock {
    sol: u32,
    millisol: f64,
}

impl MarsClock {
    /// Creates a clock at the given sol and millisol of day.
    ///
    /// Millisols beyond one sol roll over into the following sols.
    pub fn new(sol: u32, millisol: f64) -> Self {
        let mut clock = Self { sol, millisol: 0.0 };
        clock.advance(millisol);
        clock
    }

    /// The first instant of the simulation.
    pub fn start() -> Self {
        Self {
            sol: 1,
            millisol: 0.0,
        }
    }

    /// Advances the clock, handling sol rollover.
    ///
    /// Negative or non-finite amounts are ignored.
    pub fn advance(&mut self, millisols: f64) {
        if !millisols.is_finite() || millisols <= 0.0 {
            return;
        }
        self.millisol += millisols;
        while self.millisol >= MILLISOLS_PER_SOL {
            self.millisol -= MILLISOLS_PER_SOL;
            self.sol += 1;
        }
    }

    pub fn sol(&self) -> u32 {
        self.sol
    }

    pub fn millisol(&self) -> f64 {
        self.millisol
    }

    /// Fraction of the current sol elapsed (0.0 to 1.0).
    pub fn time_of_day(&self) -> f64 {
        self.millisol / MILLISOLS_PER_SOL
    }

    /// Total millisols since sol 0.
    pub fn total_millisols(&self) -> f64 {
        self.sol as f64 * MILLISOLS_PER_SOL + self.millisol
    }

    /// Millisols elapsed from `earlier` to this instant (0 if `earlier` is later).
    pub fn millisols_since(&self, earlier: &MarsClock) -> f64 {
        (self.total_millisols() - earlier.total_millisols()).max(0.0)
    }
}

impl Default for MarsClock {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for MarsClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sol_{}.msol_{:07.3}", self.sol, self.millisol)
    }
}

/// Error type for parsing a MarsClock from strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseClockError {
    InvalidFormat(String),
    InvalidSol(String),
    InvalidMillisol(String),
}

impl fmt::Display for ParseClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseClockError::InvalidFormat(s) => {
                write!(f, "invalid clock format: '{}', expected 'sol_N.msol_M'", s)
            }
            ParseClockError::InvalidSol(s) => write!(f, "invalid sol: '{}'", s),
            ParseClockError::InvalidMillisol(s) => write!(f, "invalid millisol: '{}'", s),
        }
    }
}

impl std::error::Error for ParseClockError {}

impl FromStr for MarsClock {
    type Err = ParseClockError;

    /// Parses a clock from a string like "sol_3.msol_421.500".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sol_part, msol_part) = s
            .split_once(".msol_")
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?;

        let sol = sol_part
            .strip_prefix("sol_")
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?
            .parse::<u32>()
            .map_err(|_| ParseClockError::InvalidSol(sol_part.to_string()))?;

        let millisol = msol_part
            .parse::<f64>()
            .map_err(|_| ParseClockError::InvalidMillisol(msol_part.to_string()))?;
        if !(0.0..MILLISOLS_PER_SOL).contains(&millisol) {
            return Err(ParseClockError::InvalidMillisol(msol_part.to_string()));
        }

        Ok(MarsClock { sol, millisol })
    }
}

// Custom serialization for MarsClock - serialize as a string
impl Serialize for MarsClock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MarsClock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
