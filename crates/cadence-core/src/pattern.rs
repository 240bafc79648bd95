//! Cadence patterns and the shared phase counter.
//!
//! A cadence is a 32-bit lookup table: bit `i` of the pattern says whether an
//! indicator is lit during phase `i` of a repeating 32-phase cycle. The phase
//! advances once per scheduler tick, so at the default 125 ms tick a full
//! cycle lasts four seconds.
//!
//! # Example
//!
//! ```
//! use cadence_core::{CadencePattern, CadencePhase};
//!
//! let heartbeat = CadencePattern::HEARTBEAT;
//! let lit: Vec<bool> = CadencePhase::all().take(4).map(|p| heartbeat.is_active_at(p)).collect();
//! assert_eq!(lit, vec![false, true, false, true]);
//!
//! assert_eq!("BlinkFast".parse::<CadencePattern>().unwrap(), CadencePattern::BLINK_FAST);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::CadenceError;

/// Number of phases in one cadence cycle.
pub const PHASE_COUNT: u32 = 32;

/// A 32-bit blink pattern.
///
/// Named patterns are provided as associated constants; any other mask is a
/// valid pattern too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct CadencePattern(u32);

impl CadencePattern {
    /// Permanently off.
    pub const STEADY_OFF: Self = Self(0x0000_0000);
    /// Permanently on.
    pub const STEADY_ON: Self = Self(0xFFFF_FFFF);
    /// Fast blink, heightened but non-critical alert.
    pub const BLINK_FAST: Self = Self(0xF0F0_F0F0);
    /// Slow blink, non-critical persistent condition.
    pub const BLINK_SLOW: Self = Self(0xFF00_FF00);
    /// Very fast blink, urgent condition requiring intervention.
    pub const BLINK_ALARM: Self = Self(0xAAAA_AAAA);
    /// Mostly off with one short blip per cycle.
    pub const STROBE: Self = Self(0x0000_0001);
    /// Mostly on with one short wink off per cycle.
    pub const WINK: Self = Self(0xFFFF_FFFE);
    /// One short pulse per cycle.
    pub const PULSE1: Self = Self(0x0000_0003);
    /// Two short pulses per cycle.
    pub const PULSE2: Self = Self(0x0000_0033);
    /// Three short pulses per cycle.
    pub const PULSE3: Self = Self(0x0000_0333);
    /// Four short pulses per cycle.
    pub const PULSE4: Self = Self(0x0000_3333);
    /// A double pulse, like a heart beat.
    pub const HEARTBEAT: Self = Self(0x0000_000A);
    /// A syncopated heart beat.
    pub const OFFBEAT: Self = Self(0x000A_0000);

    /// Every named pattern with its display name.
    pub const NAMED: [(&'static str, CadencePattern); 13] = [
        ("SteadyOff", Self::STEADY_OFF),
        ("SteadyOn", Self::STEADY_ON),
        ("BlinkFast", Self::BLINK_FAST),
        ("BlinkSlow", Self::BLINK_SLOW),
        ("BlinkAlarm", Self::BLINK_ALARM),
        ("Strobe", Self::STROBE),
        ("Wink", Self::WINK),
        ("Pulse1", Self::PULSE1),
        ("Pulse2", Self::PULSE2),
        ("Pulse3", Self::PULSE3),
        ("Pulse4", Self::PULSE4),
        ("Heartbeat", Self::HEARTBEAT),
        ("Offbeat", Self::OFFBEAT),
    ];

    /// Create a pattern from a raw bit mask.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bit mask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the pattern is lit at the given phase: `(bits >> phase) & 1`.
    #[inline]
    pub const fn is_active_at(self, phase: CadencePhase) -> bool {
        (self.0 >> phase.0) & 1 == 1
    }

    /// The name of this pattern, if it is one of the named patterns.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, pattern)| *pattern == self)
            .map(|(name, _)| *name)
    }

    /// Number of lit phases per cycle.
    pub const fn duty(self) -> u32 {
        self.0.count_ones()
    }
}

impl From<u32> for CadencePattern {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<CadencePattern> for u32 {
    fn from(pattern: CadencePattern) -> Self {
        pattern.0
    }
}

impl fmt::Display for CadencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl FromStr for CadencePattern {
    type Err = CadenceError;

    /// Parse a pattern name (case-insensitive) or a `0x`-prefixed hex mask.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((_, pattern)) = Self::NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*pattern);
        }

        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CadenceError::InvalidPattern(s.to_string()))?;
        let hex = hex.replace('_', "");
        // `from_str_radix` would also take a leading sign.
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CadenceError::InvalidPattern(s.to_string()));
        }
        u32::from_str_radix(&hex, 16)
            .map(Self)
            .map_err(|_| CadenceError::InvalidPattern(s.to_string()))
    }
}

impl TryFrom<String> for CadencePattern {
    type Error = CadenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CadencePattern> for String {
    fn from(pattern: CadencePattern) -> Self {
        pattern.to_string()
    }
}

/// Position within the 32-phase cadence cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CadencePhase(u32);

impl CadencePhase {
    /// The first phase of the cycle.
    pub const ZERO: Self = Self(0);

    /// Create a phase, rejecting values outside `0..32`.
    pub fn new(value: u32) -> Result<Self, CadenceError> {
        if value < PHASE_COUNT {
            Ok(Self(value))
        } else {
            Err(CadenceError::InvalidPhase(value))
        }
    }

    /// The phase index.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// The following phase, wrapping from 31 back to 0.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1) % PHASE_COUNT)
    }

    /// Iterate over all 32 phases in order, starting at zero.
    pub fn all() -> impl Iterator<Item = CadencePhase> {
        (0..PHASE_COUNT).map(Self)
    }
}

impl fmt::Display for CadencePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
