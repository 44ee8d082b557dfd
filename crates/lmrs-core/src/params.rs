//! Named behavioral parameters with declared bounds.
//!
//! # Design
//!
//! Every parameter the engine reads is a variant of the closed [`Param`]
//! enum.  Each variant has a static [`ParameterType`] declaring its external
//! name, default value, and admissible [`Bound`].  A [`ParameterSet`] stores
//! one optional value per variant in a fixed array indexed by
//! `Param::index()`, so lookups are branch-free and the set is `Copy`-cheap
//! to clone per GTU.
//!
//! Bounds are enforced by [`ParameterSet::set`]; an out-of-bounds value is a
//! configuration-time error and never reaches the planner.  Cross-parameter
//! consistency (ordered desire thresholds, `TMIN <= T0`) is checked by
//! [`ParameterSet::validate`].
//!
//! | Name             | Default | Unit | Meaning                                       |
//! |------------------|---------|------|-----------------------------------------------|
//! | `T0`             | 1.2     | s    | desired time headway                          |
//! | `TMIN`           | 0.56    | s    | minimum time headway (task demand, LC gaps)   |
//! | `LOOKAHEAD`      | 295     | m    | anticipation distance x0                      |
//! | `BCRIT`          | 3.5     | m/s² | critical deceleration                         |
//! | `VCONG`          | 16.67   | m/s  | congestion speed threshold                    |
//! | `SOCIO`          | 0.5     | –    | social (courtesy) weight                      |
//! | `A`              | 1.25    | m/s² | maximum acceleration                          |
//! | `B`              | 2.09    | m/s² | comfortable deceleration                      |
//! | `BMAX`           | 8.0     | m/s² | maximum vehicle deceleration                  |
//! | `S0`             | 3.0     | m    | stopping distance                             |
//! | `S0_CONF`        | 1.5     | m    | stopping distance at conflicts                |
//! | `VGAIN`          | 19.33   | m/s  | speed gain giving full voluntary desire       |
//! | `VMAX`           | 50.0    | m/s  | maximum vehicle speed                         |
//! | `DFREE`          | 0.365   | –    | free lane change threshold                    |
//! | `DSYNC`          | 0.577   | –    | synchronization threshold                     |
//! | `DCOOP`          | 0.8     | –    | cooperation threshold                         |
//! | `FSPEED`         | 1.0     | –    | speed limit adherence factor                  |
//! | `DELTA`          | 4.0     | –    | free-road acceleration exponent               |
//! | `LCDUR`          | 3.0     | s    | lane change duration                          |
//! | `CONFLICT_GAP`   | 1.0     | s    | minimum accepted gap at conflicts             |
//! | `TIME_FACTOR`    | 1.25    | –    | safety factor on conflict time estimates      |
//! | `T_IND`          | 3.0     | s    | indicator anticipation time for conflicts     |
//! | `TD_SUPPRESSION` | 0.5     | –    | task-load scaling of the lane change threshold|
//! | `STOP_AREA`      | 4.0     | m    | stop line area at stop and all-stop conflicts |

use std::fmt;

use crate::{ParameterError, ParameterResult};

// ── Bound ─────────────────────────────────────────────────────────────────────

/// Admissible range of a parameter value.  Non-finite values never pass.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    /// `v > 0`
    Positive,
    /// `v >= 0`
    NonNegative,
    /// `0 <= v <= 1`
    UnitInterval,
    /// `lo < v < hi`
    Exclusive(f64, f64),
}

impl Bound {
    pub fn admits(self, v: f64) -> bool {
        if !v.is_finite() {
            return false;
        }
        match self {
            Bound::Positive            => v > 0.0,
            Bound::NonNegative         => v >= 0.0,
            Bound::UnitInterval        => (0.0..=1.0).contains(&v),
            Bound::Exclusive(lo, hi)   => v > lo && v < hi,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Positive          => f.write_str("> 0"),
            Bound::NonNegative       => f.write_str(">= 0"),
            Bound::UnitInterval      => f.write_str("in [0, 1]"),
            Bound::Exclusive(lo, hi) => write!(f, "in ({lo}, {hi})"),
        }
    }
}

// ── Param ─────────────────────────────────────────────────────────────────────

/// Every behavioral parameter known to the engine.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Param {
    T0,
    Tmin,
    Lookahead,
    Bcrit,
    Vcong,
    Socio,
    A,
    B,
    Bmax,
    S0,
    S0Conf,
    Vgain,
    Vmax,
    Dfree,
    Dsync,
    Dcoop,
    Fspeed,
    Delta,
    LcDur,
    ConflictGap,
    TimeFactor,
    TInd,
    TdSuppression,
    StopArea,
}

impl Param {
    pub const COUNT: usize = 24;

    pub const ALL: [Param; Param::COUNT] = [
        Param::T0,
        Param::Tmin,
        Param::Lookahead,
        Param::Bcrit,
        Param::Vcong,
        Param::Socio,
        Param::A,
        Param::B,
        Param::Bmax,
        Param::S0,
        Param::S0Conf,
        Param::Vgain,
        Param::Vmax,
        Param::Dfree,
        Param::Dsync,
        Param::Dcoop,
        Param::Fspeed,
        Param::Delta,
        Param::LcDur,
        Param::ConflictGap,
        Param::TimeFactor,
        Param::TInd,
        Param::TdSuppression,
        Param::StopArea,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Static declaration of this parameter.
    pub fn parameter_type(self) -> ParameterType {
        use Bound::*;
        let (name, default, bound) = match self {
            Param::T0            => ("T0",             1.2,          Positive),
            Param::Tmin          => ("TMIN",           0.56,         Positive),
            Param::Lookahead     => ("LOOKAHEAD",      295.0,        Positive),
            Param::Bcrit         => ("BCRIT",          3.5,          Positive),
            Param::Vcong         => ("VCONG",          60.0 / 3.6,   NonNegative),
            Param::Socio         => ("SOCIO",          0.5,          UnitInterval),
            Param::A             => ("A",              1.25,         Positive),
            Param::B             => ("B",              2.09,         Exclusive(0.0, 8.0)),
            Param::Bmax          => ("BMAX",           8.0,          Positive),
            Param::S0            => ("S0",             3.0,          Positive),
            Param::S0Conf        => ("S0_CONF",        1.5,          Positive),
            Param::Vgain         => ("VGAIN",          69.6 / 3.6,   Positive),
            Param::Vmax          => ("VMAX",           180.0 / 3.6,  Positive),
            Param::Dfree         => ("DFREE",          0.365,        UnitInterval),
            Param::Dsync         => ("DSYNC",          0.577,        UnitInterval),
            Param::Dcoop         => ("DCOOP",          0.8,          UnitInterval),
            Param::Fspeed        => ("FSPEED",         1.0,          Positive),
            Param::Delta         => ("DELTA",          4.0,          Positive),
            Param::LcDur         => ("LCDUR",          3.0,          Positive),
            Param::ConflictGap   => ("CONFLICT_GAP",   1.0,          NonNegative),
            Param::TimeFactor    => ("TIME_FACTOR",    1.25,         Positive),
            Param::TInd          => ("T_IND",          3.0,          NonNegative),
            Param::TdSuppression => ("TD_SUPPRESSION", 0.5,          UnitInterval),
            Param::StopArea      => ("STOP_AREA",      4.0,          Positive),
        };
        ParameterType { param: self, name, default, bound }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.parameter_type().name
    }

    /// Look up a parameter by its external name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Param> {
        let name = name.trim();
        Param::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── ParameterType ─────────────────────────────────────────────────────────────

/// Declaration of one parameter: external name, default, and bound.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ParameterType {
    pub param:   Param,
    pub name:    &'static str,
    pub default: f64,
    pub bound:   Bound,
}

impl ParameterType {
    /// Check `value` against the declared bound.
    pub fn check(&self, value: f64) -> ParameterResult<f64> {
        if self.bound.admits(value) {
            Ok(value)
        } else {
            Err(ParameterError::OutOfBounds { name: self.name, value, bound: self.bound })
        }
    }
}

// ── ParameterSet ──────────────────────────────────────────────────────────────

/// One value (or none) per [`Param`], validated on insertion.
#[derive(Clone, PartialEq, Debug)]
pub struct ParameterSet {
    values: [Option<f64>; Param::COUNT],
}

impl ParameterSet {
    /// A set with no values.  Reads fail with [`ParameterError::Missing`]
    /// until values are set.
    pub fn empty() -> Self {
        Self { values: [None; Param::COUNT] }
    }

    /// A set holding every parameter's declared default.
    pub fn defaults() -> Self {
        let mut values = [None; Param::COUNT];
        for p in Param::ALL {
            values[p.index()] = Some(p.parameter_type().default);
        }
        Self { values }
    }

    /// Read a parameter.
    #[inline]
    pub fn get(&self, param: Param) -> ParameterResult<f64> {
        self.values[param.index()].ok_or(ParameterError::Missing(param.name()))
    }

    /// Read a parameter, or `None` if unset.
    #[inline]
    pub fn get_opt(&self, param: Param) -> Option<f64> {
        self.values[param.index()]
    }

    #[inline]
    pub fn contains(&self, param: Param) -> bool {
        self.values[param.index()].is_some()
    }

    /// Set a parameter after checking its declared bound.
    pub fn set(&mut self, param: Param, value: f64) -> ParameterResult<()> {
        let value = param.parameter_type().check(value)?;
        self.values[param.index()] = Some(value);
        Ok(())
    }

    /// Builder-style [`set`][Self::set].
    pub fn with(mut self, param: Param, value: f64) -> ParameterResult<Self> {
        self.set(param, value)?;
        Ok(self)
    }

    /// Set a parameter by its external name, e.g. from a configuration file.
    pub fn set_by_name(&mut self, name: &str, value: f64) -> ParameterResult<()> {
        let param = Param::from_name(name).ok_or_else(|| ParameterError::Unknown(name.to_string()))?;
        self.set(param, value)
    }

    /// Remove a parameter, returning its previous value.
    pub fn unset(&mut self, param: Param) -> Option<f64> {
        self.values[param.index()].take()
    }

    /// Iterate over all set parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Param, f64)> + '_ {
        Param::ALL
            .into_iter()
            .filter_map(|p| self.values[p.index()].map(|v| (p, v)))
    }

    /// Cross-parameter consistency: `TMIN <= T0` and
    /// `DFREE <= DSYNC <= DCOOP`, each checked when all its members are set.
    pub fn validate(&self) -> ParameterResult<()> {
        if let (Some(t_min), Some(t0)) = (self.get_opt(Param::Tmin), self.get_opt(Param::T0)) {
            if t_min > t0 {
                return Err(ParameterError::Inconsistent(format!(
                    "headways must satisfy TMIN <= T0, got {t_min} / {t0}"
                )));
            }
        }
        if let (Some(free), Some(sync), Some(coop)) = (
            self.get_opt(Param::Dfree),
            self.get_opt(Param::Dsync),
            self.get_opt(Param::Dcoop),
        ) {
            if !(free <= sync && sync <= coop) {
                return Err(ParameterError::Inconsistent(format!(
                    "desire thresholds must satisfy DFREE <= DSYNC <= DCOOP, got {free} / {sync} / {coop}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::defaults()
    }
}
