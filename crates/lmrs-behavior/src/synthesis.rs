//! Combining incentive desires into one lane-change desire.
//!
//! Mandatory incentives combine per side by largest magnitude; voluntary
//! incentives are summed on top:
//!
//!   left  = mandatory.left  + Σ voluntary.left
//!   right = mandatory.right + Σ voluntary.right
//!
//! and each side is clamped at 1.  With mandatory dominance enabled, the
//! voluntary sum on a side is scaled by θ: 1 while the mandatory desire is
//! at most DSYNC or agrees in sign, falling linearly to 0 at DCOOP when it
//! opposes.

use lmrs_core::{LateralDirection, Param, ParameterResult, ParameterSet};
use tracing::warn;

use crate::{Desire, Incentive, IncentiveContext};

/// Result of one synthesis pass.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Synthesis {
    pub desire:        Desire,
    pub mandatory:     Desire,
    pub voluntary:     Desire,
    /// Each incentive's own desire, in evaluation order.
    pub contributions: Vec<(Incentive, Desire)>,
}

/// Evaluates a fixed list of incentives and combines their desires.
#[derive(Clone, Debug)]
pub struct DesireSynthesizer {
    mandatory:           Vec<Incentive>,
    voluntary:           Vec<Incentive>,
    mandatory_dominance: bool,
}

impl DesireSynthesizer {
    /// An empty synthesizer; add incentives with [`with`][Self::with].
    pub fn new() -> Self {
        Self { mandatory: Vec::new(), voluntary: Vec::new(), mandatory_dominance: false }
    }

    /// Add an incentive to the mandatory or voluntary group by its kind.
    /// Adding the same incentive twice is a no-op.
    pub fn with(mut self, incentive: Incentive) -> Self {
        let group = if incentive.is_mandatory() { &mut self.mandatory } else { &mut self.voluntary };
        if !group.contains(&incentive) {
            group.push(incentive);
        }
        self
    }

    pub fn with_mandatory_dominance(mut self, enabled: bool) -> Self {
        self.mandatory_dominance = enabled;
        self
    }

    pub fn incentives(&self) -> impl Iterator<Item = Incentive> + '_ {
        self.mandatory.iter().chain(self.voluntary.iter()).copied()
    }

    pub fn synthesize(&self, ctx: &IncentiveContext<'_>) -> Synthesis {
        // A lane change under way is finished, whatever the incentives say.
        match ctx.snapshot.lane_change_in_progress() {
            LateralDirection::None => {}
            lat => {
                let desire = Desire::toward(lat, 1.0);
                return Synthesis { desire, mandatory: desire, ..Synthesis::default() };
            }
        }

        let mut contributions = Vec::with_capacity(self.mandatory.len() + self.voluntary.len());

        let (mut m_left, mut m_right) = (0.0f64, 0.0f64);
        for &incentive in &self.mandatory {
            let d = incentive.determine_desire(ctx, Desire::ZERO);
            if d.left().abs() > m_left.abs() {
                m_left = d.left();
            }
            if d.right().abs() > m_right.abs() {
                m_right = d.right();
            }
            contributions.push((incentive, d));
        }
        let mandatory = Desire::new(m_left, m_right);

        let (mut v_left, mut v_right) = (0.0f64, 0.0f64);
        for &incentive in &self.voluntary {
            let d = incentive.determine_desire(ctx, mandatory);
            v_left += d.left();
            v_right += d.right();
            contributions.push((incentive, d));
        }

        let (theta_left, theta_right) = if self.mandatory_dominance {
            match dominance_weights(ctx.params, mandatory, v_left, v_right) {
                Ok(weights) => weights,
                Err(e) => {
                    warn!(gtu = %ctx.snapshot.gtu(), error = %e, "mandatory dominance disabled");
                    (1.0, 1.0)
                }
            }
        } else {
            (1.0, 1.0)
        };

        Synthesis {
            desire: Desire::new(
                mandatory.left() + theta_left * v_left,
                mandatory.right() + theta_right * v_right,
            ),
            mandatory,
            voluntary: Desire::new(v_left, v_right),
            contributions,
        }
    }
}

impl Default for DesireSynthesizer {
    /// Route plus all voluntary incentives, mandatory dominance off.
    fn default() -> Self {
        Incentive::VOLUNTARY
            .into_iter()
            .fold(DesireSynthesizer::new().with(Incentive::Route), DesireSynthesizer::with)
    }
}

fn dominance_weights(
    params:    &ParameterSet,
    mandatory: Desire,
    v_left:    f64,
    v_right:   f64,
) -> ParameterResult<(f64, f64)> {
    let d_sync = params.get(Param::Dsync)?;
    let d_coop = params.get(Param::Dcoop)?;
    Ok((
        theta(mandatory.left(), v_left, d_sync, d_coop),
        theta(mandatory.right(), v_right, d_sync, d_coop),
    ))
}

/// Weight of voluntary desire `v` next to mandatory desire `m`.
pub fn theta(m: f64, v: f64, d_sync: f64, d_coop: f64) -> f64 {
    let abs = m.abs();
    if abs <= d_sync || m * v >= 0.0 {
        1.0
    } else if abs < d_coop {
        (d_coop - abs) / (d_coop - d_sync)
    } else {
        0.0
    }
}
