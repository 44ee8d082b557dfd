//! Per-GTU planner construction with sampled driver parameters.

use lmrs_behavior::{CarFollowingModel, DesireSynthesizer, IdmPlus};
use lmrs_core::{GtuId, GtuRng, Param, ParameterSet};

use crate::{PlannerConfig, TacticalPlanner, TacticalResult};

/// Mean of the sampled speed-limit adherence factor.
pub const FSPEED_MEAN: f64 = 123.7 / 120.0;

/// Standard deviation of the sampled speed-limit adherence factor.
pub const FSPEED_STD_DEV: f64 = 12.0 / 120.0;

/// Builds one [`TacticalPlanner`] per GTU from shared base parameters.
///
/// `FSPEED` is drawn per GTU from a normal distribution, truncated at three
/// standard deviations, using a [`GtuRng`] seeded from the run seed and the
/// GTU id.  The same seed and id always produce the same driver.
#[derive(Clone, Debug)]
pub struct PlannerFactory<C: CarFollowingModel + Clone = IdmPlus> {
    params:         ParameterSet,
    config:         PlannerConfig,
    synthesizer:    DesireSynthesizer,
    model:          C,
    seed:           u64,
    fspeed_mean:    f64,
    fspeed_std_dev: f64,
}

impl PlannerFactory<IdmPlus> {
    pub fn new(params: ParameterSet, seed: u64) -> TacticalResult<Self> {
        Self::with_model(params, seed, IdmPlus)
    }
}

impl<C: CarFollowingModel + Clone> PlannerFactory<C> {
    pub fn with_model(params: ParameterSet, seed: u64, model: C) -> TacticalResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            config: PlannerConfig::default(),
            synthesizer: DesireSynthesizer::default(),
            model,
            seed,
            fspeed_mean: FSPEED_MEAN,
            fspeed_std_dev: FSPEED_STD_DEV,
        })
    }

    pub fn config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn synthesizer(mut self, synthesizer: DesireSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Distribution of `FSPEED`; a zero deviation disables sampling.
    pub fn fspeed(mut self, mean: f64, std_dev: f64) -> Self {
        self.fspeed_mean = mean;
        self.fspeed_std_dev = std_dev.abs();
        self
    }

    /// Driver parameters for `gtu`.
    pub fn parameters(&self, gtu: GtuId) -> TacticalResult<ParameterSet> {
        let mut rng = GtuRng::new(self.seed, gtu);
        let (mean, sd) = (self.fspeed_mean, self.fspeed_std_dev);
        let fspeed = rng.gen_normal(mean, sd).clamp(mean - 3.0 * sd, mean + 3.0 * sd);
        Ok(self.params.clone().with(Param::Fspeed, fspeed)?)
    }

    pub fn create(&self, gtu: GtuId) -> TacticalResult<TacticalPlanner<C>> {
        let planner = TacticalPlanner::with_model(gtu, self.parameters(gtu)?, self.model.clone())?
            .with_synthesizer(self.synthesizer.clone())
            .with_config(self.config);
        Ok(planner)
    }
}
