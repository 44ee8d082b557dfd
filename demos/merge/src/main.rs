//! merge — an on-ramp scenario for the lmrs tactical planner.
//!
//! Main-road traffic on two lanes meets ramp traffic at a merge conflict.
//! Ramp drivers give way; main-road drivers in the right lane have priority
//! and move left when the speed gain is worth it.  Every epoch each GTU gets
//! one plan from its own planner, all against the same epoch-start world.
//!
//! Set `RUST_LOG=debug` to see conflict decisions and lane changes.

mod world;

use std::io::Cursor;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lmrs_core::SimTime;
use lmrs_tactical::{load_parameters_reader, plan_all, PlanContext, PlannerConfig, PlannerFactory, TacticalError};

use world::{Vehicle, World, LEFT, MAIN_LIMIT, RAMP, RAMP_LIMIT, RIGHT};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:        u64 = 42;
const EPOCH_SECS:  f64 = 0.5;
const SIM_SECS:    f64 = 120.0;
const REPORT_SECS: f64 = 10.0;

// ── Parameters ────────────────────────────────────────────────────────────────

// Slightly more assertive drivers than the defaults.
const PARAMETERS_CSV: &str = "\
name,value\n\
T0,1.1\n\
SOCIO,0.4\n\
TIME_FACTOR,1.2\n\
";

// ── Scenario ──────────────────────────────────────────────────────────────────

fn initial_world() -> World {
    let mut vehicles = Vec::new();
    let mut id = 0;
    for k in 0..8 {
        vehicles.push(Vehicle::new(id, RIGHT, 350.0 - 45.0 * k as f64, MAIN_LIMIT * 0.9));
        id += 1;
    }
    for k in 0..4 {
        vehicles.push(Vehicle::new(id, LEFT, 300.0 - 70.0 * k as f64, MAIN_LIMIT));
        id += 1;
    }
    for k in 0..5 {
        vehicles.push(Vehicle::new(id, RAMP, 300.0 - 40.0 * k as f64, RAMP_LIMIT * 0.8));
        id += 1;
    }
    World { vehicles }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = load_parameters_reader(Cursor::new(PARAMETERS_CSV))?;
    let config = PlannerConfig { replanning_interval: EPOCH_SECS, ..PlannerConfig::default() };
    let factory = PlannerFactory::new(params, SEED)?.config(config);

    let mut world = initial_world();
    let mut planners = world
        .vehicles
        .iter()
        .map(|v| factory.create(v.id))
        .collect::<Result<Vec<_>, TacticalError>>()?;
    info!(gtus = planners.len(), "scenario ready");

    let mut ctx = PlanContext::new();
    let mut time = SimTime::ZERO;
    let mut next_report = 0.0;

    while time.secs() < SIM_SECS && !planners.is_empty() {
        planners.retain(|p| world.vehicles.iter().any(|v| v.id == p.gtu()));
        let requests: Vec<_> = planners
            .iter()
            .filter_map(|p| {
                let vehicle = world.vehicles.iter().find(|v| v.id == p.gtu())?;
                Some(p.request(time, vehicle.location()))
            })
            .collect();

        let results = plan_all(&mut planners, &requests, &world, &mut ctx)?;

        let mut plans = Vec::with_capacity(results.len());
        for (gtu, result) in results {
            match result {
                Ok(plan) => plans.push(plan),
                Err(e) if e.is_structural() => {
                    info!(%gtu, %time, "left the network");
                    world.remove(gtu);
                    planners.retain(|p| p.gtu() != gtu);
                }
                Err(e) => warn!(%gtu, error = %e, "planning failed"),
            }
        }
        world.apply(&plans, EPOCH_SECS);

        if time.secs() >= next_report {
            let blocking = planners.iter().filter(|p| p.is_blocking()).count();
            let on_ramp = world.vehicles.iter().filter(|v| v.lane == RAMP).count();
            let mean_speed = if world.vehicles.is_empty() {
                0.0
            } else {
                world.vehicles.iter().map(|v| v.speed).sum::<f64>() / world.vehicles.len() as f64
            };
            info!(%time, gtus = world.vehicles.len(), on_ramp, blocking, mean_speed, "progress");
            next_report += REPORT_SECS;
        }
        time = time + EPOCH_SECS;
    }

    let c = ctx.counters();
    info!(
        plans = c.plans,
        lane_changes = c.lane_changes,
        synchronizations = c.synchronizations,
        yields = c.yields,
        fallbacks = c.fallbacks,
        removed = c.structural_failures,
        "done"
    );
    Ok(())
}
