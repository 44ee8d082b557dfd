//! Kinematic time estimates and gap acceptance at conflicts.

use lmrs_perception::{ConflictKind, PerceivedConflict, PerceivedGtu};

/// Time to cover `distance` from `speed` under constant `acceleration`,
/// with speed capped at `v_max`.  Zero for non-positive distances; infinite
/// if the distance is never covered (standing still, or stopping short).
pub fn time_to_cover(distance: f64, speed: f64, acceleration: f64, v_max: f64) -> f64 {
    if distance <= 0.0 {
        return 0.0;
    }
    let v = speed.max(0.0);
    if acceleration > 0.0 && v < v_max {
        let t_cap = (v_max - v) / acceleration;
        let d_cap = v * t_cap + 0.5 * acceleration * t_cap * t_cap;
        if distance <= d_cap {
            return (-v + (v * v + 2.0 * acceleration * distance).sqrt()) / acceleration;
        }
        return t_cap + (distance - d_cap) / v_max;
    }
    if acceleration < 0.0 {
        let disc = v * v + 2.0 * acceleration * distance;
        if disc < 0.0 {
            return f64::INFINITY;
        }
        return (v - disc.sqrt()) / -acceleration;
    }
    if v > 0.0 { distance / v } else { f64::INFINITY }
}

/// Time until a conflicting GTU reaches the conflict at constant speed.
#[inline]
pub fn time_to_enter(gtu: &PerceivedGtu) -> f64 {
    time_to_cover(gtu.distance, gtu.speed, 0.0, f64::INFINITY)
}

/// Conflicting GTUs that matter for gap acceptance: the perceived upstream
/// GTUs, or a virtual one at the visibility limit driving the conflicting
/// speed limit when none is seen.
pub fn conflicting_stream(conflict: &PerceivedConflict) -> Vec<PerceivedGtu> {
    if !conflict.upstream.is_empty() {
        return conflict.upstream.clone();
    }
    match conflict.visibility {
        Some(visibility) => vec![PerceivedGtu::new(
            lmrs_core::GtuId::INVALID,
            visibility,
            conflict.conflicting_speed_limit,
        )],
        None => Vec::new(),
    }
}

/// Priority approach: every conflicting GTU is at least `gap` seconds away.
pub fn priority_gap_available(conflict: &PerceivedConflict, gap: f64) -> bool {
    conflict.upstream.iter().all(|g| time_to_enter(g) >= gap)
}

/// Inputs for give-way gap acceptance.
#[derive(Copy, Clone, Debug)]
pub struct GiveWay {
    /// Time the ego needs to clear the conflict including its own length.
    pub clear_time:        f64,
    pub time_factor:       f64,
    pub gap:               f64,
    pub stopping_distance: f64,
}

/// Give-way approach: the ego clears the conflict, scaled by the time
/// factor, plus the gap, before any conflicting GTU enters it.  On merges
/// the conflicting GTU additionally needs its stopping distance behind the
/// ego.
pub fn give_way_gap_accepted(conflict: &PerceivedConflict, give_way: GiveWay) -> bool {
    if conflict.kind == ConflictKind::Split {
        return true;
    }
    conflicting_stream(conflict).iter().all(|g| {
        if g.speed <= 0.0 {
            return true;
        }
        let extra = match conflict.kind {
            ConflictKind::Merge => give_way.stopping_distance / g.speed,
            _ => 0.0,
        };
        give_way.time_factor * give_way.clear_time + give_way.gap + extra < time_to_enter(g)
    })
}
