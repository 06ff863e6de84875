//! Ready-made simulation setups matching the published front-ends.
//!
//! State vectors and masses for the solar-system bodies come from the JPL
//! Horizons ephemeris service; masses are stored in kilograms.

use crate::config::{DisplayMode, EngineFamily, ObjectInit, ObjectSpec, SimulationConfig};

/// Solar-system master list indices rendered by the inner-planet view.
const INNER_VIEW: [usize; 5] = [0, 1, 2, 3, 4];
/// Solar-system master list indices rendered by the outer-planet view.
const OUTER_VIEW: [usize; 5] = [0, 5, 6, 7, 8];

/// Time step for the inner-planet view: one minute of simulated time.
pub const INNER_TIME_STEP: f64 = 60.0;
/// Time step for the outer-planet view: thirty minutes of simulated time.
pub const OUTER_TIME_STEP: f64 = 1800.0;

fn body(
    label: &str,
    trail_length: usize,
    position: [f64; 3],
    velocity: [f64; 3],
    mass_e24_kg: f64,
) -> ObjectSpec {
    ObjectSpec::new(
        label,
        ObjectInit::Body {
            position,
            velocity,
            mass: mass_e24_kg * 1e24,
        },
    )
    .with_trail_length(trail_length)
}

/// The nine-body solar system: Sun first, then the planets in orbit order.
///
/// Trail lengths scale with orbital period so every body draws roughly one
/// full orbit; the Sun keeps no trail.
pub fn solar_system(time_step: f64) -> SimulationConfig {
    SimulationConfig::new(EngineFamily::Orbital3d, time_step)
        .with_object(body(
            "Sun",
            0,
            [-1.068e9, -4.117e8, 3.087e7],
            [9.305, -12.83, -0.1632],
            1988410.0,
        ))
        .with_object(body(
            "Mercury",
            125,
            [-2.212e10, -6.682e10, -3.462e9],
            [3.666e4, -1.230e4, -4.368e3],
            0.3302,
        ))
        .with_object(body(
            "Venus",
            325,
            [-1.086e11, -3.784e9, 6.190e9],
            [8.985e2, -3.517e4, -5.320e2],
            4.8685,
        ))
        .with_object(body(
            "Earth",
            530,
            [-2.628e10, 1.445e11, 0.0],
            [-2.983e4, -5.220e3, 0.0],
            5.97219,
        ))
        .with_object(body(
            "Mars",
            990,
            [2.069e11, -3.561e9, 0.0],
            [1.304e3, 2.628e4, 0.0],
            0.64171,
        ))
        .with_object(body(
            "Jupiter",
            215,
            [5.979e11, 4.387e11, 0.0],
            [-7.893e3, 1.12e4, 0.0],
            1898.19,
        ))
        .with_object(body(
            "Saturn",
            515,
            [9.576e11, 9.821e11, 0.0],
            [-7.420e3, 6.726e3, 0.0],
            568.34,
        ))
        .with_object(body(
            "Uranus",
            1475,
            [2.158e12, -2.055e12, 0.0],
            [4.647e3, 4.614e3, 0.0],
            86.813,
        ))
        .with_object(body(
            "Neptune",
            2890,
            [2.514e12, -3.739e12, 0.0],
            [4.475e3, 3.063e3, 0.0],
            102.409,
        ))
}

/// Sun through Mars at a one-minute step.
pub fn inner_planets() -> (SimulationConfig, DisplayMode) {
    (
        solar_system(INNER_TIME_STEP),
        DisplayMode::subset("inner", INNER_VIEW.to_vec()),
    )
}

/// Sun plus the gas and ice giants at a thirty-minute step.
pub fn outer_planets() -> (SimulationConfig, DisplayMode) {
    (
        solar_system(OUTER_TIME_STEP),
        DisplayMode::subset("outer", OUTER_VIEW.to_vec()),
    )
}

/// A drag/no-drag projectile pair sharing one launch parameter set.
///
/// Angle is in degrees. The second projectile repeats the launch with the
/// drag coefficient zeroed, so the two curves separate exactly as far as drag
/// bends the first.
pub fn projectile_pair(
    height: f64,
    speed: f64,
    angle_deg: f64,
    mass: f64,
    area: f64,
    drag_coeff: f64,
) -> SimulationConfig {
    SimulationConfig::new(EngineFamily::Projectile, 0.025)
        .with_object(ObjectSpec::new(
            "Drag",
            ObjectInit::Projectile {
                height,
                speed,
                launch_angle_deg: angle_deg,
                mass,
                area,
                drag_coeff,
            },
        ))
        .with_object(ObjectSpec::new(
            "No Drag",
            ObjectInit::Projectile {
                height,
                speed,
                launch_angle_deg: angle_deg,
                mass,
                area,
                drag_coeff: 0.0,
            },
        ))
}

/// Ground-level launch of a sphere at 15 m/s, 60 degrees.
pub fn default_projectiles() -> SimulationConfig {
    projectile_pair(0.0, 15.0, 60.0, 10.0, 0.5, 0.47)
}

/// A radioactive sample counted once per simulated second.
pub fn particle_decay(initial_count: u32, decay_rate: f64, time_step: f64) -> SimulationConfig {
    SimulationConfig::new(EngineFamily::Decay, time_step).with_object(
        ObjectSpec::new(
            "Remaining",
            ObjectInit::Population {
                initial_count,
                decay_rate,
            },
        )
        .with_trail_length(256),
    )
}

/// One hundred particles decaying at 0.3 per second.
pub fn default_decay() -> SimulationConfig {
    particle_decay(100, 0.3, 1.0)
}
