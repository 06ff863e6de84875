//! Stand-in engine for integration tests.
//!
//! Speaks the stdin/stdout contract of the real engines: reads a
//! configuration until stdin closes, then prints one whitespace-separated
//! frame per line. Frames are synthesized deterministically so tests can
//! assert exact values. Environment variables select misbehavior:
//!
//! - `FAKE_ENGINE_SCRIPT`: emit the lines of this file verbatim instead of
//!   synthesizing frames.
//! - `FAKE_ENGINE_FAMILY`: `orbital2d`, `orbital3d`, `projectile` or `decay`;
//!   inferred from the configuration shape when unset.
//! - `FAKE_ENGINE_FRAMES`: orbital frame count, default 64.
//! - `FAKE_ENGINE_LINE_DELAY_MS`: sleep between lines.
//! - `FAKE_ENGINE_GARBAGE_AFTER`: replace a token of frame N with junk.
//! - `FAKE_ENGINE_TRUNCATE_AFTER`: drop a token from frame N.
//! - `FAKE_ENGINE_HANG_AFTER`: emit N frames, then sleep forever.
//! - `FAKE_ENGINE_EXIT_AFTER`: emit N frames, then exit silently.

use std::env;
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

const GRAVITY: f64 = 9.81;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let faults = Faults::from_env();
    let lines = match env::var("FAKE_ENGINE_SCRIPT") {
        Ok(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::to_owned)
            .collect(),
        Err(_) => synthesize(&input)?,
    };
    emit(lines, &faults)
}

struct Faults {
    line_delay: Option<Duration>,
    garbage_after: Option<usize>,
    truncate_after: Option<usize>,
    hang_after: Option<usize>,
    exit_after: Option<usize>,
}

impl Faults {
    fn from_env() -> Self {
        Self {
            line_delay: env_number("FAKE_ENGINE_LINE_DELAY_MS").map(Duration::from_millis),
            garbage_after: env_number("FAKE_ENGINE_GARBAGE_AFTER").map(|n| n as usize),
            truncate_after: env_number("FAKE_ENGINE_TRUNCATE_AFTER").map(|n| n as usize),
            hang_after: env_number("FAKE_ENGINE_HANG_AFTER").map(|n| n as usize),
            exit_after: env_number("FAKE_ENGINE_EXIT_AFTER").map(|n| n as usize),
        }
    }
}

fn env_number(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

fn emit(lines: Vec<String>, faults: &Faults) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (index, line) in lines.into_iter().enumerate() {
        if faults.exit_after == Some(index) {
            return Ok(());
        }
        if faults.hang_after == Some(index) {
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
        let line = if faults.garbage_after == Some(index) {
            poison_token(&line)
        } else if faults.truncate_after == Some(index) {
            drop_token(&line)
        } else {
            line
        };
        writeln!(out, "{line}")?;
        out.flush()?;
        if let Some(delay) = faults.line_delay {
            thread::sleep(delay);
        }
    }
    Ok(())
}

fn poison_token(line: &str) -> String {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if let Some(last) = tokens.last_mut() {
        *last = "garbage";
    }
    tokens.join(" ")
}

fn drop_token(line: &str) -> String {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.pop();
    tokens.join(" ")
}

#[derive(Clone, Copy, PartialEq)]
enum Family {
    Orbital2d,
    Orbital3d,
    Projectile,
    Decay,
}

fn synthesize(input: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let rows: Vec<Vec<f64>> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|token| token.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect::<Result<_, _>>()?;
    let Some(header) = rows.first() else {
        return Err("empty configuration".into());
    };

    let family = match family_override() {
        Some(family) => family,
        None if header.len() == 3 => Family::Decay,
        None => match rows.get(1).map(Vec::len) {
            Some(5) => Family::Orbital2d,
            Some(7) => Family::Orbital3d,
            Some(6) => Family::Projectile,
            other => return Err(format!("unrecognized record shape {other:?}").into()),
        },
    };

    match family {
        Family::Decay => Ok(decay_frames(header)),
        Family::Projectile => Ok(projectile_frames(header[0], &rows[1..])),
        Family::Orbital2d | Family::Orbital3d => Ok(orbit_frames(
            header[0],
            &rows[1..],
            family == Family::Orbital3d,
        )),
    }
}

fn family_override() -> Option<Family> {
    match env::var("FAKE_ENGINE_FAMILY").ok()?.as_str() {
        "orbital2d" => Some(Family::Orbital2d),
        "orbital3d" => Some(Family::Orbital3d),
        "projectile" => Some(Family::Projectile),
        "decay" => Some(Family::Decay),
        _ => None,
    }
}

/// Circular orbits: each body keeps its initial radius and moves at the
/// angular speed its initial velocity implies.
fn orbit_frames(dt: f64, records: &[Vec<f64>], three_d: bool) -> Vec<String> {
    let count = env_number("FAKE_ENGINE_FRAMES").unwrap_or(64) as usize;
    let dims = if three_d { 3 } else { 2 };

    struct Orbit {
        radius: f64,
        omega: f64,
        phase: f64,
        z: f64,
    }
    let orbits: Vec<Orbit> = records
        .iter()
        .map(|record| {
            let radius = record[0].hypot(record[1]);
            let speed = record[dims].hypot(record[dims + 1]);
            Orbit {
                radius,
                omega: if radius > 0.0 { speed / radius } else { 0.0 },
                phase: record[0].atan2(record[1]),
                z: if three_d { record[2] } else { 0.0 },
            }
        })
        .collect();

    (1..=count)
        .map(|step| {
            let t = step as f64 * dt;
            let mut values = Vec::with_capacity(orbits.len() * dims);
            for orbit in &orbits {
                let angle = orbit.phase + orbit.omega * t;
                values.push(orbit.radius * angle.sin());
                values.push(orbit.radius * angle.cos());
                if three_d {
                    values.push(orbit.z);
                }
            }
            format_line(&values)
        })
        .collect()
}

/// Drag-free ballistics. Landed projectiles echo their landing point until
/// every projectile is down, then the stream ends.
fn projectile_frames(dt: f64, records: &[Vec<f64>]) -> Vec<String> {
    struct Shot {
        vx: f64,
        vy: f64,
        height: f64,
        flight_time: f64,
    }
    let shots: Vec<Shot> = records
        .iter()
        .map(|record| {
            let (height, speed, angle_deg) = (record[0], record[1], record[2]);
            let angle = angle_deg.to_radians();
            let vx = speed * angle.cos();
            let vy = speed * angle.sin();
            let flight_time = (vy + (vy * vy + 2.0 * GRAVITY * height).sqrt()) / GRAVITY;
            Shot {
                vx,
                vy,
                height,
                flight_time,
            }
        })
        .collect();

    let mut lines = Vec::new();
    let mut step = 0u64;
    loop {
        step += 1;
        let t = step as f64 * dt;
        let mut values = Vec::with_capacity(shots.len() * 2);
        let mut all_down = true;
        for shot in &shots {
            if t >= shot.flight_time {
                values.push(shot.vx * shot.flight_time);
                values.push(0.0);
            } else {
                values.push(shot.vx * t);
                values.push(shot.height + shot.vy * t - 0.5 * GRAVITY * t * t);
                all_down = false;
            }
        }
        lines.push(format_line(&values));
        if all_down {
            return lines;
        }
    }
}

/// Exponential decay with guaranteed progress, one count per line down to
/// zero.
fn decay_frames(header: &[f64]) -> Vec<String> {
    let (mut remaining, rate, dt) = (header[0].max(0.0) as u64, header[1], header[2]);
    let keep = (-rate * dt).exp();

    let mut lines = Vec::new();
    while remaining > 0 {
        let mut next = (remaining as f64 * keep).floor() as u64;
        if next >= remaining {
            next = remaining - 1;
        }
        lines.push(format!("{next}"));
        remaining = next;
    }
    lines
}

fn format_line(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
