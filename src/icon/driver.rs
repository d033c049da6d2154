// Copyright 2026 BiomeQuantum Contributors
// SPDX-License-Identifier: Apache-2.0

//! Time-dependent diagonal drivers.
//!
//! A driver is a pure function of elapsed simulation time. The stochastic
//! variant draws its burst schedule from a ChaCha8 stream seeded by the
//! driver itself, so two evaluations at the same time always agree.
//! [`CachedDriver`] keeps the drawn schedule so repeated evaluation does not
//! replay the stream from `t = 0`.

use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Driver attached to an icon's self-energy.
///
/// Sinusoidal and pulse drivers with a non-positive frequency are legal and
/// hold their `t = 0` value forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Driver {
    /// Contributes nothing.
    Constant,
    /// `amplitude · cos(2π·frequency·t + phase)`
    Sinusoidal {
        frequency: f64,
        amplitude: f64,
        #[serde(default)]
        phase: f64,
    },
    /// `amplitude` during the first `duty_cycle` fraction of each period.
    Pulse {
        frequency: f64,
        amplitude: f64,
        duty_cycle: f64,
    },
    /// Bursts of `amplitude` lasting `duration`, separated by quiet
    /// intervals drawn uniformly from `[min_interval, max_interval]`.
    StochasticPulse {
        amplitude: f64,
        min_interval: f64,
        max_interval: f64,
        duration: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl Driver {
    /// Driver value at simulation time `t`.
    pub fn value(&self, t: f64) -> f64 {
        match *self {
            Driver::Constant => 0.0,
            Driver::Sinusoidal {
                frequency,
                amplitude,
                phase,
            } => {
                let t = if frequency > 0.0 { t } else { 0.0 };
                amplitude * (2.0 * PI * frequency * t + phase).cos()
            }
            Driver::Pulse {
                frequency,
                amplitude,
                duty_cycle,
            } => {
                let cycle = if frequency > 0.0 {
                    (t * frequency).rem_euclid(1.0)
                } else {
                    0.0
                };
                if cycle < duty_cycle {
                    amplitude
                } else {
                    0.0
                }
            }
            Driver::StochasticPulse {
                amplitude,
                min_interval,
                max_interval,
                duration,
                seed,
            } => {
                if t < 0.0 {
                    return 0.0;
                }
                let mut bursts = BurstSchedule::new(seed);
                bursts.extend_past(t, min_interval, max_interval, duration);
                if bursts.is_active(t) {
                    amplitude
                } else {
                    0.0
                }
            }
        }
    }

    /// Whether the value changes with time.
    pub fn is_time_dependent(&self) -> bool {
        match *self {
            Driver::Constant => false,
            Driver::Sinusoidal {
                frequency,
                amplitude,
                ..
            } => frequency > 0.0 && amplitude != 0.0,
            Driver::Pulse {
                frequency,
                amplitude,
                ..
            } => frequency > 0.0 && amplitude != 0.0,
            Driver::StochasticPulse { amplitude, .. } => amplitude != 0.0,
        }
    }

    /// Upper bound on |value(t)| over all t.
    pub fn amplitude_bound(&self) -> f64 {
        match *self {
            Driver::Constant => 0.0,
            Driver::Sinusoidal { amplitude, .. }
            | Driver::Pulse { amplitude, .. }
            | Driver::StochasticPulse { amplitude, .. } => amplitude.abs(),
        }
    }

    /// Same driver with its amplitude multiplied by `weight`.
    pub fn scaled(&self, weight: f64) -> Driver {
        let mut scaled = self.clone();
        match &mut scaled {
            Driver::Constant => {}
            Driver::Sinusoidal { amplitude, .. }
            | Driver::Pulse { amplitude, .. }
            | Driver::StochasticPulse { amplitude, .. } => *amplitude *= weight,
        }
        scaled
    }

    /// Check parameter domains.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Driver::Constant => Ok(()),
            Driver::Sinusoidal {
                frequency,
                amplitude,
                phase,
            } => {
                if !(frequency.is_finite() && amplitude.is_finite() && phase.is_finite()) {
                    return Err("sinusoidal driver parameters must be finite".into());
                }
                Ok(())
            }
            Driver::Pulse {
                frequency,
                amplitude,
                duty_cycle,
            } => {
                if !(frequency.is_finite() && amplitude.is_finite()) {
                    return Err("pulse driver parameters must be finite".into());
                }
                if !(0.0..=1.0).contains(&duty_cycle) {
                    return Err(format!("duty_cycle must be in [0, 1], got {duty_cycle}"));
                }
                Ok(())
            }
            Driver::StochasticPulse {
                amplitude,
                min_interval,
                max_interval,
                duration,
                ..
            } => {
                if !amplitude.is_finite() {
                    return Err("stochastic pulse amplitude must be finite".into());
                }
                if !(min_interval.is_finite() && max_interval.is_finite() && duration.is_finite()) {
                    return Err("stochastic pulse timing must be finite".into());
                }
                if min_interval < 0.0 || duration < 0.0 {
                    return Err("stochastic pulse intervals must be non-negative".into());
                }
                if max_interval <= 0.0 {
                    return Err(format!("max_interval must be > 0, got {max_interval}"));
                }
                if max_interval < min_interval {
                    return Err(format!(
                        "max_interval ({max_interval}) must be ≥ min_interval ({min_interval})"
                    ));
                }
                if min_interval + duration <= 0.0 {
                    return Err("min_interval + duration must be > 0".into());
                }
                Ok(())
            }
        }
    }
}

/// Bursts drawn so far from one seeded stream.
#[derive(Debug)]
struct BurstSchedule {
    rng: ChaCha8Rng,
    /// `(start, end)` of every burst, in time order
    bursts: Vec<(f64, f64)>,
}

impl BurstSchedule {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            bursts: Vec::new(),
        }
    }

    /// Draw bursts until one ends after `t`.
    fn extend_past(&mut self, t: f64, min_interval: f64, max_interval: f64, duration: f64) {
        let mut quiet_from = self.bursts.last().map_or(0.0, |&(_, end)| end);
        while quiet_from <= t {
            let start = quiet_from + self.rng.gen_range(min_interval..=max_interval);
            let end = start + duration;
            self.bursts.push((start, end));
            quiet_from = end;
        }
    }

    /// Whether `t` falls inside a burst. Requires `extend_past(t)` first.
    fn is_active(&self, t: f64) -> bool {
        let next = self.bursts.partition_point(|&(_, end)| end <= t);
        self.bursts.get(next).is_some_and(|&(start, _)| t >= start)
    }
}

/// A [`Driver`] whose stochastic burst schedule is drawn once and reused.
///
/// Evaluation agrees bit-for-bit with [`Driver::value`]. Clones share the
/// schedule.
#[derive(Debug, Clone)]
pub struct CachedDriver {
    driver: Driver,
    schedule: Option<Arc<Mutex<BurstSchedule>>>,
}

impl CachedDriver {
    pub fn new(driver: Driver) -> Self {
        let schedule = match driver {
            Driver::StochasticPulse { seed, .. } => Some(Arc::new(Mutex::new(BurstSchedule::new(seed)))),
            _ => None,
        };
        Self { driver, schedule }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn value(&self, t: f64) -> f64 {
        let Some(schedule) = &self.schedule else {
            return self.driver.value(t);
        };
        let Driver::StochasticPulse {
            amplitude,
            min_interval,
            max_interval,
            duration,
            ..
        } = self.driver
        else {
            return self.driver.value(t);
        };
        if t < 0.0 {
            return 0.0;
        }
        // The schedule is only ever appended to, so a poisoned lock still
        // holds a valid prefix.
        let mut bursts = schedule.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        bursts.extend_past(t, min_interval, max_interval, duration);
        if bursts.is_active(t) {
            amplitude
        } else {
            0.0
        }
    }

    pub fn amplitude_bound(&self) -> f64 {
        self.driver.amplitude_bound()
    }
}

impl PartialEq for CachedDriver {
    fn eq(&self, other: &Self) -> bool {
        self.driver == other.driver
    }
}
