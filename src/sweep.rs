
// Frequency sweeps with the internal reference oscillator.
//
// The SR830 has no "settled" flag, so each step waits a fixed time after changing the frequency
// before it samples. That wait follows the time constant (five time constants for 12 dB/oct) and
// is part of the plan.

use std::thread;
use std::time::Duration;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::devices::sr830::{Snapshot, Sr830};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::utils::{self, LinearFit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyPlan {
    List { values: Vec<f64> },
    // start, start + step, ... up to but not including stop
    Linear { start: f64, stop: f64, step: f64 },
    // Geometric spacing, both ends included
    Log { start: f64, stop: f64, points: usize },
}

impl Default for FrequencyPlan {
    fn default() -> Self {
        FrequencyPlan::List {
            values: vec![1000.0, 2500.0, 5000.0, 7500.0, 10000.0, 25000.0, 50000.0, 75000.0, 100000.0],
        }
    }
}

// Upper bound on the frequencies a single plan may produce
pub const MAX_POINTS: usize = 100_000;

fn plan_err(msg: &str) -> Error { Error::Config(format!("Invalid frequency plan: {}", msg)) }

impl FrequencyPlan {
    pub fn frequencies(&self) -> Result<Vec<f64>> {
        match *self {
            FrequencyPlan::List { ref values } => {
                if values.is_empty() {
                    return Err(plan_err("the frequency list is empty"));
                }
                if values.len() > MAX_POINTS {
                    return Err(plan_err("too many frequencies"));
                }
                Ok(values.clone())
            }
            FrequencyPlan::Linear { start, stop, step } => {
                if !(start > 0.0 && stop > start) {
                    return Err(plan_err("linear sweeps need 0 < start < stop"));
                }
                if !(step > 0.0) {
                    return Err(plan_err("linear sweeps need a positive step"));
                }
                let steps = ((stop - start) / step).floor();
                if steps < 1.0 {
                    return Err(plan_err("the step is larger than the span"));
                }
                if steps > MAX_POINTS as f64 {
                    return Err(plan_err("the step is too small for the span"));
                }
                let steps = steps as usize;
                Ok((0..steps).map(|i| start + i as f64 * step).collect())
            }
            FrequencyPlan::Log { start, stop, points } => {
                if !(start > 0.0 && stop > start) {
                    return Err(plan_err("log sweeps need 0 < start < stop"));
                }
                if points < 2 {
                    return Err(plan_err("log sweeps need at least two points"));
                }
                if points > MAX_POINTS {
                    return Err(plan_err("too many points"));
                }
                let ratio = stop / start;
                let last = (points - 1) as f64;
                Ok((0..points)
                    .map(|i| if i == points - 1 { stop } else { start * ratio.powf(i as f64 / last) })
                    .collect())
            }
        }
    }
}

/// What a sweep does at each frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub frequencies: Vec<f64>,
    pub amplitude_v: f64,
    pub settle: Duration,
    pub auto_phase: bool,
}

/// Wait for `multiple` time constants.
pub fn settle_for(time_constant_s: f64, multiple: f64) -> Result<Duration> {
    let secs = time_constant_s * multiple;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("Settling time of {} s is not usable: {}", secs, e)))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub frequency_hz: f64,
    pub snapshot: Snapshot,
    pub capacitance_pf: f64,
    pub impedance_ohm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub amplitude_v: f64,
    pub points: Vec<SweepPoint>,
}

impl Sweep {
    /// `(frequency, capacitance, phase)` per point, in sweep order.
    pub fn rows(&self) -> Vec<(f64, f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency_hz, p.capacitance_pf, p.snapshot.phi))
            .collect()
    }

    pub fn fit_capacitance(&self) -> std::result::Result<LinearFit, &'static str> {
        utils::fit_capacitance_pf(
            self.points.iter().map(|p| (p.frequency_hz, p.snapshot.r)),
            self.amplitude_v,
        )
    }
}

pub fn run<T: Transport>(lockin: &mut Sr830<T>, plan: &SweepPlan) -> Result<Sweep> {
    lockin.set_sine_output_level(plan.amplitude_v)?;
    info!(
        "Sweeping {} frequencies at {} V, settling {:?} per step",
        plan.frequencies.len(),
        plan.amplitude_v,
        plan.settle
    );

    let mut points = Vec::with_capacity(plan.frequencies.len());
    for (i, &frequency_hz) in plan.frequencies.iter().enumerate() {
        lockin.set_reference_frequency(frequency_hz)?;
        if plan.auto_phase {
            lockin.auto_phase()?;
        }

        if !plan.settle.is_zero() {
            thread::sleep(plan.settle);
        }

        let snapshot = lockin.read_snapshot()?;
        let point = SweepPoint {
            frequency_hz,
            snapshot,
            capacitance_pf: utils::capacitance_pf(snapshot.r, frequency_hz, plan.amplitude_v),
            impedance_ohm: utils::impedance_ohm(snapshot.r, plan.amplitude_v),
        };

        debug!("{:?}", point);
        info!(
            "[{}/{}] {} Hz: R = {:e}, phase = {:.2} deg, C = {:.3} pF",
            i + 1,
            plan.frequencies.len(),
            frequency_hz,
            snapshot.r,
            snapshot.phi,
            point.capacitance_pf
        );
        points.push(point);
    }

    Ok(Sweep { amplitude_v: plan.amplitude_v, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::sr830::commands::Interface;
    use crate::transport::MockTransport;

    #[test]
    fn linear_plan_excludes_stop() {
        let plan = FrequencyPlan::Linear { start: 100.0, stop: 100000.0, step: 1000.0 };
        let f = plan.frequencies().unwrap();
        assert_eq!(f.len(), 99);
        assert_eq!(f[0], 100.0);
        assert_eq!(f[98], 98100.0);
    }

    #[test]
    fn log_plan_includes_both_ends() {
        let plan = FrequencyPlan::Log { start: 100.0, stop: 100000.0, points: 4 };
        let f = plan.frequencies().unwrap();
        assert_eq!(f.len(), 4);
        assert_eq!(f[0], 100.0);
        assert!((f[1] - 1000.0).abs() < 1e-6);
        assert!((f[2] - 10000.0).abs() < 1e-6);
        assert_eq!(f[3], 100000.0);
    }

    #[test]
    fn bad_plans_are_configuration_errors() {
        let bad = [
            FrequencyPlan::List { values: vec![] },
            FrequencyPlan::Linear { start: 1000.0, stop: 100.0, step: 10.0 },
            FrequencyPlan::Linear { start: 100.0, stop: 1000.0, step: 0.0 },
            FrequencyPlan::Linear { start: 100.0, stop: 200.0, step: 500.0 },
            FrequencyPlan::Log { start: 0.0, stop: 1000.0, points: 5 },
            FrequencyPlan::Log { start: 10.0, stop: 1000.0, points: 1 },
        ];
        for plan in bad.iter() {
            assert!(matches!(plan.frequencies(), Err(Error::Config(_))), "{:?} was accepted", plan);
        }
    }

    #[test]
    fn settling_follows_the_time_constant() {
        assert_eq!(settle_for(0.3, 5.0).unwrap(), Duration::from_millis(1500));
        assert!(settle_for(-1.0, 5.0).is_err());
        assert!(settle_for(f64::NAN, 5.0).is_err());
        assert!(matches!(settle_for(0.3, 1e30), Err(Error::Config(_))));
        assert!(matches!(settle_for(0.3, f64::INFINITY), Err(Error::Config(_))));
    }

    #[test]
    fn oversized_plans_are_refused_before_allocating() {
        let tiny_step = FrequencyPlan::Linear { start: 100.0, stop: 100000.0, step: 1e-12 };
        assert!(matches!(tiny_step.frequencies(), Err(Error::Config(_))));

        let unbounded = FrequencyPlan::Linear { start: 100.0, stop: f64::INFINITY, step: 1.0 };
        assert!(matches!(unbounded.frequencies(), Err(Error::Config(_))));

        let many_points = FrequencyPlan::Log { start: 100.0, stop: 100000.0, points: usize::MAX };
        assert!(matches!(many_points.frequencies(), Err(Error::Config(_))));

        let at_limit = FrequencyPlan::Log { start: 100.0, stop: 100000.0, points: MAX_POINTS };
        assert_eq!(at_limit.frequencies().unwrap().len(), MAX_POINTS);
    }

    #[test]
    fn sweep_sets_each_frequency_then_samples() {
        let mock = MockTransport::with_responses(vec!["0,0,0.05,-89.5", "0,0,0.1,-89.7"]);
        let mut lockin = Sr830::new(mock);
        lockin.connect("COM3", Interface::Rs232).unwrap();
        lockin.transport_mut().commands.clear();

        let plan = SweepPlan {
            frequencies: vec![1000.0, 2000.0],
            amplitude_v: 0.004,
            settle: Duration::ZERO,
            auto_phase: true,
        };
        let sweep = run(&mut lockin, &plan).unwrap();

        assert_eq!(lockin.transport().commands, vec![
            "SLVL 0.004",
            "FREQ 1000", "APHS", "SNAP? 1,2,3,4",
            "FREQ 2000", "APHS", "SNAP? 1,2,3,4",
        ]);

        let rows = sweep.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1000.0);
        assert!((rows[0].1 - 1.989e9).abs() < 1e6);
        assert_eq!(rows[1].2, -89.7);
        assert_eq!(sweep.points[0].impedance_ohm, Some(0.08));
    }

    #[test]
    fn out_of_range_frequency_aborts_the_sweep() {
        let mut lockin = Sr830::new(MockTransport::with_responses(vec!["0,0,1e-6,0"]));
        lockin.connect("COM3", Interface::Rs232).unwrap();

        let plan = SweepPlan {
            frequencies: vec![1000.0, 200000.0],
            amplitude_v: 0.004,
            settle: Duration::ZERO,
            auto_phase: false,
        };
        assert!(matches!(run(&mut lockin, &plan), Err(Error::OutOfRange { .. })));
    }
}
