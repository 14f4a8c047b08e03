
// Measurement math over values already read back from the instrument

use std::f64::consts::PI;

use serde::{Serialize, Deserialize};

pub const PICOFARADS_PER_FARAD:f64 = 1e12;

// C = R / (2*pi*f*V), scaled to pF. R is the in-phase magnitude of the current through the sample
// when the sine output drives it at `amplitude_v`.
pub fn capacitance_pf(r:f64, frequency_hz:f64, amplitude_v:f64) -> f64 {
    r / (2.0 * PI * frequency_hz * amplitude_v) * PICOFARADS_PER_FARAD
}

// |Z| = V / I; there is nothing to report for an open circuit
pub fn impedance_ohm(r:f64, amplitude_v:f64) -> Option<f64> {
    if r == 0.0 { None }
    else { Some(amplitude_v / r) }
}

// Perform a 1-D least squared linear fit

#[derive(Debug, Default, Clone)]
pub struct LinearFitProblem {
    pub points: Vec<(f64, f64)>
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFitProblem {

    pub fn solve(&self) -> Result<LinearFit, &'static str> {
        let n = self.points.len() as f64;
        let xx: f64 = self.points.iter().map(|(x, _)| *x * *x).sum();
        let xy: f64 = self.points.iter().map(|(x, y)| *x * *y).sum();
        let x: f64 = self.points.iter().map(|(x, _)| *x).sum();
        let y: f64 = self.points.iter().map(|(_, y)| *y).sum();

        let denom: f64 = n*xx - x.powi(2);
        if denom == 0.0 {
            Err("Singular least squares problem")
        } else {
            let det: f64 = 1.0 / denom;
            Ok(LinearFit {
                slope:     det*( n*xy - x*y),
                intercept: det*(-x*xy + y*xx)
            })
        }
    }

}

// Fits R against 2*pi*f*V over a sweep. The slope is the capacitance, the intercept is whatever
// current flows independent of frequency (leakage, offsets).
pub fn fit_capacitance_pf<I>(points:I, amplitude_v:f64) -> Result<LinearFit, &'static str>
where I: IntoIterator<Item = (f64, f64)> {
    let problem = LinearFitProblem {
        points: points.into_iter().map(|(f, r)| (2.0 * PI * f * amplitude_v, r)).collect()
    };

    let fit = problem.solve()?;
    Ok(LinearFit { slope: fit.slope * PICOFARADS_PER_FARAD, intercept: fit.intercept })
}
