use ndarray::{s, ArrayView1, ArrayView3, Axis, Zip};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::data::model::VELOCITY_ROWS;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Alignment
// ---------------------------------------------------------------------------

/// Shift `obs` against `syn` and return the window of `obs` that correlates
/// best with it.
///
/// Only fully overlapping offsets are tried (`0..=len(obs) - len(syn)`). The
/// first offset reaching the maximum correlation wins.
pub fn align<'a>(obs: ArrayView1<'a, f64>, syn: ArrayView1<'_, f64>) -> Result<ArrayView1<'a, f64>> {
    let m = syn.len();
    if m == 0 {
        return Err(Error::EmptyTrace);
    }
    if obs.len() < m {
        return Err(Error::TraceTooShort {
            observed: obs.len(),
            synthetic: m,
        });
    }

    let start = best_offset(obs, syn);
    Ok(obs.slice_move(s![start..start + m]))
}

/// Above this many multiply-adds the correlation is computed by FFT.
const DIRECT_WORK_LIMIT: usize = 1 << 18;

fn best_offset(obs: ArrayView1<'_, f64>, syn: ArrayView1<'_, f64>) -> usize {
    let lags = obs.len() - syn.len() + 1;
    if lags.saturating_mul(syn.len()) <= DIRECT_WORK_LIMIT {
        first_argmax(&direct_correlation(obs, syn))
    } else {
        first_argmax(&fft_correlation(obs, syn))
    }
}

fn first_argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut best_corr = f64::NEG_INFINITY;
    for (offset, &corr) in values.iter().enumerate() {
        if corr > best_corr {
            best = offset;
            best_corr = corr;
        }
    }
    best
}

fn direct_correlation(obs: ArrayView1<'_, f64>, syn: ArrayView1<'_, f64>) -> Vec<f64> {
    obs.windows(syn.len())
        .into_iter()
        .map(|window| window.dot(&syn))
        .collect()
}

fn zero_padded(values: impl Iterator<Item = f64>, len: usize) -> Vec<Complex<f64>> {
    let mut out: Vec<Complex<f64>> = values.map(|v| Complex::new(v, 0.0)).collect();
    out.resize(len, Complex::new(0.0, 0.0));
    out
}

/// Valid-mode correlation through the convolution of `obs` with reversed `syn`.
fn fft_correlation(obs: ArrayView1<'_, f64>, syn: ArrayView1<'_, f64>) -> Vec<f64> {
    let (n, m) = (obs.len(), syn.len());
    let len = (n + m - 1).next_power_of_two();
    let mut a = zero_padded(obs.iter().copied(), len);
    let mut b = zero_padded(syn.iter().rev().copied(), len);

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(len);
    forward.process(&mut a);
    forward.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x = *x * *y;
    }
    planner.plan_fft_inverse(len).process(&mut a);

    let scale = 1.0 / len as f64;
    (0..=n - m).map(|k| a[k + m - 1].re * scale).collect()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Root-mean-square difference between two equally long traces.
pub fn rms(obs: ArrayView1<'_, f64>, syn: ArrayView1<'_, f64>) -> Result<f64> {
    if obs.len() != syn.len() {
        return Err(Error::LengthMismatch {
            left: obs.len(),
            right: syn.len(),
        });
    }
    if syn.is_empty() {
        return Err(Error::EmptyTrace);
    }

    let sum_sq = Zip::from(&obs)
        .and(&syn)
        .fold(0.0, |acc, &o, &s| acc + (o - s) * (o - s));
    Ok((sum_sq / syn.len() as f64).sqrt())
}

/// Summed RMS misfit of one model over all stations and velocity channels.
///
/// Both arrays are `(n_stations, 4, ndt)` and must list stations in the same
/// order. Each observed channel is aligned to its synthetic counterpart
/// before scoring. The sum is not normalised.
pub fn model_misfit(obs: ArrayView3<'_, f64>, syn: ArrayView3<'_, f64>) -> Result<f64> {
    if obs.len_of(Axis(0)) != syn.len_of(Axis(0)) {
        return Err(Error::ShapeMismatch {
            context: "station count".to_string(),
            expected: obs.shape().to_vec(),
            found: syn.shape().to_vec(),
        });
    }

    let mut misfit = 0.0;
    for (obs_station, syn_station) in obs.outer_iter().zip(syn.outer_iter()) {
        for row in VELOCITY_ROWS {
            let syn_trace = syn_station.index_axis_move(Axis(0), row);
            let obs_trace = align(obs_station.index_axis_move(Axis(0), row), syn_trace)?;
            misfit += rms(obs_trace, syn_trace)?;
        }
    }
    Ok(misfit)
}
