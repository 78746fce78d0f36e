//! Code analysis: orthogonality check and bit-error-rate sweep
//!
//! The BER sweep runs every trial of a noise level as one batch:
//!
//! ```text
//! bits [T, N] --bipolar--> matmul W --> + noise [T, N] --> matmul W^T / N --> scores [T, N]
//! ```
//!
//! Random draws come from per-trial ChaCha streams keyed by
//! (seed, level, trial), so generating them in parallel gives the same
//! numbers as a sequential loop. Error counts are reduced with an integer sum.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::channel::AwgnChannel;
use crate::decoder::correlate_batch;
use crate::encoder::{random_bits, spread_batch};
use crate::error::{CdmaError, CdmaResult};
use crate::walsh::WalshMatrix;

/// Pairwise inner products of the code rows
#[derive(Clone, Debug, PartialEq)]
pub struct OrthogonalityReport {
    pub num_stations: usize,
    /// Row-major [N, N] inner products
    pub gram: Vec<i64>,
    /// Largest |<row_i, row_j>| over i != j, 0 for a valid matrix
    pub max_off_diagonal: i64,
    /// Every row has inner product N with itself
    pub diagonal_ok: bool,
    pub all_orthogonal: bool,
}

impl OrthogonalityReport {
    pub fn inner_product(&self, i: usize, j: usize) -> Option<i64> {
        if i >= self.num_stations || j >= self.num_stations {
            return None;
        }
        Some(self.gram[i * self.num_stations + j])
    }

    /// Diagonal of the table, one entry per station
    pub fn auto_correlations(&self) -> Vec<i64> {
        (0..self.num_stations)
            .map(|i| self.gram[i * self.num_stations + i])
            .collect()
    }
}

/// Compute W * W^T and check it equals N * I exactly
///
/// Entries are integers, so no tolerance is applied. A failing report points
/// to a construction defect and is returned as-is.
pub fn check_orthogonality<B: Backend>(matrix: &WalshMatrix<B>) -> CdmaResult<OrthogonalityReport> {
    let n = matrix.num_stations();
    let codes = matrix.tensor().clone();
    let gram_tensor = codes.clone().matmul(codes.transpose());

    let data = gram_tensor.to_data();
    let gram: Vec<i64> = data
        .as_slice::<f32>()
        .map_err(CdmaError::tensor_data)?
        .iter()
        .map(|&v| v as i64)
        .collect();

    let mut max_off_diagonal = 0i64;
    let mut diagonal_ok = true;
    for i in 0..n {
        for j in 0..n {
            let value = gram[i * n + j];
            if i == j {
                diagonal_ok &= value == n as i64;
            } else {
                max_off_diagonal = max_off_diagonal.max(value.abs());
            }
        }
    }

    let all_orthogonal = diagonal_ok && max_off_diagonal == 0;
    if all_orthogonal {
        debug!("[Orthogonality] {} codes verified", n);
    } else {
        warn!(
            "[Orthogonality] Defect: max off-diagonal {}, diagonal ok: {}",
            max_off_diagonal, diagonal_ok
        );
    }

    Ok(OrthogonalityReport {
        num_stations: n,
        gram,
        max_off_diagonal,
        diagonal_ok,
        all_orthogonal,
    })
}

/// BER measurement at one noise level
#[derive(Clone, Debug, PartialEq)]
pub struct BerPoint {
    pub sigma: f32,
    pub trials: usize,
    /// Decoded bits (trials * stations)
    pub bits: u64,
    /// Mismatches, including ambiguous decodes
    pub errors: u64,
    /// Decodes with a score of exactly zero
    pub ambiguous: u64,
    pub error_rate: f64,
}

/// Result of a BER sweep, one point per requested noise level, in order
#[derive(Clone, Debug, PartialEq)]
pub struct BerReport {
    pub num_stations: usize,
    pub seed: u64,
    pub points: Vec<BerPoint>,
}

impl BerReport {
    /// Error rate of the first point swept at exactly `sigma`
    pub fn error_rate(&self, sigma: f32) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.sigma == sigma)
            .map(|p| p.error_rate)
    }

    /// (sigma, error rate) pairs in sweep order
    pub fn rates(&self) -> Vec<(f32, f64)> {
        self.points.iter().map(|p| (p.sigma, p.error_rate)).collect()
    }
}

fn trial_stream(level: usize, trial: usize, lane: u64) -> u64 {
    ((level as u64) << 40) | ((trial as u64) << 1) | lane
}

/// Random bits and channel noise of one trial
fn draw_trial(
    stations: usize,
    sigma: f32,
    seed: u64,
    level: usize,
    trial: usize,
) -> CdmaResult<(Vec<u8>, Vec<f32>)> {
    let mut bit_rng = ChaCha8Rng::seed_from_u64(seed);
    bit_rng.set_stream(trial_stream(level, trial, 0));
    let bits = random_bits(stations, &mut bit_rng);

    let noise = if sigma > 0.0 {
        AwgnChannel::with_stream(sigma, seed, trial_stream(level, trial, 1))?.noise_samples(stations)
    } else {
        Vec::new()
    };

    Ok((bits, noise))
}

/// (errors, ambiguous) of one trial's decoded scores
fn count_errors(bits: &[u8], scores: &[f32]) -> (u64, u64) {
    bits.iter()
        .zip(scores)
        .fold((0, 0), |(errors, ambiguous), (&bit, &score)| {
            if score == 0.0 {
                (errors + 1, ambiguous + 1)
            } else if (score > 0.0) != (bit == 1) {
                (errors + 1, ambiguous)
            } else {
                (errors, ambiguous)
            }
        })
}

/// Measure bit-error rate over a list of noise levels
///
/// Each trial draws a random bit for every station, spreads, adds AWGN with
/// the level's sigma, decodes all stations and counts mismatches.
pub fn run_ber_sweep<B: Backend>(
    matrix: &WalshMatrix<B>,
    sigma_levels: &[f32],
    trials_per_level: usize,
    seed: u64,
) -> CdmaResult<BerReport> {
    if sigma_levels.is_empty() {
        return Err(CdmaError::InvalidConfiguration("no noise levels to sweep".to_string()));
    }
    if trials_per_level == 0 {
        return Err(CdmaError::InvalidConfiguration("trials per level must be at least 1".to_string()));
    }
    if let Some(bad) = sigma_levels.iter().find(|s| !s.is_finite() || **s < 0.0) {
        return Err(CdmaError::InvalidConfiguration(format!(
            "noise level {} is not a finite sigma >= 0",
            bad
        )));
    }

    let n = matrix.num_stations();
    let device = matrix.device();
    let mut points = Vec::with_capacity(sigma_levels.len());

    info!(
        "[BER] Sweeping {} levels x {} trials over {} stations (seed {})",
        sigma_levels.len(),
        trials_per_level,
        n,
        seed
    );

    for (level, &sigma) in sigma_levels.iter().enumerate() {
        let draws = (0..trials_per_level)
            .into_par_iter()
            .map(|trial| draw_trial(n, sigma, seed, level, trial))
            .collect::<CdmaResult<Vec<_>>>()?;
        let (rounds, noise): (Vec<Vec<u8>>, Vec<Vec<f32>>) = draws.into_iter().unzip();

        let mut received = spread_batch(matrix, &rounds)?;
        if sigma > 0.0 {
            let noise = TensorData::new(noise.concat(), [trials_per_level, n]);
            received = received + Tensor::<B, 2>::from_data(noise, &device);
        }

        let scores = correlate_batch(received, matrix).to_data();
        let scores = scores.as_slice::<f32>().map_err(CdmaError::tensor_data)?;

        let (errors, ambiguous) = rounds
            .par_iter()
            .zip(scores.par_chunks(n))
            .map(|(bits, row)| count_errors(bits, row))
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        let bits = (trials_per_level * n) as u64;
        let error_rate = errors as f64 / bits as f64;

        info!(
            "[BER] sigma={:.3}: {}/{} errors ({} ambiguous), BER={:.3e}",
            sigma, errors, bits, ambiguous, error_rate
        );

        points.push(BerPoint {
            sigma,
            trials: trials_per_level,
            bits,
            errors,
            ambiguous,
            error_rate,
        });
    }

    Ok(BerReport {
        num_stations: n,
        seed,
        points,
    })
}
