//! Despreading by normalized correlation
//!
//! score = <composite, code_i> / N
//!
//! Without noise every other station's contribution cancels and the score is
//! exactly the transmitted bipolar symbol (+1 or -1). Noise pushes the score
//! off those values, so the raw score is always kept next to the decision.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};
use log::{debug, warn};

use crate::channel::CompositeSignal;
use crate::error::{CdmaError, CdmaResult};
use crate::walsh::{StationCode, WalshMatrix};

/// Correlation result for one station
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedBit {
    /// Zero-based station index
    pub station: usize,
    /// Normalized correlation score before thresholding
    pub score: f32,
}

impl DecodedBit {
    /// Score exactly zero: neither bit is favoured
    pub fn is_ambiguous(&self) -> bool {
        self.score == 0.0
    }

    /// Sign decision: positive is 1, negative is 0
    pub fn bit(&self) -> CdmaResult<u8> {
        if self.score > 0.0 {
            Ok(1)
        } else if self.score < 0.0 {
            Ok(0)
        } else {
            Err(CdmaError::DecodeAmbiguous { station: self.station })
        }
    }
}

fn check_length<B: Backend>(composite: &CompositeSignal<B>, chips: usize) -> CdmaResult<()> {
    if composite.len() != chips {
        return Err(CdmaError::InvalidChannelInput(format!(
            "composite has {} chips, code length is {}",
            composite.len(),
            chips
        )));
    }
    Ok(())
}

/// Raw correlation score of one station, ambiguity is not an error here
pub fn correlate<B: Backend>(
    composite: &CompositeSignal<B>,
    code: &StationCode<'_, B>,
) -> CdmaResult<DecodedBit> {
    let n = code.len();
    check_length(composite, n)?;

    let inner: f32 = (composite.chips().clone() * code.row())
        .sum()
        .into_scalar()
        .elem::<f32>();

    Ok(DecodedBit {
        station: code.index(),
        score: inner / n as f32,
    })
}

/// Recover one station's bit
///
/// Fails with `DecodeAmbiguous` when the score is exactly zero.
pub fn decode<B: Backend>(
    composite: &CompositeSignal<B>,
    code: &StationCode<'_, B>,
) -> CdmaResult<DecodedBit> {
    let decoded = correlate(composite, code)?;
    decoded.bit()?;

    debug!(
        "[Decode] Station {} score {:.4}",
        decoded.station + 1,
        decoded.score
    );

    Ok(decoded)
}

/// Batched correlation against every code row
///
/// received: [Rounds, Chips]
/// Returns: [Rounds, Stations] normalized scores
pub fn correlate_batch<B: Backend>(received: Tensor<B, 2>, matrix: &WalshMatrix<B>) -> Tensor<B, 2> {
    let n = matrix.num_stations();
    // Walsh matrices are symmetric, the transpose keeps the intent explicit
    received
        .matmul(matrix.tensor().clone().transpose())
        .div_scalar(n as f32)
}

/// Decode every station from one composite signal in a single pass
///
/// Results are index-aligned with the code rows. Ambiguous stations are kept
/// and report themselves through `DecodedBit::bit`.
pub fn decode_all<B: Backend>(
    composite: &CompositeSignal<B>,
    matrix: &WalshMatrix<B>,
) -> CdmaResult<Vec<DecodedBit>> {
    let n = matrix.num_stations();
    check_length(composite, n)?;

    let scores = correlate_batch(composite.chips().clone().reshape([1, n]), matrix);
    let data = scores.to_data();
    let scores = data.as_slice::<f32>().map_err(CdmaError::tensor_data)?;

    let decoded: Vec<DecodedBit> = scores
        .iter()
        .enumerate()
        .map(|(station, &score)| DecodedBit { station, score })
        .collect();

    let ambiguous = decoded.iter().filter(|d| d.is_ambiguous()).count();
    if ambiguous > 0 {
        warn!("[Decode] {} of {} stations decoded ambiguously", ambiguous, n);
    }

    Ok(decoded)
}

/// Discrete bits of a decode pass, failing on the first ambiguous station
pub fn recovered_bits(decoded: &[DecodedBit]) -> CdmaResult<Vec<u8>> {
    decoded.iter().map(DecodedBit::bit).collect()
}
