//! One complete transmission round
//!
//! Every station sends one bit: spread, superimpose on the channel, then
//! despread all stations and compare against what was sent.

use burn::tensor::backend::Backend;
use log::info;
use rand::Rng;

use crate::channel::{AwgnChannel, CompositeSignal};
use crate::decoder::{decode_all, DecodedBit};
use crate::encoder::{encode_all, random_bits};
use crate::error::{CdmaError, CdmaResult};
use crate::walsh::WalshMatrix;

/// Per-station result of a round
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StationOutcome {
    pub sent: u8,
    pub decoded: DecodedBit,
}

impl StationOutcome {
    /// Decided bit, `None` when the decode was ambiguous
    pub fn received(&self) -> Option<u8> {
        self.decoded.bit().ok()
    }

    /// Wrong or ambiguous decode
    pub fn is_error(&self) -> bool {
        self.received() != Some(self.sent)
    }
}

/// Everything observed during one round
#[derive(Clone, Debug)]
pub struct RoundReport<B: Backend> {
    pub bits: Vec<u8>,
    pub composite: CompositeSignal<B>,
    /// One entry per transmitting station, in station order
    pub outcomes: Vec<StationOutcome>,
}

impl<B: Backend> RoundReport<B> {
    pub fn errors(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_error()).count()
    }

    pub fn error_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.errors() as f64 / self.outcomes.len() as f64
    }

    /// Outcome of a 1-based station number, as a user would pick it
    pub fn station(&self, number: usize) -> CdmaResult<&StationOutcome> {
        let stations = self.outcomes.len();
        if number == 0 || number > stations {
            return Err(CdmaError::InvalidStation { index: number, stations });
        }
        Ok(&self.outcomes[number - 1])
    }
}

/// Run one round with the given per-station bits (station i sends `bits[i]`)
pub fn run_round<B: Backend>(
    matrix: &WalshMatrix<B>,
    bits: &[u8],
    channel: &mut AwgnChannel,
) -> CdmaResult<RoundReport<B>> {
    let signals = encode_all(matrix, bits)?;
    let composite = channel.transmit(&signals)?;
    let decoded = decode_all(&composite, matrix)?;

    let outcomes: Vec<StationOutcome> = bits
        .iter()
        .zip(decoded)
        .map(|(&sent, decoded)| StationOutcome { sent, decoded })
        .collect();

    let report = RoundReport {
        bits: bits.to_vec(),
        composite,
        outcomes,
    };

    info!(
        "[Round] {} stations, sigma={:.3}: {} errors",
        bits.len(),
        channel.sigma(),
        report.errors()
    );

    Ok(report)
}

/// Run one round where every station sends a random bit
pub fn run_random_round<B: Backend, R: Rng + ?Sized>(
    matrix: &WalshMatrix<B>,
    rng: &mut R,
    channel: &mut AwgnChannel,
) -> CdmaResult<RoundReport<B>> {
    let bits = random_bits(matrix.num_stations(), rng);
    run_round(matrix, &bits, channel)
}
