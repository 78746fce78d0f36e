//! WalshCDMA - Code Division Multiple Access with Walsh codes
//!
//! Simulates N stations (N = 2^n) sharing one channel. Each station spreads
//! its bit with one row of an orthogonal Walsh-Hadamard matrix, the channel
//! sums every spread signal (optionally adding Gaussian noise), and any
//! station's bit is recovered by correlating the composite signal with that
//! station's code.
//!
//! Tensor work runs on any `burn` backend; tests and the default binary use
//! the ndarray CPU backend.

pub mod error;
pub mod walsh;
pub mod encoder;
pub mod channel;
pub mod decoder;
pub mod analysis;
pub mod config;
pub mod simulation;
pub mod test_utils;

pub use error::{CdmaError, CdmaResult};
pub use walsh::{WalshMatrix, StationCode, MAX_ORDER};
pub use encoder::{encode, encode_all, spread_batch, to_bipolar, random_bits, EncodedSignal};
pub use channel::{combine, AwgnChannel, CompositeSignal};
pub use decoder::{correlate, correlate_batch, decode, decode_all, recovered_bits, DecodedBit};
pub use analysis::{check_orthogonality, run_ber_sweep, BerPoint, BerReport, OrthogonalityReport};
pub use config::SimulationConfig;
pub use simulation::{run_round, run_random_round, RoundReport, StationOutcome};
pub use test_utils::{assert_approx_eq_tensor, assert_approx_eq_scalar, assert_bipolar};
