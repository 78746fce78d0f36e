//! Shared channel: superposition of every station's spread signal
//!
//! The noiseless channel is a plain elementwise sum. `AwgnChannel` adds one
//! independent zero-mean Gaussian sample per chip, drawn from a seeded
//! ChaCha stream so runs are reproducible.

use burn::tensor::{backend::Backend, Tensor};
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::encoder::EncodedSignal;
use crate::error::{CdmaError, CdmaResult};

/// Composite signal on the shared medium for one round
#[derive(Clone, Debug)]
pub struct CompositeSignal<B: Backend> {
    chips: Tensor<B, 1>,
    num_stations: usize,
    noise_sigma: f32,
}

impl<B: Backend> CompositeSignal<B> {
    /// Wrap raw chips, e.g. a received or synthetic signal
    pub fn from_chips(chips: Tensor<B, 1>) -> Self {
        Self {
            chips,
            num_stations: 0,
            noise_sigma: 0.0,
        }
    }

    pub fn chips(&self) -> &Tensor<B, 1> {
        &self.chips
    }

    pub fn len(&self) -> usize {
        self.chips.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of superimposed stations (0 when built from raw chips)
    pub fn num_stations(&self) -> usize {
        self.num_stations
    }

    /// Noise standard deviation applied by the channel
    pub fn noise_sigma(&self) -> f32 {
        self.noise_sigma
    }

    pub fn to_vec(&self) -> CdmaResult<Vec<f32>> {
        let data = self.chips.to_data();
        Ok(data.as_slice::<f32>().map_err(CdmaError::tensor_data)?.to_vec())
    }
}

/// Sum all stations' spread signals chip by chip
pub fn combine<B: Backend>(signals: &[EncodedSignal<B>]) -> CdmaResult<CompositeSignal<B>> {
    let first = signals
        .first()
        .ok_or_else(|| CdmaError::InvalidChannelInput("no signals to combine".to_string()))?;
    let len = first.len();

    if let Some(bad) = signals.iter().find(|s| s.len() != len) {
        return Err(CdmaError::InvalidChannelInput(format!(
            "station {} signal has {} chips, expected {}",
            bad.station(),
            bad.len(),
            len
        )));
    }
    if signals.len() > len {
        return Err(CdmaError::InvalidChannelInput(format!(
            "{} signals exceed the {}-chip code length",
            signals.len(),
            len
        )));
    }

    let mut seen = vec![false; len];
    for signal in signals {
        let station = signal.station();
        if station >= len || seen[station] {
            return Err(CdmaError::InvalidChannelInput(format!(
                "station {} appears more than once or has no code row",
                station
            )));
        }
        seen[station] = true;
    }

    let stacked: Tensor<B, 2> = Tensor::stack(
        signals.iter().map(|s| s.chips().clone()).collect(),
        0,
    );
    let chips = stacked.sum_dim(0).reshape([len]);

    Ok(CompositeSignal {
        chips,
        num_stations: signals.len(),
        noise_sigma: 0.0,
    })
}

/// Additive white Gaussian noise channel
#[derive(Clone, Debug)]
pub struct AwgnChannel {
    sigma: f32,
    normal: Option<Normal<f32>>,
    rng: ChaCha8Rng,
}

impl AwgnChannel {
    /// Channel with noise standard deviation `sigma`, seeded for reproducibility
    pub fn new(sigma: f32, seed: u64) -> CdmaResult<Self> {
        Self::with_stream(sigma, seed, 0)
    }

    /// Same as `new`, but on an independent ChaCha stream of the seed
    pub fn with_stream(sigma: f32, seed: u64, stream: u64) -> CdmaResult<Self> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(CdmaError::InvalidChannelInput(format!(
                "noise sigma must be finite and >= 0, got {}",
                sigma
            )));
        }

        let normal = if sigma > 0.0 {
            Some(Normal::new(0.0, sigma).map_err(|e| {
                CdmaError::InvalidChannelInput(format!("noise sigma {}: {}", sigma, e))
            })?)
        } else {
            None
        };

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);

        Ok(Self { sigma, normal, rng })
    }

    /// Pure superposition, no noise samples are ever drawn
    pub fn noiseless() -> Self {
        Self {
            sigma: 0.0,
            normal: None,
            rng: ChaCha8Rng::seed_from_u64(0),
        }
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Draw `len` noise samples (all zero when sigma is 0)
    pub fn noise_samples(&mut self, len: usize) -> Vec<f32> {
        match &self.normal {
            Some(normal) => (0..len).map(|_| normal.sample(&mut self.rng)).collect(),
            None => vec![0.0; len],
        }
    }

    /// Combine the signals and add one noise sample per chip
    pub fn transmit<B: Backend>(
        &mut self,
        signals: &[EncodedSignal<B>],
    ) -> CdmaResult<CompositeSignal<B>> {
        let composite = combine(signals)?;
        if self.normal.is_none() {
            return Ok(composite);
        }

        let len = composite.len();
        let noise = self.noise_samples(len);
        let device = composite.chips.device();
        let noise = Tensor::<B, 1>::from_floats(noise.as_slice(), &device);

        debug!(
            "[Channel] Added AWGN sigma={:.3} to {} chips from {} stations",
            self.sigma, len, composite.num_stations
        );

        Ok(CompositeSignal {
            chips: composite.chips + noise,
            num_stations: composite.num_stations,
            noise_sigma: self.sigma,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{encode, encode_all};
    use crate::walsh::WalshMatrix;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_combine_sums_chips() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 2).unwrap();
        let signals = encode_all(&matrix, &[1, 1, 0, 1]).unwrap();

        let composite = combine(&signals).unwrap();
        assert_eq!(composite.len(), 4);
        assert_eq!(composite.num_stations(), 4);
        assert_eq!(composite.noise_sigma(), 0.0);

        // +r0 +r1 -r2 +r3
        assert_eq!(composite.to_vec().unwrap(), vec![2.0, -2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_combine_rejects_bad_sets() {
        let device = Default::default();
        let small = WalshMatrix::<TestBackend>::from_order(&device, 1).unwrap();
        let large = WalshMatrix::<TestBackend>::from_order(&device, 2).unwrap();

        let empty: Vec<EncodedSignal<TestBackend>> = Vec::new();
        assert!(matches!(combine(&empty), Err(CdmaError::InvalidChannelInput(_))));

        let mixed = vec![
            encode(1, &small.code(0).unwrap()).unwrap(),
            encode(1, &large.code(1).unwrap()).unwrap(),
        ];
        assert!(matches!(combine(&mixed), Err(CdmaError::InvalidChannelInput(_))));

        let duplicate = vec![
            encode(1, &large.code(2).unwrap()).unwrap(),
            encode(0, &large.code(2).unwrap()).unwrap(),
        ];
        assert!(matches!(combine(&duplicate), Err(CdmaError::InvalidChannelInput(_))));
    }

    #[test]
    fn test_zero_sigma_reproduces_superposition() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 3).unwrap();
        let signals = encode_all(&matrix, &[1, 0, 1, 1, 0, 0, 1, 0]).unwrap();

        let clean = combine(&signals).unwrap().to_vec().unwrap();

        let mut channel = AwgnChannel::new(0.0, 99).unwrap();
        let through = channel.transmit(&signals).unwrap();
        assert_eq!(through.to_vec().unwrap(), clean);

        let mut noiseless = AwgnChannel::noiseless();
        assert_eq!(noiseless.transmit(&signals).unwrap().to_vec().unwrap(), clean);
    }

    #[test]
    fn test_noise_is_seeded() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 3).unwrap();
        let signals = encode_all(&matrix, &[1, 0, 1, 1, 0, 0, 1, 0]).unwrap();

        let a = AwgnChannel::new(0.5, 42).unwrap().transmit(&signals).unwrap();
        let b = AwgnChannel::new(0.5, 42).unwrap().transmit(&signals).unwrap();
        let c = AwgnChannel::new(0.5, 43).unwrap().transmit(&signals).unwrap();

        assert_eq!(a.noise_sigma(), 0.5);
        assert_eq!(a.to_vec().unwrap(), b.to_vec().unwrap());
        assert_ne!(a.to_vec().unwrap(), c.to_vec().unwrap());
        assert_ne!(a.to_vec().unwrap(), combine(&signals).unwrap().to_vec().unwrap());
    }

    #[test]
    fn test_streams_are_independent() {
        let mut a = AwgnChannel::with_stream(1.0, 5, 0).unwrap();
        let mut b = AwgnChannel::with_stream(1.0, 5, 1).unwrap();
        assert_ne!(a.noise_samples(16), b.noise_samples(16));
    }

    #[test]
    fn test_noise_statistics() {
        let mut channel = AwgnChannel::new(2.0, 1234).unwrap();
        let samples = channel.noise_samples(20_000);

        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / samples.len() as f32;

        assert!(mean.abs() < 0.1, "mean {}", mean);
        assert!((var.sqrt() - 2.0).abs() < 0.1, "std {}", var.sqrt());
    }

    #[test]
    fn test_invalid_sigma() {
        for sigma in [-0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                AwgnChannel::new(sigma, 0),
                Err(CdmaError::InvalidChannelInput(_))
            ));
        }
    }
}
