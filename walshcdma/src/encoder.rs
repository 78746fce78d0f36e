//! Spreading: bipolar data bit times the station's Walsh code
//!
//! Bit 0 maps to -1 and bit 1 to +1, so a spread signal is either the code
//! row itself or its negation.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use rand::Rng;

use crate::error::{CdmaError, CdmaResult};
use crate::walsh::{StationCode, WalshMatrix};

/// Map a data bit to its bipolar symbol
pub fn to_bipolar(bit: u8) -> CdmaResult<f32> {
    match bit {
        0 => Ok(-1.0),
        1 => Ok(1.0),
        other => Err(CdmaError::InvalidDataBit(other)),
    }
}

/// One station's spread sequence for a single round
#[derive(Clone, Debug)]
pub struct EncodedSignal<B: Backend> {
    station: usize,
    bit: u8,
    chips: Tensor<B, 1>,
}

impl<B: Backend> EncodedSignal<B> {
    /// Station (code row) that produced this signal
    pub fn station(&self) -> usize {
        self.station
    }

    /// Data bit carried by this signal
    pub fn bit(&self) -> u8 {
        self.bit
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

    pub fn to_vec(&self) -> CdmaResult<Vec<f32>> {
        let data = self.chips.to_data();
        Ok(data.as_slice::<f32>().map_err(CdmaError::tensor_data)?.to_vec())
    }
}

/// Spread one bit with one station's code
pub fn encode<B: Backend>(bit: u8, code: &StationCode<'_, B>) -> CdmaResult<EncodedSignal<B>> {
    let symbol = to_bipolar(bit)?;

    Ok(EncodedSignal {
        station: code.index(),
        bit,
        chips: code.row().mul_scalar(symbol),
    })
}

/// Spread `bits[i]` with station i's code, for every supplied bit
pub fn encode_all<B: Backend>(
    matrix: &WalshMatrix<B>,
    bits: &[u8],
) -> CdmaResult<Vec<EncodedSignal<B>>> {
    let stations = matrix.num_stations();
    if bits.len() > stations {
        return Err(CdmaError::InvalidChannelInput(format!(
            "{} data bits for {} stations",
            bits.len(),
            stations
        )));
    }

    bits.iter()
        .enumerate()
        .map(|(station, &bit)| encode(bit, &matrix.code(station)?))
        .collect()
}

/// Spread many rounds at once
///
/// rounds: [NumRounds][NumActive] bits, station i uses row i
/// Returns: [NumRounds, Chips] tensor, each row already summed over stations
///
/// One matmul of the bipolar table against the leading code rows, which is
/// the same as encoding every station and combining without noise.
pub fn spread_batch<B: Backend>(
    matrix: &WalshMatrix<B>,
    rounds: &[Vec<u8>],
) -> CdmaResult<Tensor<B, 2>> {
    let stations = matrix.num_stations();
    let active = match rounds.first() {
        Some(first) => first.len(),
        None => {
            return Err(CdmaError::InvalidChannelInput("no rounds to spread".to_string()));
        }
    };

    if active == 0 || active > stations {
        return Err(CdmaError::InvalidChannelInput(format!(
            "{} active stations for a {}-station code",
            active, stations
        )));
    }
    if let Some(bad) = rounds.iter().find(|round| round.len() != active) {
        return Err(CdmaError::InvalidChannelInput(format!(
            "round has {} bits, expected {}",
            bad.len(),
            active
        )));
    }

    let symbols = rounds
        .iter()
        .flatten()
        .map(|&bit| to_bipolar(bit))
        .collect::<CdmaResult<Vec<f32>>>()?;

    let device = matrix.device();
    let table = Tensor::<B, 2>::from_data(TensorData::new(symbols, [rounds.len(), active]), &device);

    Ok(table.matmul(matrix.leading_rows(active)))
}

/// Random data bits, one per station
pub fn random_bits<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u8> {
    (0..count).map(|_| rng.gen_range(0..=1u8)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_bipolar_mapping() {
        assert_eq!(to_bipolar(0).unwrap(), -1.0);
        assert_eq!(to_bipolar(1).unwrap(), 1.0);
        assert_eq!(to_bipolar(2).unwrap_err(), CdmaError::InvalidDataBit(2));
        assert_eq!(to_bipolar(255).unwrap_err(), CdmaError::InvalidDataBit(255));
    }

    #[test]
    fn test_encode_follows_code_sign() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 2).unwrap();
        let code = matrix.code(1).unwrap();

        let one = encode(1, &code).unwrap();
        assert_eq!(one.station(), 1);
        assert_eq!(one.bit(), 1);
        assert_eq!(one.to_vec().unwrap(), vec![1.0, -1.0, 1.0, -1.0]);

        let zero = encode(0, &code).unwrap();
        assert_eq!(zero.to_vec().unwrap(), vec![-1.0, 1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_encode_rejects_non_binary() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 3).unwrap();
        let code = matrix.code(0).unwrap();

        assert_eq!(encode(2, &code).unwrap_err(), CdmaError::InvalidDataBit(2));
    }

    #[test]
    fn test_encode_all() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 3).unwrap();

        let signals = encode_all(&matrix, &[1, 0, 1]).unwrap();
        assert_eq!(signals.len(), 3);
        for (i, signal) in signals.iter().enumerate() {
            assert_eq!(signal.station(), i);
            assert_eq!(signal.len(), 8);
        }

        assert!(matches!(
            encode_all(&matrix, &[1; 9]),
            Err(CdmaError::InvalidChannelInput(_))
        ));
        assert_eq!(
            encode_all(&matrix, &[1, 0, 3]).unwrap_err(),
            CdmaError::InvalidDataBit(3)
        );
    }

    #[test]
    fn test_spread_batch_matches_single_encodes() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 2).unwrap();
        let rounds = vec![vec![1, 0, 1, 1], vec![0, 0, 0, 0]];

        let batch = spread_batch(&matrix, &rounds).unwrap();
        assert_eq!(batch.dims(), [2, 4]);

        let data = batch.to_data();
        let values = data.as_slice::<f32>().unwrap();

        for (r, bits) in rounds.iter().enumerate() {
            let mut expected = vec![0.0f32; 4];
            for signal in encode_all(&matrix, bits).unwrap() {
                for (acc, chip) in expected.iter_mut().zip(signal.to_vec().unwrap()) {
                    *acc += chip;
                }
            }
            assert_eq!(&values[r * 4..(r + 1) * 4], expected.as_slice());
        }
    }

    #[test]
    fn test_spread_batch_validation() {
        let device = Default::default();
        let matrix = WalshMatrix::<TestBackend>::from_order(&device, 2).unwrap();

        assert!(spread_batch(&matrix, &[]).is_err());
        assert!(spread_batch(&matrix, &[vec![]]).is_err());
        assert!(spread_batch(&matrix, &[vec![1; 5]]).is_err());
        assert!(spread_batch(&matrix, &[vec![1, 0], vec![1]]).is_err());
        assert_eq!(
            spread_batch(&matrix, &[vec![1, 7]]).unwrap_err(),
            CdmaError::InvalidDataBit(7)
        );
    }

    #[test]
    fn test_random_bits_are_binary_and_seeded() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);

        let bits = random_bits(256, &mut a);
        assert_eq!(bits.len(), 256);
        assert!(bits.iter().all(|&bit| bit <= 1));
        assert!(bits.contains(&0) && bits.contains(&1));
        assert_eq!(bits, random_bits(256, &mut b));
    }
}
