//! Walsh-Hadamard code matrix
//!
//! Builds the N x N (N = 2^n) matrix of +1/-1 chips by block doubling:
//!
//! ```text
//! W(0) = [ +1 ]
//!
//! W(k+1) = [ W(k)   W(k) ]
//!          [ W(k)  -W(k) ]
//! ```
//!
//! If the rows of W(k) are pairwise orthogonal with energy N_k, the rows of
//! W(k+1) are pairwise orthogonal with energy 2 * N_k: the left halves add
//! and the right halves either add (same sign block) or cancel exactly
//! (opposite sign block).
//!
//! Row i is the spreading code of station i.

use std::fmt;

use burn::tensor::{backend::Backend, Tensor};
use log::debug;

use crate::error::{CdmaError, CdmaResult};

/// Largest supported order (4096 stations)
pub const MAX_ORDER: u32 = 12;

/// Immutable Walsh code matrix shared by every encoder and decoder
#[derive(Clone, Debug)]
pub struct WalshMatrix<B: Backend> {
    order: u32,
    codes: Tensor<B, 2>,
}

impl<B: Backend> WalshMatrix<B> {
    /// Build the 2^order x 2^order matrix
    pub fn from_order(device: &B::Device, order: u32) -> CdmaResult<Self> {
        if order == 0 {
            return Err(CdmaError::InvalidConfiguration(
                "order must be at least 1 (2 stations)".to_string(),
            ));
        }
        if order > MAX_ORDER {
            return Err(CdmaError::InvalidConfiguration(format!(
                "order {} exceeds maximum {} ({} stations)",
                order,
                MAX_ORDER,
                1usize << MAX_ORDER
            )));
        }

        // Iterative doubling, bottom-up from the 1x1 seed
        let mut codes = Tensor::<B, 2>::ones([1, 1], device);
        for _ in 0..order {
            let top = Tensor::cat(vec![codes.clone(), codes.clone()], 1);
            let bottom = Tensor::cat(vec![codes.clone(), codes.neg()], 1);
            codes = Tensor::cat(vec![top, bottom], 0);
        }

        debug!("[Walsh] Built order {} matrix ({} stations)", order, 1usize << order);

        Ok(Self { order, codes })
    }

    /// Build the matrix for a power-of-two station count
    pub fn from_station_count(device: &B::Device, num_stations: usize) -> CdmaResult<Self> {
        if num_stations < 2 || !num_stations.is_power_of_two() {
            return Err(CdmaError::InvalidConfiguration(format!(
                "station count {} is not a power of two >= 2",
                num_stations
            )));
        }
        Self::from_order(device, num_stations.trailing_zeros())
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Number of stations, which is also the code length in chips
    pub fn num_stations(&self) -> usize {
        1usize << self.order
    }

    /// The full [stations, chips] code tensor
    pub fn tensor(&self) -> &Tensor<B, 2> {
        &self.codes
    }

    pub fn device(&self) -> B::Device {
        self.codes.device()
    }

    /// Code row of one station
    pub fn row(&self, station: usize) -> CdmaResult<Tensor<B, 1>> {
        Ok(self.code(station)?.row())
    }

    /// Read-only view of one station's code
    pub fn code(&self, station: usize) -> CdmaResult<StationCode<'_, B>> {
        let stations = self.num_stations();
        if station >= stations {
            return Err(CdmaError::InvalidStation { index: station, stations });
        }
        Ok(StationCode { matrix: self, index: station })
    }

    /// Codes for every station, in row order
    pub fn codes(&self) -> impl Iterator<Item = StationCode<'_, B>> + '_ {
        (0..self.num_stations()).map(move |index| StationCode { matrix: self, index })
    }

    /// First `count` code rows as a [count, chips] tensor
    pub(crate) fn leading_rows(&self, count: usize) -> Tensor<B, 2> {
        let n = self.num_stations();
        self.codes.clone().slice([0..count, 0..n])
    }

    /// Exact host copy of the chips, row-major
    pub fn to_rows(&self) -> CdmaResult<Vec<Vec<i8>>> {
        let n = self.num_stations();
        let data = self.codes.to_data();
        let values = data.as_slice::<f32>().map_err(CdmaError::tensor_data)?;

        Ok(values
            .chunks(n)
            .map(|row| row.iter().map(|&chip| chip as i8).collect())
            .collect())
    }
}

impl<B: Backend> fmt::Display for WalshMatrix<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.to_rows().map_err(|_| fmt::Error)?;
        for (i, row) in rows.iter().enumerate() {
            write!(f, "  S{:<4}", i + 1)?;
            for chip in row {
                write!(f, " {:+}", chip)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One station's spreading code: a row of the shared matrix
#[derive(Debug)]
pub struct StationCode<'a, B: Backend> {
    matrix: &'a WalshMatrix<B>,
    index: usize,
}

impl<B: Backend> Clone for StationCode<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend> Copy for StationCode<'_, B> {}

impl<'a, B: Backend> StationCode<'a, B> {
    /// Zero-based station (row) index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Code length in chips
    pub fn len(&self) -> usize {
        self.matrix.num_stations()
    }

    pub fn matrix(&self) -> &'a WalshMatrix<B> {
        self.matrix
    }

    pub fn row(&self) -> Tensor<B, 1> {
        let n = self.len();
        self.matrix
            .tensor()
            .clone()
            .slice([self.index..self.index + 1, 0..n])
            .reshape([n])
    }
}
