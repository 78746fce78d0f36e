//! CDMA error types

use thiserror::Error;

/// Result type for CDMA operations
pub type CdmaResult<T> = Result<T, CdmaError>;

/// Errors that can occur while spreading, combining or despreading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CdmaError {
    /// Station count or order cannot produce a Walsh matrix, or analysis
    /// parameters are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Data bit outside {0, 1}
    #[error("Invalid data bit {0}: expected 0 or 1")]
    InvalidDataBit(u8),

    /// Signal set cannot be combined, or a signal does not fit the code length
    #[error("Invalid channel input: {0}")]
    InvalidChannelInput(String),

    /// Correlation score was exactly zero
    #[error("Ambiguous decode for station {station}: correlation score is exactly zero")]
    DecodeAmbiguous { station: usize },

    /// Station index outside the code matrix
    #[error("Station index {index} out of range for {stations} stations")]
    InvalidStation { index: usize, stations: usize },

    /// Reading tensor values back to the host failed
    #[error("Tensor data error: {0}")]
    TensorData(String),
}

impl CdmaError {
    pub(crate) fn tensor_data(err: impl std::fmt::Debug) -> Self {
        CdmaError::TensorData(format!("{:?}", err))
    }
}
