use thiserror::Error;

/// The error taxonomy for the fusion spine. Only `Fatal` aborts the process;
/// everything else is logged and absorbed by the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("value out of range: {field} = {value}")]
    InvalidRange { field: &'static str, value: String },

    #[error("producer '{producer}' iteration failed, retrying: {source}")]
    ProducerTransient {
        producer: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("producer '{producer}' lost its hardware permanently: {source}")]
    ProducerTerminal {
        producer: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("calibration step saw {count} new interfaces, expected exactly one")]
    CalibrationAmbiguous { count: usize },

    #[error("no persisted calibration available")]
    NoCalibration,

    #[error("fatal startup failure: {0}")]
    Fatal(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
