use thiserror::Error;

/// Errors raised when reading or writing a filter parameter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("filter `{filter}` has no parameter named `{name}`")]
    UnknownParameter { filter: &'static str, name: String },

    #[error("parameter `{parameter}` does not apply to a `{found}` operation")]
    OperationMismatch {
        parameter: &'static str,
        found: &'static str,
    },

    #[error("parameter `{parameter}` expects a {expected} value, got {found}")]
    ValueKind {
        parameter: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("pipeline index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown filter `{0}`")]
    UnknownFilter(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("lookup image must be {expected}x{expected}, got {width}x{height}")]
    Dimensions {
        expected: u32,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MixerError {
    #[error("frames can only be pushed while the mixer is in live mode")]
    NotLive,
}
