use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CpdError>;

/// Every failure aborts the whole run; there are no partial reports.
#[derive(Debug, Error)]
pub enum CpdError {
    #[error("minimum tile size must be >= 1 (got {0})")]
    InvalidTileSize(usize),

    #[error("no source unit is open; call begin_unit first")]
    UnitNotOpen,

    #[error("source unit `{open}` is still open; cannot begin `{requested}`")]
    UnitAlreadyOpen { open: String, requested: String },

    #[error("source unit `{0}` was added twice")]
    DuplicateUnit(String),

    #[error("source unit `{0}` has no end-of-unit marker")]
    UnterminatedUnit(String),

    #[error("source unit `{unit}`: line numbers are 1-based (got 0)")]
    InvalidLine { unit: String },

    #[error("source unit `{unit}`: line {line} follows line {previous}")]
    NonMonotonicLine {
        unit: String,
        previous: u32,
        line: u32,
    },

    #[error("source unit `{0}` is unknown to the source provider")]
    UnknownUnit(String),

    #[error("source unit `{unit}` has no lines {start_line}..={end_line}")]
    MissingLines {
        unit: String,
        start_line: u32,
        end_line: u32,
    },

    #[error("duplication analysis cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] io::Error),
}
