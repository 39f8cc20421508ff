use crate::node::NodeKey;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("expected positive finite spacings but got: da={da}, db={db}")]
    InvalidSpacing { da: f64, db: f64 },
    #[error("expected a non-zero finite alignment direction but got: ({x}, {y})")]
    InvalidDirection { x: f64, y: f64 },
    #[error("skew directions are parallel (cosine between them is {cosine})")]
    DegenerateGeometry { cosine: f64 },
    #[error("lattice geometry is flagged invalid")]
    InvalidGeometry,
    #[error("expected a positive finite quantization step but got: {delta}")]
    InvalidStep { delta: f64 },
    #[error("area bounds must be finite with min <= max on both axes")]
    InvalidArea,
    #[error("node {key} is outside of the index range")]
    KeyOutOfRange { key: NodeKey },
    #[error("template and search patches must not be empty")]
    EmptyPatch,
    #[error("template of {template:?} does not fit inside search patch of {search:?}")]
    PatchTooLarge {
        template: (usize, usize),
        search: (usize, usize),
    },
    #[error("work must be split into at least one group")]
    ZeroGroups,
}

pub type Result<T> = std::result::Result<T, Error>;
