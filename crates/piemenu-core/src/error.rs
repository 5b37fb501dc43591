use crate::model::PieName;
use thiserror::Error;

/// Everything the engine can complain about. None of these are fatal: configuration errors
/// degrade the layout, state errors abort the current gesture.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PieError {
    #[error("pie '{0}' not found")]
    PieNotFound(PieName),
    #[error("no pie given and no default pie configured")]
    NoDefaultPie,
    #[error("tracking without an active pie")]
    NoActivePie,
    #[error("slice {slice} claims direction bucket {bucket}° which is already taken")]
    DirectionCollision { slice: usize, bucket: i32 },
    #[error("slice {slice} has an unusable direction")]
    InvalidDirection { slice: usize },
    #[error("slice {slice} uses unknown item layout '{layout}'")]
    UnknownLayout { slice: usize, layout: String },
    #[error("'{0}' is not a direction name, a number of degrees or a [dx, dy] pair")]
    InvalidDirectionSpec(String),
}
