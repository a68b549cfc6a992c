use strum_macros::{Display, EnumDiscriminants, EnumIter, IntoStaticStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(ErrorKind), derive(Display, EnumIter, IntoStaticStr, Hash))]
pub enum GridError {
    /// A side is zero, or `height * width` does not fit in `usize`.
    #[error("invalid dimension {height}x{width}: sides must be non-zero and their product must fit in usize")]
    InvalidDimension { height: usize, width: usize },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{height}x{width} is not a square of the required size")]
    NotSquare { height: usize, width: usize },

    /// When the source is too long, `actual` is `expected + 1`: the
    /// source is not drained past the first surplus element.
    #[error("expected exactly {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("could not allocate storage for {elements} elements")]
    AllocationFailure { elements: usize },
}

impl GridError {
    pub fn kind(&self) -> ErrorKind
    {
        ErrorKind::from(self)
    }
}

pub type Result<T> = std::result::Result<T, GridError>;

/// Fails with `IndexOutOfRange` unless `index < len`.
pub(crate) fn check_index(index: usize, len: usize) -> Result<()>
{
    if index >= len {
        return Err(GridError::IndexOutOfRange { index, len });
    }
    Ok(())
}
