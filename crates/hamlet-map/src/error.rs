//! Error types for map configuration.

use std::fmt;

use hamlet_core::LandmarkKey;

/// Errors from building a [`LandmarkRegistry`](crate::LandmarkRegistry)
/// or validating a [`TerrainTable`](crate::TerrainTable).
///
/// Map *text* never fails to load; only the configuration data that
/// interprets it can be invalid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapError {
    /// Two landmark definitions share a map code.
    DuplicateCode {
        /// The repeated code.
        code: char,
    },
    /// Two landmark definitions share a key.
    DuplicateKey {
        /// The repeated key.
        key: LandmarkKey,
    },
    /// A code that cannot appear as a map cell (whitespace or a section bracket).
    InvalidCode {
        /// The offending code.
        code: char,
    },
    /// A terrain cost of zero, which would break the distance heuristic.
    ZeroCost {
        /// The terrain code with zero cost.
        code: char,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateCode { code } => write!(f, "landmark code '{code}' defined twice"),
            Self::DuplicateKey { key } => write!(f, "landmark key '{key}' defined twice"),
            Self::InvalidCode { code } => write!(f, "'{}' cannot be used as a map code", code.escape_debug()),
            Self::ZeroCost { code } => write!(f, "terrain '{code}' has zero cost; minimum is 1"),
        }
    }
}

impl std::error::Error for MapError {}

/// Whether `code` can appear as a single map cell.
pub(crate) fn check_code(code: char) -> Result<(), MapError> {
    if code.is_whitespace() || code == '[' || code == ']' {
        return Err(MapError::InvalidCode { code });
    }
    Ok(())
}
