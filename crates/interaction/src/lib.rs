//! The UI-facing pipelines: coordinate entry, upload, copy and drawing.
//!
//! Every pipeline returns a [`Failure`] instead of a partial result, so the
//! caller can keep its action disabled and show no geometry.

pub mod copy;
pub mod draw;
pub mod entry;
pub mod upload;

use std::fmt;

use crs::{ConvertError, DetectError};
use formats::{ParseError, SerializeError};
use geometry::{ResolveError, RingError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Text matches no supported grammar.
    Parse,
    /// Values fit no known CRS, or a tag names an unsupported one.
    Detection,
    /// Values cannot be projected, a ring is degenerate, or the target
    /// format cannot carry the shape.
    Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Parse(ParseError),
    Detection(DetectError),
    Conversion(ConvertError),
    Resolve(ResolveError),
    Ring(RingError),
    Output(SerializeError),
}

impl Failure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Parse(_) => FailureKind::Parse,
            Failure::Detection(_) => FailureKind::Detection,
            Failure::Conversion(_)
            | Failure::Resolve(_)
            | Failure::Ring(_)
            | Failure::Output(_) => FailureKind::Conversion,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Parse(e) => write!(f, "{e}"),
            Failure::Detection(e) => write!(f, "{e}"),
            Failure::Conversion(e) => write!(f, "{e}"),
            Failure::Resolve(e) => write!(f, "{e}"),
            Failure::Ring(e) => write!(f, "{e}"),
            Failure::Output(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Failure::Parse(e) => Some(e),
            Failure::Detection(e) => Some(e),
            Failure::Conversion(e) => Some(e),
            Failure::Resolve(e) => Some(e),
            Failure::Ring(e) => Some(e),
            Failure::Output(e) => Some(e),
        }
    }
}

impl From<ParseError> for Failure {
    fn from(e: ParseError) -> Self {
        Failure::Parse(e)
    }
}

impl From<DetectError> for Failure {
    fn from(e: DetectError) -> Self {
        Failure::Detection(e)
    }
}

impl From<ConvertError> for Failure {
    fn from(e: ConvertError) -> Self {
        Failure::Conversion(e)
    }
}

impl From<ResolveError> for Failure {
    fn from(e: ResolveError) -> Self {
        Failure::Resolve(e)
    }
}

impl From<RingError> for Failure {
    fn from(e: RingError) -> Self {
        Failure::Ring(e)
    }
}

impl From<SerializeError> for Failure {
    fn from(e: SerializeError) -> Self {
        Failure::Output(e)
    }
}

#[cfg(test)]
mod tests {
    use super::{Failure, FailureKind};
    use crs::{ConvertError, CrsId, DetectError};
    use formats::ParseError;
    use geometry::{ResolveError, RingError};

    #[test]
    fn kinds_are_never_conflated() {
        assert_eq!(Failure::from(ParseError::Empty).kind(), FailureKind::Parse);
        assert_eq!(
            Failure::from(DetectError::Empty).kind(),
            FailureKind::Detection
        );
        let out_of_domain = ConvertError::OutOfDomain {
            crs: CrsId::Ykj,
            north: 0.0,
            east: 0.0,
        };
        assert_eq!(
            Failure::from(out_of_domain.clone()).kind(),
            FailureKind::Conversion
        );
        assert_eq!(
            Failure::from(ResolveError::Conversion(out_of_domain)).kind(),
            FailureKind::Conversion
        );
        assert_eq!(
            Failure::from(RingError::ZeroArea).kind(),
            FailureKind::Conversion
        );
    }
}
