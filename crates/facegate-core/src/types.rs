use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Axis-aligned face rectangle in image pixel coordinates, as produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// True when the rectangle has positive area and lies fully inside a `width × height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }
}

/// Short numeric employee code that labels every enrolled face sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityCode(u16);

impl IdentityCode {
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for IdentityCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for IdentityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid employee code {0:?}: expected a number between 0 and 65535")]
pub struct InvalidIdentity(pub String);

impl FromStr for IdentityCode {
    type Err = InvalidIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // u16::from_str accepts a leading '+'; employee codes are digits only.
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidIdentity(s.to_string()));
        }
        trimmed
            .parse::<u16>()
            .map(Self)
            .map_err(|_| InvalidIdentity(s.to_string()))
    }
}

/// Outcome of one recognition request.
///
/// `NoFace` and `NoMatch` render the same text; callers that need to tell
/// them apart match on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "identity", rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Recognized(IdentityCode),
    NoMatch,
    NoFace,
}

impl RecognitionOutcome {
    pub fn identity(&self) -> Option<IdentityCode> {
        match self {
            Self::Recognized(code) => Some(*code),
            Self::NoMatch | Self::NoFace => None,
        }
    }
}

impl fmt::Display for RecognitionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognized(code) => write!(f, "Employee Code: {code}"),
            Self::NoMatch | Self::NoFace => f.write_str("No recognized faces"),
        }
    }
}
