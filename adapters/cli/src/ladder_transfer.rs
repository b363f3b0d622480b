#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use amida_core::{OutcomeLabel, Rung};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "amida";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "amida:v1";
/// Delimiter used to separate the prefix, board dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of a generated ladder and the outcome labels attached to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LadderSnapshot {
    /// Number of vertical rails on the board.
    pub lines: u32,
    /// Number of interior levels on the board.
    pub levels: u32,
    /// Rungs composing the ladder, ordered by ascending level.
    pub rungs: Vec<Rung>,
    /// Outcome labels indexed by rail, left to right.
    pub labels: Vec<OutcomeLabel>,
}

impl LadderSnapshot {
    /// Encodes the snapshot into a single-line string suitable for sharing.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableSnapshot {
            rungs: self.rungs.clone(),
            labels: self.labels.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("ladder snapshot serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SNAPSHOT_HEADER}:{}x{}:{encoded}", self.lines, self.levels)
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LadderTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LadderTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LadderTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LadderTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LadderTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LadderTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LadderTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LadderTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (lines, levels) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LadderTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LadderTransferError::InvalidPayload)?;

        Ok(Self {
            lines,
            levels,
            rungs: decoded.rungs,
            labels: decoded.labels,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    rungs: Vec<Rung>,
    labels: Vec<OutcomeLabel>,
}

/// Errors that can occur while decoding ladder share codes.
#[derive(Debug)]
pub(crate) enum LadderTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    MissingVersion,
    /// The encoded snapshot did not include board dimensions.
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The board dimensions could not be parsed from the encoded snapshot.
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for LadderTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share code was empty"),
            Self::MissingPrefix => write!(f, "share code is missing the prefix"),
            Self::MissingVersion => write!(f, "share code is missing the version"),
            Self::MissingDimensions => write!(f, "share code is missing the board dimensions"),
            Self::MissingPayload => write!(f, "share code is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share version '{version}' is not supported")
            }
            Self::InvalidDimensions(dimensions) => {
                write!(f, "could not parse board dimensions '{dimensions}'")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode share payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse share payload: {error}")
            }
        }
    }
}

impl Error for LadderTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LadderTransferError> {
    let (lines, levels) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| LadderTransferError::InvalidDimensions(dimensions.to_owned()))?;

    let lines = lines
        .trim()
        .parse::<u32>()
        .map_err(|_| LadderTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let levels = levels
        .trim()
        .parse::<u32>()
        .map_err(|_| LadderTransferError::InvalidDimensions(dimensions.to_owned()))?;

    if lines == 0 || levels == 0 {
        return Err(LadderTransferError::InvalidDimensions(
            dimensions.to_owned(),
        ));
    }

    Ok((lines, levels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amida_core::{LevelIndex, LineIndex};

    #[test]
    fn round_trip_empty_ladder() {
        let snapshot = LadderSnapshot {
            lines: 2,
            levels: 1,
            rungs: Vec::new(),
            labels: vec![OutcomeLabel::filler(), OutcomeLabel::filler()],
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:2x1:")));

        let decoded = LadderSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn round_trip_populated_ladder() {
        let rungs = vec![
            Rung::new(LevelIndex::new(1), LineIndex::new(0)),
            Rung::new(LevelIndex::new(4), LineIndex::new(2)),
        ];
        let snapshot = LadderSnapshot {
            lines: 4,
            levels: 20,
            rungs,
            labels: vec![
                OutcomeLabel::new("winner"),
                OutcomeLabel::new("blank"),
                OutcomeLabel::filler(),
                OutcomeLabel::filler(),
            ],
        };

        let encoded = snapshot.encode();
        assert!(encoded.starts_with(&format!("{SNAPSHOT_HEADER}:4x20:")));

        let decoded = LadderSnapshot::decode(&encoded).expect("snapshot decodes");
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn decode_rejects_foreign_prefixes() {
        let error = LadderSnapshot::decode("lotto:v1:4x20:e30").expect_err("prefix must match");
        assert!(matches!(error, LadderTransferError::InvalidPrefix(_)));
    }

    #[test]
    fn decode_rejects_unsupported_versions() {
        let error = LadderSnapshot::decode("amida:v9:4x20:e30").expect_err("version must match");
        assert!(matches!(error, LadderTransferError::UnsupportedVersion(_)));
    }

    #[test]
    fn decode_rejects_malformed_dimensions() {
        let error =
            LadderSnapshot::decode("amida:v1:wide:e30").expect_err("dimensions must parse");
        assert!(matches!(error, LadderTransferError::InvalidDimensions(_)));

        let error =
            LadderSnapshot::decode("amida:v1:0x5:e30").expect_err("zero rails must be rejected");
        assert!(matches!(error, LadderTransferError::InvalidDimensions(_)));
    }

    #[test]
    fn decode_rejects_truncated_codes() {
        assert!(matches!(
            LadderSnapshot::decode("   "),
            Err(LadderTransferError::EmptyPayload),
        ));
        assert!(matches!(
            LadderSnapshot::decode("amida:v1:4x20"),
            Err(LadderTransferError::MissingPayload),
        ));
    }

    #[test]
    fn decode_rejects_corrupted_payloads() {
        let error = LadderSnapshot::decode("amida:v1:4x20:!!!")
            .expect_err("invalid base64 must be rejected");
        assert!(matches!(error, LadderTransferError::InvalidEncoding(_)));

        let not_json = STANDARD_NO_PAD.encode(b"not a snapshot");
        let error = LadderSnapshot::decode(&format!("amida:v1:4x20:{not_json}"))
            .expect_err("non-snapshot json must be rejected");
        assert!(matches!(error, LadderTransferError::InvalidPayload(_)));
    }
}
