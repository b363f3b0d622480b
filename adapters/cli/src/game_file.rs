#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use amida_core::{OutcomeEntry, OutcomeLabel};
use serde::Deserialize;
use thiserror::Error;

/// Optional TOML document describing a game setup.
///
/// Every field may be omitted; command-line flags take precedence over the
/// file, and built-in defaults cover whatever remains.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GameFile {
    /// Number of participants (vertical rails).
    pub lines: Option<u32>,
    /// Number of interior levels between the boundaries.
    pub levels: Option<u32>,
    /// Per-level rung probability in `[0.0, 1.0]`.
    pub density: Option<f32>,
    /// Prize labels and their counts, in display order.
    #[serde(default)]
    pub outcomes: Vec<GameFileOutcome>,
}

impl GameFile {
    /// Loads and parses a game file from disk.
    pub(crate) fn load(path: &Path) -> Result<Self, GameFileError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Single outcome entry as it appears in a game file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GameFileOutcome {
    /// Text awarded to matching participants.
    pub label: String,
    /// Number of participants that should receive the label.
    pub count: u32,
}

impl GameFileOutcome {
    /// Converts the file entry into the core outcome representation.
    #[must_use]
    pub(crate) fn to_entry(&self) -> OutcomeEntry {
        OutcomeEntry::new(OutcomeLabel::new(self.label.clone()), self.count)
    }
}

/// Errors that can occur while loading a game file.
#[derive(Debug, Error)]
pub(crate) enum GameFileError {
    /// The file could not be read from disk.
    #[error("could not read game file: {0}")]
    Io(#[from] std::io::Error),
    /// The file contents were not a valid game description.
    #[error("could not parse game file: {0}")]
    Parse(#[from] toml::de::Error),
}
