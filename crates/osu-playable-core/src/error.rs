//! Error types for osu-playable-core

use std::path::PathBuf;
use thiserror::Error;

use crate::mods::ModKind;

/// Main error type for beatmap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing or invalid format version header")]
    InvalidFormatVersion,

    #[error("Not an osu!standard beatmap (declared mode {mode})")]
    UnsupportedRuleset { mode: i32 },

    #[error("Incompatible mods: {first} cannot be combined with {second}")]
    IncompatibleMods { first: ModKind, second: ModKind },

    #[error("Beatmap file does not exist: {0}")]
    BeatmapNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for beatmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// A recoverable failure while parsing a single line of a beatmap file.
///
/// These are deliberately a separate type from [`Error`]: a bad line is
/// logged and dropped, while [`Error::Cancelled`] must always abort the
/// whole parse and can never be represented here.
#[derive(Error, Debug)]
pub enum ParseLineError {
    #[error("Missing ':' separator")]
    MissingSeparator,

    #[error("Invalid number in field '{field}': {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Expected at least {expected} fields, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    #[error("Unknown hit object type: {0}")]
    UnknownObjectType(u32),
}
