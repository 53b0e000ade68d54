use thiserror::Error;

use crate::models::ActivityType;

/// Completion payloads whose shape does not identify one activity type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("completion payload carries no activity data")]
    Missing,
    #[error("completion payload carries data for several activity types: {0:?}")]
    Ambiguous(Vec<ActivityType>),
    #[error("completion payload is {found:?} data but the activity is {declared:?}")]
    Mismatch {
        declared: ActivityType,
        found: ActivityType,
    },
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("imsmanifest.xml not found")]
    Missing,
    #[error("failed to parse manifest")]
    Parse,
    #[error("manifest declares no launchable resource")]
    NoLaunch,
    #[error("invalid package archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("failed to read package entry: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record names none of its relationships ({0})")]
    NoTarget(&'static str),
}
