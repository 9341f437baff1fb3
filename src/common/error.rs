//! Error types for the automation driver
//!
//! Every driver call that can time out has its own variant so a failed
//! scenario reports *which* precondition was never satisfied.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the driver
#[derive(Error, Debug)]
pub enum Error {
    // === Lifecycle Errors ===
    #[error("Target did not show '{reference}' within {waited_ms} ms after launch")]
    LaunchTimeout { reference: String, waited_ms: u64 },

    #[error("Target failed to launch: {0}")]
    LaunchFailure(String),

    #[error("Target process exited unexpectedly ({0})")]
    TargetExited(String),

    // === Action Errors ===
    #[error("Switch to '{mode}' not confirmed within {waited_ms} ms")]
    ModeSwitchFailure { mode: String, waited_ms: u64 },

    #[error("'{reference}' not found on screen within {waited_ms} ms")]
    TargetNotReady { reference: String, waited_ms: u64 },

    #[error("Target rejected value '{value}' for attribute {field}")]
    ValidationRejected { field: usize, value: String },

    // === History Errors ===
    #[error("Cannot {action} {requested} step(s): only {available} available")]
    HistoryExhausted {
        action: &'static str,
        requested: usize,
        available: usize,
    },

    #[error("{action} step {step} of {count} was not confirmed by the target")]
    HistoryStepUnconfirmed {
        action: &'static str,
        step: usize,
        count: usize,
    },

    // === Persistence Errors ===
    #[error("Saving {what} not confirmed within {waited_ms} ms")]
    SaveTimeout { what: String, waited_ms: u64 },

    // === Backend Errors ===
    #[error("Input injection failed: {0}")]
    Input(String),

    #[error("Locator backend failed: {0}")]
    Locator(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a target-not-ready error for a reference key
    pub fn not_ready(reference: &str, waited: std::time::Duration) -> Self {
        Self::TargetNotReady {
            reference: reference.to_string(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    /// Create a mode switch failure
    pub fn mode_switch(mode: &str, waited: std::time::Duration) -> Self {
        Self::ModeSwitchFailure {
            mode: mode.to_string(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    /// Stable code for reports and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::LaunchTimeout { .. } => "LAUNCH_TIMEOUT",
            Error::LaunchFailure(_) => "LAUNCH_FAILURE",
            Error::TargetExited(_) => "TARGET_EXITED",
            Error::ModeSwitchFailure { .. } => "MODE_SWITCH_FAILURE",
            Error::TargetNotReady { .. } => "TARGET_NOT_READY",
            Error::ValidationRejected { .. } => "VALIDATION_REJECTED",
            Error::HistoryExhausted { .. } => "HISTORY_EXHAUSTED",
            Error::HistoryStepUnconfirmed { .. } => "HISTORY_STEP_UNCONFIRMED",
            Error::SaveTimeout { .. } => "SAVE_TIMEOUT",
            Error::Input(_) => "INPUT",
            Error::Locator(_) => "LOCATOR",
            Error::Config(_) | Error::ConfigParse(_) | Error::Yaml(_) => "CONFIG",
            Error::Io(_) => "IO",
            Error::FileRead { .. } => "FILE_READ",
            Error::Json(_) => "JSON",
            Error::TestAssertion(_) => "TEST_ASSERTION",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error must abort the scenario
    ///
    /// A rejected value is an expected application outcome, everything
    /// else ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::ValidationRejected { .. })
    }
}
