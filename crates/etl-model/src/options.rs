//! Run-level options for the cleaning pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the pipeline does when one table fails to clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run on the first failing table.
    #[default]
    FailFast,
    /// Log the failure, leave the table out of the results and keep going.
    SkipOnError,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail_fast",
            FailurePolicy::SkipOnError => "skip_on_error",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options controlling a cleaning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningOptions {
    pub failure_policy: FailurePolicy,

    /// Keep rows removed by lifecycle validation as a quarantine frame.
    /// When off, they are only counted.
    pub keep_rejected: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            keep_rejected: true,
        }
    }
}

impl CleaningOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_fast() -> Self {
        Self::default().with_failure_policy(FailurePolicy::FailFast)
    }

    pub fn skip_on_error() -> Self {
        Self::default().with_failure_policy(FailurePolicy::SkipOnError)
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    #[must_use]
    pub fn with_keep_rejected(mut self, keep: bool) -> Self {
        self.keep_rejected = keep;
        self
    }
}
