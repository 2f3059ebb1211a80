use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// What to emit for a region whose bytes cannot be read.
///
/// The failure is always logged and recorded in the export summary; the
/// policy only decides what the container carries for that region.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReadFailurePolicy {
    /// Keep the header and write `end - start` zero bytes in place of the data.
    ///
    /// Keeps headers and data aligned for loaders that walk the data
    /// section sequentially.
    #[default]
    ZeroFill,
    /// Keep the header and write no data for the region.
    ///
    /// Byte-compatible with the historical exporter, but a sequential
    /// loader will misplace every following region.
    Omit,
    /// Remove both the header and the data of the region.
    DropRegion,
}

/// Settings for a single export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub on_read_error: ReadFailurePolicy,
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the policy applied to regions whose bytes cannot be read
    pub fn with_read_failure_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.on_read_error = policy;
        self
    }
}
