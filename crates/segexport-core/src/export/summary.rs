use serde::Serialize;

use crate::config::ReadFailurePolicy;

/// A region whose bytes could not be read during export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionReadFailure {
    pub name: String,
    pub start: u64,
    pub size: u64,
    pub message: String,
    /// What was written to the container in place of the data.
    pub resolution: ReadFailurePolicy,
}

/// Counts and non-fatal errors collected during one export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub program: String,
    pub policy: ReadFailurePolicy,
    /// Regions reported by the source, including uninitialized ones.
    pub regions_total: usize,
    pub regions_uninitialized: usize,
    /// Region headers written to the container.
    pub regions_exported: usize,
    /// Bytes in the region data section.
    pub data_size: u64,
    pub symbols_total: usize,
    pub symbols_default_skipped: usize,
    pub symbols_exported: usize,
    pub symbol_payload_size: usize,
    pub total_size: usize,
    pub read_failures: Vec<RegionReadFailure>,
}

impl ExportSummary {
    /// True when every region header is followed by exactly its size in data.
    ///
    /// Only false when regions failed to read under `ReadFailurePolicy::Omit`.
    pub fn is_aligned(&self) -> bool {
        self.read_failures
            .iter()
            .all(|f| f.resolution != ReadFailurePolicy::Omit)
    }
}

/// The finished container and what went into it.
#[derive(Debug, Clone)]
pub struct ExportStream {
    pub bytes: Vec<u8>,
    pub summary: ExportSummary,
}

impl ExportStream {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
