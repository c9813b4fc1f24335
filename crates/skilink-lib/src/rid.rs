//! Allocation of routing identifiers (`r_id`).
//!
//! An r_id is a prefix digit for the feature category, the zero-padded
//! identifier of the owning feature and a zero-padded sequence number. One
//! allocator is shared by every stage of a run; a taken value is probed upwards
//! until a free one is found.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Left-pad a number with zeros to `digits` characters. Longer values are kept
/// as they are.
pub fn pad(value: u64, digits: usize) -> String {
    format!("{value:0digits$}")
}

fn parse_id(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| Error::InvalidIdentifier {
            value: value.to_string(),
        })
}

/// Hands out r_ids that are unique within one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct RidAllocator {
    assigned: HashSet<u64>,
}

impl RidAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `base`, or the next free value above it.
    pub fn allocate(&mut self, base: u64) -> u64 {
        let mut rid = base;
        while !self.assigned.insert(rid) {
            rid += 1;
        }
        rid
    }

    /// Allocate the r_id of a segment: prefix, five-digit feature id and
    /// three-digit sequence number.
    pub fn segment(&mut self, prefix: char, feature_id: &str, sequence: u64) -> Result<u64> {
        let id = parse_id(feature_id)?;
        let base = parse_id(&format!("{prefix}{}{}", pad(id, 5), pad(sequence, 3)))?;
        Ok(self.allocate(base))
    }

    /// Allocate the r_id of a link from the category prefix and the start
    /// feature id, in the segment layout with sequence `1`.
    pub fn link(&mut self, prefix: char, gid_start: &str) -> Result<u64> {
        self.segment(prefix, gid_start, 1)
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
