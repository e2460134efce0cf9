//! Identifier types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a feature structure inside one graph.
///
/// Ids start at 1 and are never reused by the graph that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FsId(pub(crate) u32);

impl FsId {
    /// Numeric id, as written to exchange payloads
    pub fn get(self) -> u32 {
        self.0
    }

    /// Arena slot of the record
    pub(crate) fn slot(self) -> usize {
        (self.0 as usize).wrapping_sub(1)
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        FsId(slot as u32 + 1)
    }
}

impl fmt::Display for FsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FsId> for u32 {
    fn from(id: FsId) -> u32 {
        id.0
    }
}
