//! Arena records

use crate::types::{ArrayData, TypeId, Value};

/// Payload of a record
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FsBody {
    /// Slot vector laid out like the type's flattened feature table
    Features(Vec<Value>),
    /// Array elements
    Array(ArrayData),
}

/// One feature structure
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FsRecord {
    pub(crate) type_id: TypeId,
    pub(crate) body: FsBody,
}

impl FsRecord {
    pub(crate) fn slots(&self) -> Option<&[Value]> {
        match &self.body {
            FsBody::Features(values) => Some(values),
            FsBody::Array(_) => None,
        }
    }

    pub(crate) fn slot(&self, slot: usize) -> Option<&Value> {
        self.slots()?.get(slot)
    }

    pub(crate) fn slot_mut(&mut self, slot: usize) -> Option<&mut Value> {
        match &mut self.body {
            FsBody::Features(values) => values.get_mut(slot),
            FsBody::Array(_) => None,
        }
    }

    pub(crate) fn array(&self) -> Option<&ArrayData> {
        match &self.body {
            FsBody::Array(data) => Some(data),
            FsBody::Features(_) => None,
        }
    }
}
