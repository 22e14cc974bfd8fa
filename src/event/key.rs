//! Routing key derived from an event type.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifies one event type for the lifetime of the process.
///
/// Equality and hashing use only the `TypeId`; the name is kept for logs.
#[derive(Clone, Copy)]
pub struct EventTypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl EventTypeKey {
    /// Compute the key for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` backing this key
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name, for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for EventTypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EventTypeKey {}

impl Hash for EventTypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for EventTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventTypeKey").field(&self.type_name).finish()
    }
}

impl fmt::Display for EventTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
