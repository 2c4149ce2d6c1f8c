//! Opaque handle newtypes for all build cache entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! IDs are created by [`Arena::alloc`](crate::arena::Arena::alloc) and are only
//! meaningful for the store that issued them.

use crate::arena::Handle;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl Handle for $name {
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Handle to a project in the build cache.
    ProjectId
);

define_id!(
    /// Handle to a C++ source file (translation unit).
    SourceId
);

define_id!(
    /// Handle to a C++ header file.
    HeaderId
);

define_id!(
    /// Handle to a named C++ module.
    ModuleId
);

define_id!(
    /// Handle to a partition of a C++ module.
    PartitionId
);

define_id!(
    /// Handle to a planned build task.
    BuildTaskId
);

/// Opaque identity of a file entity that a build task can be attached to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum EntityKey {
    /// A source file.
    Source(SourceId),
    /// A header file.
    Header(HeaderId),
}

impl From<SourceId> for EntityKey {
    fn from(id: SourceId) -> Self {
        EntityKey::Source(id)
    }
}

impl From<HeaderId> for EntityKey {
    fn from(id: HeaderId) -> Self {
        EntityKey::Header(id)
    }
}
