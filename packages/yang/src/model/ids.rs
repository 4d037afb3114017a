//! Arena index types
//!
//! Per the design notes ("Cyclic/mutually referential graphs"): schema
//! entities live in per-module arenas (`Vec<T>`), and every cross-reference
//! — parent, sibling, leafref target, identity base — is an integer index
//! rather than a pointer. A [`NodeHandle`] additionally carries the owning
//! [`ModuleId`] because augment targets and leafref targets can live in a
//! different module's arena than the reference itself.

use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(ModuleId);
arena_id!(NodeId);
arena_id!(TypedefId);
arena_id!(IdentityId);
arena_id!(FeatureId);
arena_id!(AugmentId);
arena_id!(DeviationId);

/// A node address valid across the whole [`crate::context::Context`]:
/// which module's arena, and which slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub module: ModuleId,
    pub node: NodeId,
}

impl NodeHandle {
    pub fn new(module: ModuleId, node: NodeId) -> Self {
        NodeHandle { module, node }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureHandle {
    pub module: ModuleId,
    pub feature: FeatureId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityHandle {
    pub module: ModuleId,
    pub identity: IdentityId,
}
