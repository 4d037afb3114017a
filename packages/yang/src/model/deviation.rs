//! §3 "Deviation"

use crate::flags::{DeviateFields, DeviateKind};
use crate::intern::YangStr;
use crate::model::ids::NodeHandle;
use crate::model::restriction::Must;
use crate::model::types::Type;

#[derive(Debug, Clone, Default)]
pub struct Deviate {
    pub kind: Option<DeviateKind>,
    pub fields: DeviateFields,
    pub units: Option<YangStr>,
    pub default: Option<YangStr>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub ty: Option<Type>,
    pub added_must: Vec<Must>,
    pub deleted_must: Vec<YangStr>,
    pub added_unique: Vec<YangStr>,
    pub deleted_unique: Vec<YangStr>,
    /// Target field values captured the instant before this record's
    /// fields were first applied, restricted to whatever `fields` names —
    /// the "before" picture the disable toggle (§6) restores.
    pub pristine: Option<Pristine>,
}

/// Snapshot of whichever target fields a [`Deviate`] touches, taken right
/// before its values are written onto the target node. Fields the
/// deviate's own `fields` bitset doesn't name are left at their defaults
/// and never read back.
#[derive(Debug, Clone, Default)]
pub struct Pristine {
    pub config_set: bool,
    pub config: bool,
    pub mandatory: bool,
    pub units: Option<YangStr>,
    pub default: Option<YangStr>,
    pub defaults: Vec<YangStr>,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
    pub ty: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct Deviation {
    pub target_path: YangStr,
    pub target: Option<NodeHandle>,
    pub deviates: Vec<Deviate>,
    /// The target node pulled out of its sibling ring by a `not-supported`
    /// deviate, kept alive for the round-trip toggle (§4.4 "Deviation
    /// activation", §8 round-trip property).
    pub original: Option<NodeHandle>,
    /// Whether `original` was its ring's head at the moment it was
    /// unlinked, so re-linking it on disable restores the same slot rather
    /// than just appending it back to the ring.
    pub original_was_head: bool,
}

impl Deviation {
    pub fn new(target_path: YangStr) -> Self {
        Deviation {
            target_path,
            target: None,
            deviates: Vec::new(),
            original: None,
            original_was_head: false,
        }
    }
}
