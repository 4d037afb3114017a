//! Node and deviate flag bitsets
//!
//! An enum-of-bits idiom (cf. `InputFlags`/`SelectorFlags`-style flag sets)
//! built on the `bitflags` crate, which the workspace already depends on
//! and which the bitset attribute of §3 "Schema node" maps onto directly.

use bitflags::bitflags;

bitflags! {
    /// Shared attribute bitset on every schema node (§3).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u32 {
        /// `config true` (unset means `config false`).
        const CONFIG_W       = 1 << 0;
        const CONFIG_SET      = 1 << 1;
        const MANDATORY       = 1 << 2;
        const STATUS_CURRENT  = 1 << 3;
        const STATUS_DEPRECATED = 1 << 4;
        const STATUS_OBSOLETE = 1 << 5;
        /// Flags relationships created implicitly (e.g. leaf-list key
        /// sentinel, grouping-expansion copies) rather than from source.
        const AUTO_ASSIGNED   = 1 << 6;
        /// Access-control bit inherited per §4.4 "Access-control inheritance".
        const ACCESS_CONTROL  = 1 << 7;
        /// Set on an ancestor container/list once any `config false`
        /// descendant is discovered (§4.4 "Status inheritance").
        const HAS_STATE_DESCENDANT = 1 << 8;
        /// This node was spliced in by an applied augment.
        const FROM_AUGMENT    = 1 << 9;
    }
}

impl NodeFlags {
    pub fn is_config(&self) -> bool {
        self.contains(NodeFlags::CONFIG_W)
    }

    pub fn has_explicit_config(&self) -> bool {
        self.contains(NodeFlags::CONFIG_SET)
    }

    pub fn status(&self) -> Status {
        if self.contains(NodeFlags::STATUS_OBSOLETE) {
            Status::Obsolete
        } else if self.contains(NodeFlags::STATUS_DEPRECATED) {
            Status::Deprecated
        } else {
            Status::Current
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Current,
    Deprecated,
    Obsolete,
}

bitflags! {
    /// Which facets a `deviate add/replace/delete` record carries (§3
    /// "Deviation"). Kept separate from the optional field values
    /// themselves so "not present" and "present but default" are distinct.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DeviateFields: u32 {
        const UNITS        = 1 << 0;
        const DEFAULT      = 1 << 1;
        const CONFIG       = 1 << 2;
        const MANDATORY    = 1 << 3;
        const MIN_ELEMENTS = 1 << 4;
        const MAX_ELEMENTS = 1 << 5;
        const TYPE         = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviateKind {
    NotSupported,
    Add,
    Replace,
    Delete,
}
