//! Type model
//!
//! Corresponds to §3 "Type". A [`Type`] is a polymorphic value over the
//! YANG built-in base kinds plus variant-specific facets. `der` holds either
//! the resolved base/typedef chain or, during construction, a
//! [`PendingType`] placeholder the resolver discharges (unres kinds
//! `type-der` / `type-der-tpdf`, §4.2).

use smallvec::SmallVec;

use crate::intern::YangStr;
use crate::model::ids::{ModuleId, NodeHandle, TypedefId};
use crate::model::restriction::Restriction;
use crate::flags::NodeFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    Identityref,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Leafref,
    String,
    Union,
}

impl BaseType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            BaseType::Int8
                | BaseType::Int16
                | BaseType::Int32
                | BaseType::Int64
                | BaseType::Uint8
                | BaseType::Uint16
                | BaseType::Uint32
                | BaseType::Uint64
                | BaseType::Decimal64
        )
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, BaseType::String | BaseType::Binary)
    }

    /// §8 "A union resolves by recursively resolving each member; `empty`
    /// and `leafref` are forbidden as union members."
    pub fn allowed_as_union_member(&self) -> bool {
        !matches!(self, BaseType::Empty | BaseType::Leafref)
    }
}

/// A reference to a typedef, possibly in an imported module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedefRef {
    pub module: ModuleId,
    pub typedef: TypedefId,
}

/// Placeholder held by `der` until the resolver discharges `type-der` /
/// `type-der-tpdf`. Carries the raw `[prefix:]local` text as written, plus
/// whatever base-kind the builder could already infer locally (a bare
/// built-in keyword resolves its base kind immediately even though facet
/// copying is still deferred; a typedef reference has no known kind yet).
#[derive(Debug, Clone)]
pub struct PendingType {
    pub name: YangStr,
    pub known_base: Option<BaseType>,
}

#[derive(Debug, Clone)]
pub enum Derivation {
    Base(BaseType),
    Typedef(TypedefRef),
    Pending(PendingType),
}

/// §4.1's "array-typed attributes grow in fixed-size chunks" idiom, scaled
/// down: a `length`/`range` argument is almost always one or two `|`-joined
/// segments, so `SmallVec` keeps the common case off the heap entirely
/// instead of allocating a `Vec` for every restricted type.
#[derive(Debug, Clone, Default)]
pub struct LengthRestriction {
    /// Inclusive `(min, max)` segments; `min..=max` per comma-separated part
    /// of the `length` argument (`"0..10 | 20..max"`).
    pub ranges: SmallVec<[(u64, u64); 2]>,
}

#[derive(Debug, Clone, Default)]
pub struct RangeRestriction {
    pub ranges: SmallVec<[(i128, i128); 2]>,
}

#[derive(Debug, Clone)]
pub struct PatternRestriction {
    pub regex: YangStr,
    pub inverted: bool,
    pub restriction: Restriction,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: YangStr,
    pub value: i32,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone)]
pub struct BitValue {
    pub name: YangStr,
    pub position: u32,
    pub flags: NodeFlags,
}

#[derive(Debug, Clone, Default)]
pub struct LeafrefFacet {
    pub raw_path: Option<YangStr>,
    /// Populated by the resolver once the path resolves against the schema
    /// tree (§4.3 "Leafref"). `None` while inside a typedef or grouping body
    /// — those never resolve the path themselves (§4.3).
    pub target: Option<NodeHandle>,
    pub require_instance: bool,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityrefFacet {
    pub raw_bases: Vec<YangStr>,
    pub bases: Vec<crate::model::ids::IdentityHandle>,
}

#[derive(Debug, Clone)]
pub struct Type {
    pub der: Derivation,
    pub length: Option<LengthRestriction>,
    pub patterns: Vec<PatternRestriction>,
    pub range: Option<RangeRestriction>,
    /// `(fraction_digits, divisor)`, decimal64 only.
    pub fraction_digits: Option<(u8, u64)>,
    pub enums: Vec<EnumValue>,
    pub bits: Vec<BitValue>,
    pub leafref: LeafrefFacet,
    pub identityref: IdentityrefFacet,
    pub union_members: Vec<Type>,
    pub default: Option<YangStr>,
}

impl Type {
    pub fn pending(name: YangStr, known_base: Option<BaseType>) -> Self {
        Type {
            der: Derivation::Pending(PendingType { name, known_base }),
            length: None,
            patterns: Vec::new(),
            range: None,
            fraction_digits: None,
            enums: Vec::new(),
            bits: Vec::new(),
            leafref: LeafrefFacet::default(),
            identityref: IdentityrefFacet::default(),
            union_members: Vec::new(),
            default: None,
        }
    }

    pub fn builtin(base: BaseType) -> Self {
        Type {
            der: Derivation::Base(base),
            length: None,
            patterns: Vec::new(),
            range: None,
            fraction_digits: None,
            enums: Vec::new(),
            bits: Vec::new(),
            leafref: LeafrefFacet::default(),
            identityref: IdentityrefFacet::default(),
            union_members: Vec::new(),
            default: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self.der, Derivation::Pending(_))
    }
}
