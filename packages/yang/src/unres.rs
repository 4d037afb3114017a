//! Deferred-work set ("unres")
//!
//! Corresponds to §4.2. A typed collection of cross-reference obligations
//! that cannot be discharged while the builder is still running because
//! their targets may not exist yet. Each entry is conceptually an opaque
//! `(kind, subject, detail)` tuple ("a single ordered collection of
//! sum-typed entries; the resolver pattern-matches on the kind"), built
//! here as a plain enum instead of a parallel-array-with-sentinels
//! representation.

use crate::intern::YangStr;
use crate::model::{FeatureHandle, IdentityHandle, ModuleId, NodeHandle, TypedefId};

/// Addresses a [`crate::model::Type`] value that isn't itself independently
/// arena-allocated: it lives embedded in a leaf, a leaf-list, a typedef, or
/// nested inside a union. Needed because unres entries must name "this
/// type" without owning it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeLocation {
    Leaf(NodeHandle),
    LeafList(NodeHandle),
    Typedef(ModuleId, TypedefId),
    UnionMember(Box<TypeLocation>, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSubject {
    Feature(FeatureHandle),
    Node(NodeHandle),
}

#[derive(Debug, Clone)]
pub enum UnresEntry {
    /// `iffeat`: an if-feature predicate on a feature or a schema node.
    IfFeature { subject: FeatureSubject, slot: usize, raw_name: YangStr },
    /// `ident-base`: an identity's `base` statement.
    IdentBase { subject: IdentityHandle, slot: usize, raw_name: YangStr },
    /// `type-der`: a data-node type's derivation.
    TypeDer { subject: TypeLocation },
    /// `type-der-tpdf`: a type nested inside a typedef's own definition.
    TypeDerTpdf { subject: TypeLocation },
    /// `type-leafref`: a leafref's `path`.
    TypeLeafref { subject: TypeLocation, parent: NodeHandle },
    /// `type-identref`: an identityref's `base`.
    TypeIdentref { subject: TypeLocation, raw_name: YangStr },
    /// `type-dflt`: a type's textual default, validated once the type
    /// itself is resolved.
    TypeDflt { subject: TypeLocation, default: YangStr },
    /// `list-keys`: a list's `key` argument.
    ListKeys { subject: NodeHandle, raw_keys: YangStr },
    /// `list-unique`: a list's `unique` argument.
    ListUnique { subject: NodeHandle, raw_unique: YangStr },
    /// `uses`: a grouping instantiation awaiting expansion.
    Uses { subject: NodeHandle },
    /// `choice-dflt`: a choice's default-case selection.
    ChoiceDflt { subject: NodeHandle, raw_case: YangStr },
    /// `augment`: resolves an `augment`'s absolute target path. §3
    /// "Augment" lists "resolved target node pointer (populated by
    /// resolver)" as an attribute but the illustrative kind table in §4.2
    /// doesn't name it explicitly; grounded on that attribute description
    /// plus §4.4 running strictly after the resolver's fixed point, this
    /// crate adds the kind under the same obligation mechanism.
    AugmentTarget { subject: NodeHandle },
    /// `deviation`: resolves a `deviation`'s absolute target path, same
    /// rationale as `AugmentTarget`.
    DeviationTarget { module: ModuleId, deviation: usize },
}

impl UnresEntry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            UnresEntry::IfFeature { .. } => "iffeat",
            UnresEntry::IdentBase { .. } => "ident-base",
            UnresEntry::TypeDer { .. } => "type-der",
            UnresEntry::TypeDerTpdf { .. } => "type-der-tpdf",
            UnresEntry::TypeLeafref { .. } => "type-leafref",
            UnresEntry::TypeIdentref { .. } => "type-identref",
            UnresEntry::TypeDflt { .. } => "type-dflt",
            UnresEntry::ListKeys { .. } => "list-keys",
            UnresEntry::ListUnique { .. } => "list-unique",
            UnresEntry::Uses { .. } => "uses",
            UnresEntry::ChoiceDflt { .. } => "choice-dflt",
            UnresEntry::AugmentTarget { .. } => "augment",
            UnresEntry::DeviationTarget { .. } => "deviation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dependency not yet available; try again next pass.
    Pending,
    /// Discharged; remove from the set.
    Resolved,
    /// Malformed, cyclic, or target definitively missing; remove from the
    /// set but record a diagnostic.
    Failed,
}

/// The deferred-work set itself. Duplicate insertion is explicitly allowed
/// per §4.2 — grouping expansion relies on it to hook the duplicated
/// obligations of a grouping's copied children.
#[derive(Default)]
pub struct UnresSet {
    entries: Vec<Option<UnresEntry>>,
}

impl UnresSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: UnresEntry) {
        self.entries.push(Some(entry));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// The entries still alive after the fixed-point loop gives up — each
    /// contributes one `unresolved-reference` diagnostic (§4.3 "every
    /// failed entry contributes one diagnostic citing its subject").
    pub fn remaining(&self) -> impl Iterator<Item = &UnresEntry> {
        self.entries.iter().filter_map(|e| e.as_ref())
    }

    /// Drain entries in insertion order, calling `discharge` on each still-
    /// live one. `discharge` returns the outcome and, for `Resolved`, may
    /// push new entries for e.g. a `uses` expansion's copied children —
    /// those land after the current pass's cursor and are picked up next
    /// pass, guaranteeing the "strictly reduces the set, no discharge
    /// creates obligations at equal-or-greater depth" convergence argument
    /// of §4.3.
    pub fn run_pass<F>(&mut self, mut discharge: F) -> PassSummary
    where
        F: FnMut(&UnresEntry, &mut UnresSet) -> (Outcome, Option<crate::diagnostics::Diagnostic>),
    {
        let live: Vec<usize> =
            self.entries.iter().enumerate().filter(|(_, e)| e.is_some()).map(|(i, _)| i).collect();
        let mut summary = PassSummary::default();
        for idx in live {
            let entry = match &self.entries[idx] {
                Some(e) => e.clone(),
                None => continue,
            };
            let mut appended = UnresSet::new();
            let (outcome, diag) = discharge(&entry, &mut appended);
            self.entries.extend(appended.entries);
            match outcome {
                Outcome::Pending => {}
                Outcome::Resolved => {
                    self.entries[idx] = None;
                    summary.discharged += 1;
                }
                Outcome::Failed => {
                    self.entries[idx] = None;
                    summary.discharged += 1;
                    summary.failures += 1;
                    if let Some(d) = diag {
                        summary.diagnostics.push(d);
                    }
                }
            }
        }
        summary
    }
}

#[derive(Default)]
pub struct PassSummary {
    pub discharged: usize,
    pub failures: usize,
    pub diagnostics: Vec<crate::diagnostics::Diagnostic>,
}
