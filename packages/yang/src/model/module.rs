//! §3 "Module"

use crate::intern::YangStr;
use crate::model::growable::Growable;
use crate::model::identity::Identity;
use crate::model::feature::Feature;
use crate::model::ids::{ModuleId, NodeHandle, NodeId, TypedefId};
use crate::model::node::SchemaNode;
use crate::model::typedef::Typedef;
use crate::model::deviation::Deviation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalFlag {
    None,
    TransitiveViaDeviation,
    DirectDeviator,
}

#[derive(Debug, Clone)]
pub struct Revision {
    pub date: YangStr,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
}

#[derive(Debug, Clone)]
pub struct Import {
    pub module_name: YangStr,
    pub prefix: YangStr,
    pub revision: Option<YangStr>,
    pub external: ExternalFlag,
    /// Populated once the context resolves the imported module.
    pub resolved: Option<ModuleId>,
}

#[derive(Debug, Clone)]
pub struct Include {
    pub submodule_name: YangStr,
    pub revision: Option<YangStr>,
    pub resolved: Option<ModuleId>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: YangStr,
    pub namespace: Option<YangStr>,
    pub prefix: Option<YangStr>,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub organization: Option<YangStr>,
    pub contact: Option<YangStr>,
    /// Newest first (§4.1 "Revision insertion").
    pub revisions: Vec<Revision>,
    pub imports: Vec<Import>,
    pub includes: Vec<Include>,
    pub typedefs: Growable<Typedef>,
    pub identities: Growable<Identity>,
    pub features: Growable<Feature>,
    pub deviations: Growable<Deviation>,
    /// Indices (into `nodes`) of top-level nodes of kind `Augment`.
    pub augments: Vec<NodeId>,
    /// Every schema node this module defines, including descendants of
    /// augments it declares. Arena-allocated per the design notes; cross-
    /// module references go through [`NodeHandle`].
    pub nodes: Growable<SchemaNode>,
    /// Head of the top-level data tree's sibling ring.
    pub data_head: Option<NodeHandle>,
    /// `belongs-to` target name if this module is a submodule; its content
    /// is grafted into that module during load rather than standing alone.
    pub belongs_to: Option<YangStr>,
    pub implemented: bool,
    /// Filesystem path recorded by `compile_from_path` (§6).
    pub source_path: Option<String>,
    /// Set once an externally-deviating module has a `direct-deviator`
    /// import pointed at this module (§4.4 "Deviation activation").
    pub is_deviated: bool,
    pub deviations_disabled: bool,
}

impl Module {
    pub fn new(name: YangStr) -> Self {
        Module {
            name,
            namespace: None,
            prefix: None,
            description: None,
            reference: None,
            organization: None,
            contact: None,
            revisions: Vec::new(),
            imports: Vec::new(),
            includes: Vec::new(),
            typedefs: Growable::new(),
            identities: Growable::new(),
            features: Growable::new(),
            deviations: Growable::new(),
            augments: Vec::new(),
            nodes: Growable::new(),
            data_head: None,
            belongs_to: None,
            implemented: false,
            source_path: None,
            is_deviated: false,
            deviations_disabled: false,
        }
    }

    pub fn is_submodule(&self) -> bool {
        self.belongs_to.is_some()
    }

    /// §4.1 "Revision insertion sorts by date descending on the fly: if the
    /// incoming date is newer than index 0, it is promoted to index 0 and
    /// the prior head slides outward."
    pub fn insert_revision(&mut self, revision: Revision) {
        if self.revisions.is_empty() || revision.date.as_str() > self.revisions[0].date.as_str() {
            self.revisions.insert(0, revision);
        } else {
            self.revisions.push(revision);
        }
    }

    pub fn latest_revision(&self) -> Option<&str> {
        self.revisions.first().map(|r| r.date.as_str())
    }

    pub fn find_typedef(&self, name: &str) -> Option<TypedefId> {
        self.typedefs
            .iter()
            .enumerate()
            .find(|(_, t)| t.name.as_str() == name)
            .map(|(i, _)| TypedefId(i as u32))
    }

    pub fn find_feature(&self, name: &str) -> Option<crate::model::ids::FeatureId> {
        self.features
            .iter()
            .enumerate()
            .find(|(_, f)| f.name.as_str() == name)
            .map(|(i, _)| crate::model::ids::FeatureId(i as u32))
    }

    pub fn find_identity(&self, name: &str) -> Option<crate::model::ids::IdentityId> {
        self.identities
            .iter()
            .enumerate()
            .find(|(_, d)| d.name.as_str() == name)
            .map(|(i, _)| crate::model::ids::IdentityId(i as u32))
    }

    pub fn find_prefix(&self, prefix: &str) -> Option<&Import> {
        self.imports.iter().find(|imp| imp.prefix.as_str() == prefix)
    }
}
