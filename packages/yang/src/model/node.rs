//! Schema node
//!
//! Corresponds to §3 "Schema node". One tagged-variant type with a shared
//! header (name, flags, parent, sibling links, module) and a per-variant
//! payload, per the design notes ("Dynamic polymorphism over node kinds").
//! Sibling order is the canonical cyclic-prev ring described in §3 and
//! tested in §8: `head.prev == tail`, `tail.next == None`.

use crate::intern::YangStr;
use crate::model::feature::IfFeature;
use crate::model::ids::{ModuleId, NodeHandle, TypedefId};
use crate::model::restriction::{Must, When};
use crate::model::types::Type;
use crate::flags::NodeFlags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    Anyxml,
    Choice,
    Case,
    Uses,
    Grouping,
    Rpc,
    Input,
    Output,
    Notification,
    Augment,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerData {
    pub presence: Option<YangStr>,
    pub typedefs: Vec<TypedefId>,
}

#[derive(Debug, Clone, Default)]
pub struct ListData {
    pub typedefs: Vec<TypedefId>,
    pub raw_keys: Option<YangStr>,
    pub keys: Vec<NodeHandle>,
    pub raw_unique: Vec<YangStr>,
    pub unique: Vec<Vec<NodeHandle>>,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
}

#[derive(Debug, Clone)]
pub struct LeafData {
    pub ty: Type,
    pub default: Option<YangStr>,
    pub units: Option<YangStr>,
    /// Non-owning back-edges: every leafref whose resolved target is this
    /// leaf (§3 "Lifecycle": "Leafref back-index sets are owned by their
    /// target leaves"). Populated by the resolver, consulted if this leaf
    /// is ever removed so dangling leafrefs can be invalidated.
    pub leafref_backlinks: Vec<NodeHandle>,
}

#[derive(Debug, Clone)]
pub struct LeafListData {
    pub ty: Type,
    pub defaults: Vec<YangStr>,
    pub units: Option<YangStr>,
    pub min_elements: u32,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnyxmlData {
    pub mandatory: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChoiceData {
    pub raw_default: Option<YangStr>,
    pub default_case: Option<NodeHandle>,
}

/// `uses` instantiates a grouping; `grouping_target` is set once the
/// grouping lookup succeeds, before expansion runs (§4.3 "Uses expansion").
#[derive(Debug, Clone, Default)]
pub struct UsesData {
    pub grouping_name: YangStr,
    pub grouping_target: Option<NodeHandle>,
    pub refines: Vec<Refine>,
}

#[derive(Debug, Clone)]
pub struct Refine {
    pub target_path: YangStr,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub presence: Option<YangStr>,
    pub default: Option<YangStr>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub added_must: Vec<Must>,
}

#[derive(Debug, Clone, Default)]
pub struct AugmentData {
    pub target_path: YangStr,
    pub target: Option<NodeHandle>,
    pub when: Option<When>,
    /// Set once the post-processor has spliced this augment's children
    /// into `target` (§4.4, §8 "Re-applying a resolved augment is
    /// forbidden").
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub enum NodePayload {
    Container(ContainerData),
    List(ListData),
    Leaf(LeafData),
    LeafList(LeafListData),
    Anyxml(AnyxmlData),
    Choice(ChoiceData),
    Case,
    Uses(UsesData),
    Grouping,
    Rpc,
    Input,
    Output,
    Notification,
    Augment(AugmentData),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Container(_) => NodeKind::Container,
            NodePayload::List(_) => NodeKind::List,
            NodePayload::Leaf(_) => NodeKind::Leaf,
            NodePayload::LeafList(_) => NodeKind::LeafList,
            NodePayload::Anyxml(_) => NodeKind::Anyxml,
            NodePayload::Choice(_) => NodeKind::Choice,
            NodePayload::Case => NodeKind::Case,
            NodePayload::Uses(_) => NodeKind::Uses,
            NodePayload::Grouping => NodeKind::Grouping,
            NodePayload::Rpc => NodeKind::Rpc,
            NodePayload::Input => NodeKind::Input,
            NodePayload::Output => NodeKind::Output,
            NodePayload::Notification => NodeKind::Notification,
            NodePayload::Augment(_) => NodeKind::Augment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: YangStr,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub flags: NodeFlags,
    pub module: ModuleId,
    pub parent: Option<NodeHandle>,
    /// Non-`None` once attached to a sibling ring, even for a lone child —
    /// a singleton ring's `prev` points at itself (§3 invariant).
    pub prev: Option<NodeHandle>,
    pub next: Option<NodeHandle>,
    pub child_head: Option<NodeHandle>,
    pub features: Vec<IfFeature>,
    pub musts: Vec<Must>,
    pub when: Option<When>,
    pub payload: NodePayload,
    pub private: Option<usize>,
}

impl SchemaNode {
    pub fn new(name: YangStr, module: ModuleId, payload: NodePayload) -> Self {
        SchemaNode {
            name,
            description: None,
            reference: None,
            flags: NodeFlags::empty(),
            module,
            parent: None,
            prev: None,
            next: None,
            child_head: None,
            features: Vec::new(),
            musts: Vec::new(),
            when: None,
            payload,
            private: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    /// Data nodes participate in config/state inheritance and mandatory
    /// presence checks; `uses`/`grouping`/`augment` are structural-only.
    pub fn is_data_node(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Container
                | NodeKind::List
                | NodeKind::Leaf
                | NodeKind::LeafList
                | NodeKind::Anyxml
                | NodeKind::Choice
                | NodeKind::Case
        )
    }
}
