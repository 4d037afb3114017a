//! Mandatory-presence checker
//!
//! Corresponds to §4.6. A read-only query used by the data-validation
//! collaborator: given a schema subtree and optionally a data tree, walk
//! the subtree enforcing RFC 6020 §7.6.5 and §7.9.4. The walk never
//! mutates the schema — it only asks the data callback whether an
//! instance of a given node is present. Grounded on the same free-function-
//! over-`&Context` shape as `resolver.rs`'s discharge functions, since this
//! is likewise a pure query rather than a stateful pass.

use crate::context::Context;
use crate::flags::NodeFlags;
use crate::model::{NodeHandle, NodeKind, NodePayload};

/// Caller-supplied oracle: does an instance of `node` exist under the data
/// node `parent_instance` addresses? `parent_instance` is `None` at the
/// document root. The core never inspects data instances itself (§1
/// "semantic validation of data trees" is out of scope) — it only asks.
pub trait DataPresence {
    /// How many sibling instances of `node` exist under `parent_instance`.
    /// For a leaf/container/anyxml this is 0 or 1; for a list/leaf-list it
    /// may be any count.
    fn instance_count(&self, node: NodeHandle, parent_instance: Option<&str>) -> usize;

    /// Which case of `choice` (if any) has an instance under
    /// `parent_instance`. Returns the selected `case`'s handle.
    fn selected_case(&self, choice: NodeHandle, parent_instance: Option<&str>) -> Option<NodeHandle>;
}

/// A no-data oracle: every node reports zero instances. Useful for
/// schema-only checks (e.g. "is this schema even satisfiable with an
/// empty data tree") and for tests.
pub struct NoData;

impl DataPresence for NoData {
    fn instance_count(&self, _node: NodeHandle, _parent_instance: Option<&str>) -> usize {
        0
    }
    fn selected_case(&self, _choice: NodeHandle, _parent_instance: Option<&str>) -> Option<NodeHandle> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub node: NodeHandle,
    pub reason: ViolationReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    MissingMandatory,
    TooFewElements { min: u32, found: usize },
    TooManyElements { max: u32, found: usize },
    ChoiceNotSelected,
}

/// Walk `root`'s subtree (inclusive) and return the first violation found,
/// or `None` if the subtree satisfies mandatory-presence constraints.
/// `parent_instance` addresses the data-tree ancestor `root` is checked
/// under (`None` at the document root).
pub fn check(
    ctx: &Context,
    root: NodeHandle,
    parent_instance: Option<&str>,
    data: &dyn DataPresence,
) -> Option<Violation> {
    check_node(ctx, root, parent_instance, data)
}

fn check_node(
    ctx: &Context,
    node: NodeHandle,
    parent_instance: Option<&str>,
    data: &dyn DataPresence,
) -> Option<Violation> {
    let n = ctx.node(node);
    if ctx.is_disabled(node, crate::context::Recursive::None).is_some() {
        // A disabled node (if-feature false) contributes no constraint.
        return None;
    }

    match n.kind() {
        NodeKind::Leaf => {
            if n.flags.contains(NodeFlags::MANDATORY) && data.instance_count(node, parent_instance) == 0 {
                return Some(Violation { node, reason: ViolationReason::MissingMandatory });
            }
            None
        }
        NodeKind::Anyxml => {
            let mandatory = matches!(&n.payload, NodePayload::Anyxml(d) if d.mandatory);
            if mandatory && data.instance_count(node, parent_instance) == 0 {
                return Some(Violation { node, reason: ViolationReason::MissingMandatory });
            }
            None
        }
        NodeKind::LeafList => {
            let (min, max) = match &n.payload {
                NodePayload::LeafList(d) => (d.min_elements, d.max_elements),
                _ => unreachable!(),
            };
            check_cardinality(node, parent_instance, min, max, data)
        }
        NodeKind::List => {
            let (min, max) = match &n.payload {
                NodePayload::List(d) => (d.min_elements, d.max_elements),
                _ => unreachable!(),
            };
            if let Some(v) = check_cardinality(node, parent_instance, min, max, data) {
                return Some(v);
            }
            // §7.6.5: a mandatory descendant under a list is only checked
            // per-instance by the data-validation collaborator; the schema
            // walk itself only descends into the list's own child schema
            // once, since every instance shares the same schema.
            check_children(ctx, node, parent_instance, data)
        }
        NodeKind::Container => {
            let presence = matches!(&n.payload, NodePayload::Container(d) if d.presence.is_some());
            if presence && data.instance_count(node, parent_instance) == 0 {
                // §7.9.4: an absent presence container vacuously satisfies
                // its descendants' mandatory constraints.
                return None;
            }
            check_children(ctx, node, parent_instance, data)
        }
        NodeKind::Choice => {
            if n.flags.contains(NodeFlags::MANDATORY) {
                match data.selected_case(node, parent_instance) {
                    Some(case) => check_children(ctx, case, parent_instance, data),
                    None => Some(Violation { node, reason: ViolationReason::ChoiceNotSelected }),
                }
            } else {
                match data.selected_case(node, parent_instance) {
                    Some(case) => check_children(ctx, case, parent_instance, data),
                    None => None,
                }
            }
        }
        NodeKind::Case => check_children(ctx, node, parent_instance, data),
        // Structural-only kinds carry no mandatory-presence constraint of
        // their own; `uses`/`grouping` never reach here post-expansion,
        // `augment` is already spliced, rpc/input/output/notification are
        // checked by their own entry points rather than this walk.
        NodeKind::Uses
        | NodeKind::Grouping
        | NodeKind::Rpc
        | NodeKind::Input
        | NodeKind::Output
        | NodeKind::Notification
        | NodeKind::Augment => check_children(ctx, node, parent_instance, data),
    }
}

fn check_cardinality(
    node: NodeHandle,
    parent_instance: Option<&str>,
    min: u32,
    max: Option<u32>,
    data: &dyn DataPresence,
) -> Option<Violation> {
    let found = data.instance_count(node, parent_instance);
    if found < min as usize {
        return Some(Violation { node, reason: ViolationReason::TooFewElements { min, found } });
    }
    if let Some(max) = max {
        if found > max as usize {
            return Some(Violation { node, reason: ViolationReason::TooManyElements { max, found } });
        }
    }
    None
}

fn check_children(
    ctx: &Context,
    node: NodeHandle,
    parent_instance: Option<&str>,
    data: &dyn DataPresence,
) -> Option<Violation> {
    let head = ctx.node(node).child_head;
    for child in ctx.iter_siblings(head) {
        if let Some(v) = check_node(ctx, child, parent_instance, data) {
            return Some(v);
        }
    }
    None
}
