//! Post-processor
//!
//! Corresponds to §4.4. Runs once the resolver reaches a fixed point with
//! no fatal residue: splices resolved augments, applies resolved
//! deviations, propagates access-control and status flags, and backs the
//! feature-enablement API (§6 `feature-enable`/`feature-disable`). Shaped
//! as several sequential `&mut` tree walks over the same structure, each
//! its own free function, rather than one monolithic "finalize" method.

use tracing::{trace, warn};

use crate::context::Context;
use crate::diagnostics::{BuildResult, Diagnostic, DiagnosticBag, ErrorKind};
use crate::flags::{DeviateFields, DeviateKind, NodeFlags};
use crate::model::{ExternalFlag, Import, ModuleId, NodeHandle, NodeKind, NodePayload};
use crate::unres::TypeLocation;

/// Runs every post-processing duty for `module_id`, in the order §4.4
/// lists them. Call once, after [`crate::resolver::Resolver::run`] returns
/// an empty (or warning-only) diagnostic bag.
pub fn run(ctx: &mut Context, module_id: ModuleId) -> DiagnosticBag {
    let mut bag = DiagnosticBag::new();
    graft_submodule(ctx, module_id, &mut bag);
    apply_augments(ctx, module_id, &mut bag);
    apply_deviations(ctx, module_id, &mut bag);
    propagate_access_control(ctx, module_id);
    propagate_status(ctx, module_id);
    bag
}

// ---------------------------------------------------------------------
// Submodule graft
// ---------------------------------------------------------------------

/// §3 "A submodule ... its data nodes are grafted into the main module's
/// data list during load". Runs before the augment splice so that an
/// augment declared in the main module which targets submodule content
/// resolves against a tree that already has it — provided the owning
/// main module is compiled *after* this submodule. A submodule compiled
/// after its main module has already finished post-processing can still
/// graft its own top-level nodes in, but an augment the main module
/// declared earlier against that content will already have failed to
/// resolve; that ordering constraint is inherent to compiling one module
/// per `compile_from_buffer` call rather than a whole-schema load.
fn graft_submodule(ctx: &mut Context, module_id: ModuleId, bag: &mut DiagnosticBag) {
    let owner_name = match ctx.module(module_id).belongs_to.clone() {
        Some(n) => n,
        None => return,
    };
    let main_id = match ctx.find_module(owner_name.as_str(), None) {
        Some(id) if id != module_id => id,
        _ => return, // owner not loaded yet; nothing to graft into
    };
    let children: Vec<NodeHandle> = {
        let head = ctx.module(module_id).data_head.take();
        ctx.iter_siblings(head).collect()
    };
    for child in children {
        if let Err(d) = link_module_sibling(ctx, main_id, child) {
            bag.push(d);
        }
    }
    trace!(submodule = ?module_id, main = ?main_id, "submodule grafted");
}

/// Like [`link_sibling`] but appends to a module's top-level `data_head`
/// ring instead of a node's `child_head` ring.
fn link_module_sibling(ctx: &mut Context, module_id: ModuleId, child: NodeHandle) -> BuildResult<()> {
    let name = ctx.node(child).name.clone();
    let head = ctx.module(module_id).data_head;
    for sibling in ctx.iter_siblings(head) {
        if ctx.node(sibling).name.as_str() == name.as_str() {
            return Err(Diagnostic::error(
                ErrorKind::DuplicateId,
                format!("main module already has a top-level node named '{name}'"),
            ));
        }
    }
    match head {
        None => {
            let n = ctx.node_mut(child);
            n.prev = Some(child);
            n.next = None;
            ctx.module_mut(module_id).data_head = Some(child);
        }
        Some(head_handle) => {
            let tail = ctx.node(head_handle).prev.expect("ring head always has prev");
            ctx.node_mut(tail).next = Some(child);
            let n = ctx.node_mut(child);
            n.prev = Some(tail);
            n.next = None;
            ctx.node_mut(head_handle).prev = Some(child);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Augment splice
// ---------------------------------------------------------------------

/// §4.4 "Augment splice": link each augment's children as additional
/// children of its resolved target, keeping the sibling cyclic-prev
/// invariant. A child's own `parent` field keeps pointing at the augment
/// node itself — [`Context::parent`] is what redirects that to the target
/// (§6 "across augments, returns the augment's target").
fn apply_augments(ctx: &mut Context, module_id: ModuleId, bag: &mut DiagnosticBag) {
    let augment_ids = ctx.module(module_id).augments.clone();
    for aug_id in augment_ids {
        let aug_handle = NodeHandle::new(module_id, aug_id);
        let (target, already_applied) = match &ctx.node(aug_handle).payload {
            NodePayload::Augment(d) => (d.target, d.applied),
            _ => continue,
        };
        if already_applied {
            // §8 "Re-applying a resolved augment is forbidden" — a no-op
            // rerun of post-processing, not a user error.
            continue;
        }
        let target = match target {
            Some(t) => t,
            None => continue, // already reported as unresolved-reference
        };
        let children: Vec<NodeHandle> = ctx.iter_siblings(ctx.node(aug_handle).child_head).collect();
        for child in children {
            if let Err(d) = link_sibling(ctx, target, child) {
                bag.push(d);
                continue;
            }
            apply_inherited_config(ctx, target, child);
        }
        if let NodePayload::Augment(d) = &mut ctx.node_mut(aug_handle).payload {
            d.applied = true;
        }
        trace!(target = ?target, "augment applied");
    }
}

/// §3 invariant: data-node names unique per sibling scope. Splicing can
/// introduce a name clash the builder never had a chance to check.
fn link_sibling(ctx: &mut Context, parent: NodeHandle, child: NodeHandle) -> BuildResult<()> {
    let name = ctx.node(child).name.clone();
    let head = ctx.node(parent).child_head;
    for sibling in ctx.iter_siblings(head) {
        if ctx.node(sibling).name.as_str() == name.as_str() {
            return Err(Diagnostic::error(
                ErrorKind::DuplicateId,
                format!("augment target already has a child named '{name}'"),
            ));
        }
    }
    match head {
        None => {
            let n = ctx.node_mut(child);
            n.prev = Some(child);
            n.next = None;
            ctx.node_mut(parent).child_head = Some(child);
        }
        Some(head_handle) => {
            let tail = ctx.node(head_handle).prev.expect("ring head always has prev");
            ctx.node_mut(tail).next = Some(child);
            let n = ctx.node_mut(child);
            n.prev = Some(tail);
            n.next = None;
            ctx.node_mut(head_handle).prev = Some(child);
        }
    }
    Ok(())
}

fn apply_inherited_config(ctx: &mut Context, target: NodeHandle, child: NodeHandle) {
    let target_config = {
        let t = ctx.node(target);
        if t.is_data_node() { Some(t.flags.is_config()) } else { None }
    };
    let node = ctx.node_mut(child);
    if node.is_data_node() && !node.flags.has_explicit_config() {
        node.flags.set(NodeFlags::CONFIG_W, target_config.unwrap_or(true));
    }
}

// ---------------------------------------------------------------------
// Deviation activation
// ---------------------------------------------------------------------

fn apply_deviations(ctx: &mut Context, module_id: ModuleId, bag: &mut DiagnosticBag) {
    if ctx.module(module_id).deviations_disabled {
        return;
    }
    let count = ctx.module(module_id).deviations.len();
    for idx in 0..count {
        apply_one_deviation(ctx, module_id, idx, bag);
    }
}

fn apply_one_deviation(ctx: &mut Context, module_id: ModuleId, idx: usize, bag: &mut DiagnosticBag) {
    let target = ctx.module(module_id).deviations[idx].target;
    let target = match target {
        Some(t) => t,
        None => return, // already reported as unresolved-reference
    };
    if target.module != module_id {
        record_direct_deviator(ctx, module_id, target.module);
    }
    let deviate_count = ctx.module(module_id).deviations[idx].deviates.len();
    for d in 0..deviate_count {
        let kind = ctx.module(module_id).deviations[idx].deviates[d].kind;
        match kind {
            Some(DeviateKind::NotSupported) => {
                if is_list_key(ctx, target) {
                    bag.push(Diagnostic::error(
                        ErrorKind::IncompatibleDeviation,
                        "cannot deviate a list key leaf to 'not-supported'",
                    ));
                    continue;
                }
                if ctx.module(module_id).deviations[idx].original.is_none() {
                    let was_head = unlink_node(ctx, target);
                    ctx.module_mut(module_id).deviations[idx].original = Some(target);
                    ctx.module_mut(module_id).deviations[idx].original_was_head = was_head;
                }
            }
            Some(kind @ (DeviateKind::Add | DeviateKind::Replace | DeviateKind::Delete)) => {
                if let Err(diag) = apply_deviate_fields(ctx, module_id, idx, d, kind, target) {
                    bag.push(diag);
                }
            }
            None => {}
        }
    }
}

fn is_list_key(ctx: &Context, node: NodeHandle) -> bool {
    match ctx.node(node).parent {
        Some(p) => match &ctx.node(p).payload {
            NodePayload::List(d) => d.keys.contains(&node),
            _ => false,
        },
        None => false,
    }
}

/// §3 invariant sibling ring: remove `node` from its parent's child ring
/// (or the module's top-level ring) without destroying it — the deviation
/// record keeps it alive for the round-trip toggle (§8). `node`'s own
/// `prev`/`next` fields are left untouched, which is what lets
/// [`relink_node`] splice it back in later. Returns whether `node` was the
/// ring's head.
fn unlink_node(ctx: &mut Context, node: NodeHandle) -> bool {
    let prev = ctx.node(node).prev;
    let next = ctx.node(node).next;
    let parent = ctx.node(node).parent;
    let module = node.module;

    let head = match parent {
        Some(p) => ctx.node(p).child_head,
        None => ctx.module(module).data_head,
    };

    let was_head = head == Some(node);
    if was_head {
        match parent {
            Some(p) => ctx.node_mut(p).child_head = next,
            None => ctx.module_mut(module).data_head = next,
        }
        if let Some(new_head) = next {
            ctx.node_mut(new_head).prev = prev;
        }
        return was_head;
    }

    if let Some(pv) = prev {
        ctx.node_mut(pv).next = next;
    }
    match next {
        Some(n) => ctx.node_mut(n).prev = prev,
        None => {
            // `node` was the tail; the ring head's `prev` must follow.
            if let Some(h) = head {
                ctx.node_mut(h).prev = prev;
            }
        }
    }
    was_head
}

/// Inverse of [`unlink_node`]: splices `node` back into its ring at the
/// slot `was_head` names, using the prev/next pointers `unlink_node` left
/// on `node` itself.
fn relink_node(ctx: &mut Context, node: NodeHandle, was_head: bool) {
    let prev = ctx.node(node).prev.expect("an unlinked node keeps its old prev pointer");
    let next = ctx.node(node).next;
    let parent = ctx.node(node).parent;
    let module = node.module;

    if was_head {
        match parent {
            Some(p) => ctx.node_mut(p).child_head = Some(node),
            None => ctx.module_mut(module).data_head = Some(node),
        }
        if let Some(n) = next {
            ctx.node_mut(n).prev = Some(node);
        }
        return;
    }

    ctx.node_mut(prev).next = Some(node);
    match next {
        Some(n) => ctx.node_mut(n).prev = Some(node),
        None => {
            // `node` was the tail; the ring head's `prev` must point back at it.
            let head = match parent {
                Some(p) => ctx.node(p).child_head,
                None => ctx.module(module).data_head,
            };
            if let Some(h) = head {
                ctx.node_mut(h).prev = Some(node);
            }
        }
    }
}

/// Reads whichever of `target`'s fields `fields` names, before anything
/// mutates them — the "before" picture [`revert_deviate_fields`] restores
/// when a deviation is disabled.
fn capture_pristine(ctx: &Context, target: NodeHandle, fields: DeviateFields) -> crate::model::Pristine {
    let mut p = crate::model::Pristine::default();
    if fields.contains(DeviateFields::CONFIG) {
        let flags = ctx.node(target).flags;
        p.config_set = flags.has_explicit_config();
        p.config = flags.is_config();
    }
    if fields.contains(DeviateFields::MANDATORY) {
        p.mandatory = ctx.node(target).flags.contains(NodeFlags::MANDATORY);
    }
    match &ctx.node(target).payload {
        NodePayload::Leaf(d) => {
            if fields.contains(DeviateFields::UNITS) {
                p.units = d.units.clone();
            }
            if fields.contains(DeviateFields::DEFAULT) {
                p.default = d.default.clone();
            }
            if fields.contains(DeviateFields::TYPE) {
                p.ty = Some(d.ty.clone());
            }
        }
        NodePayload::LeafList(d) => {
            if fields.contains(DeviateFields::UNITS) {
                p.units = d.units.clone();
            }
            if fields.contains(DeviateFields::DEFAULT) {
                p.defaults = d.defaults.clone();
            }
            if fields.contains(DeviateFields::MIN_ELEMENTS) {
                p.min_elements = d.min_elements;
            }
            if fields.contains(DeviateFields::MAX_ELEMENTS) {
                p.max_elements = d.max_elements;
            }
            if fields.contains(DeviateFields::TYPE) {
                p.ty = Some(d.ty.clone());
            }
        }
        NodePayload::List(d) => {
            if fields.contains(DeviateFields::MIN_ELEMENTS) {
                p.min_elements = d.min_elements;
            }
            if fields.contains(DeviateFields::MAX_ELEMENTS) {
                p.max_elements = d.max_elements;
            }
        }
        _ => {}
    }
    p
}

fn apply_deviate_fields(
    ctx: &mut Context,
    module_id: ModuleId,
    deviation_idx: usize,
    deviate_idx: usize,
    kind: DeviateKind,
    target: NodeHandle,
) -> Result<(), Diagnostic> {
    let fields = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].fields;
    let pristine = capture_pristine(ctx, target, fields);
    ctx.module_mut(module_id).deviations[deviation_idx].deviates[deviate_idx].pristine = Some(pristine);

    if fields.contains(DeviateFields::CONFIG) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].config.unwrap();
        check_deviate_precondition(kind, ctx.node(target).flags.has_explicit_config(), "config")?;
        ctx.node_mut(target).flags.set(NodeFlags::CONFIG_SET, kind != DeviateKind::Delete);
        ctx.node_mut(target).flags.set(NodeFlags::CONFIG_W, value);
    }
    if fields.contains(DeviateFields::MANDATORY) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].mandatory.unwrap();
        ctx.node_mut(target).flags.set(NodeFlags::MANDATORY, kind != DeviateKind::Delete && value);
    }
    if fields.contains(DeviateFields::UNITS) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].units.clone();
        set_units(ctx, target, kind, value)?;
    }
    if fields.contains(DeviateFields::DEFAULT) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].default.clone();
        set_default(ctx, target, kind, value)?;
    }
    if fields.contains(DeviateFields::MIN_ELEMENTS) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].min_elements;
        set_min_elements(ctx, target, kind, value)?;
    }
    if fields.contains(DeviateFields::MAX_ELEMENTS) {
        let value = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].max_elements;
        set_max_elements(ctx, target, kind, value)?;
    }
    if fields.contains(DeviateFields::TYPE) {
        let ty = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].ty.clone();
        set_type(ctx, module_id, target, kind, ty)?;
    }
    Ok(())
}

fn check_deviate_precondition(kind: DeviateKind, already_present: bool, field: &str) -> Result<(), Diagnostic> {
    match kind {
        DeviateKind::Add if already_present => Err(Diagnostic::error(
            ErrorKind::IncompatibleDeviation,
            format!("deviate add: '{field}' already present on target"),
        )),
        DeviateKind::Delete if !already_present => Err(Diagnostic::error(
            ErrorKind::IncompatibleDeviation,
            format!("deviate delete: '{field}' not present on target"),
        )),
        _ => Ok(()),
    }
}

fn set_units(ctx: &mut Context, target: NodeHandle, kind: DeviateKind, value: Option<crate::intern::YangStr>) -> Result<(), Diagnostic> {
    let slot = match &mut ctx.node_mut(target).payload {
        NodePayload::Leaf(d) => &mut d.units,
        NodePayload::LeafList(d) => &mut d.units,
        _ => return Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'units' only valid on leaf or leaf-list")),
    };
    check_deviate_precondition(kind, slot.is_some(), "units")?;
    match kind {
        DeviateKind::Delete => *slot = None,
        _ => *slot = value,
    }
    Ok(())
}

fn set_default(ctx: &mut Context, target: NodeHandle, kind: DeviateKind, value: Option<crate::intern::YangStr>) -> Result<(), Diagnostic> {
    match &mut ctx.node_mut(target).payload {
        NodePayload::Leaf(d) => {
            check_deviate_precondition(kind, d.default.is_some(), "default")?;
            match kind {
                DeviateKind::Delete => d.default = None,
                _ => d.default = value,
            }
            Ok(())
        }
        NodePayload::LeafList(d) => {
            match kind {
                DeviateKind::Add => {
                    if let Some(v) = value {
                        d.defaults.push(v);
                    }
                }
                DeviateKind::Delete => {
                    if let Some(v) = &value {
                        d.defaults.retain(|x| x.as_str() != v.as_str());
                    }
                }
                DeviateKind::Replace => {
                    d.defaults.clear();
                    d.defaults.extend(value);
                }
                DeviateKind::NotSupported => {}
            }
            Ok(())
        }
        _ => Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'default' only valid on leaf or leaf-list")),
    }
}

fn set_min_elements(ctx: &mut Context, target: NodeHandle, kind: DeviateKind, value: Option<u32>) -> Result<(), Diagnostic> {
    let slot = match &mut ctx.node_mut(target).payload {
        NodePayload::List(d) => &mut d.min_elements,
        NodePayload::LeafList(d) => &mut d.min_elements,
        _ => return Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'min-elements' only valid on list or leaf-list")),
    };
    *slot = match kind {
        DeviateKind::Delete => 0,
        _ => value.unwrap_or(*slot),
    };
    Ok(())
}

fn set_max_elements(ctx: &mut Context, target: NodeHandle, kind: DeviateKind, value: Option<u32>) -> Result<(), Diagnostic> {
    let slot = match &mut ctx.node_mut(target).payload {
        NodePayload::List(d) => &mut d.max_elements,
        NodePayload::LeafList(d) => &mut d.max_elements,
        _ => return Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'max-elements' only valid on list or leaf-list")),
    };
    *slot = match kind {
        DeviateKind::Delete => None,
        _ => value,
    };
    Ok(())
}

fn set_type(
    ctx: &mut Context,
    module_id: ModuleId,
    target: NodeHandle,
    kind: DeviateKind,
    ty: Option<crate::model::Type>,
) -> Result<(), Diagnostic> {
    if kind == DeviateKind::Delete {
        return Err(Diagnostic::error(ErrorKind::IncompatibleDeviation, "deviate delete does not apply to 'type'"));
    }
    let loc = match &ctx.node(target).payload {
        NodePayload::Leaf(_) => TypeLocation::Leaf(target),
        NodePayload::LeafList(_) => TypeLocation::LeafList(target),
        _ => return Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'type' only valid on leaf or leaf-list")),
    };
    if let Some(t) = ty {
        match &mut ctx.node_mut(target).payload {
            NodePayload::Leaf(d) => d.ty = t,
            NodePayload::LeafList(d) => d.ty = t,
            _ => unreachable!("checked above"),
        }
        // The replacement type is built the same `Type::pending(...)` way a
        // leaf's own `type` statement is, but nothing queued it through the
        // ordinary `type-der` unres entry — deviations apply after the
        // resolver's fixed point already ran (§4.4 ordering). Resolve it
        // directly now rather than leaving it permanently `Pending`.
        if let Some(d) = crate::resolver::resolve_deviation_type(ctx, module_id, &loc) {
            return Err(d);
        }
    }
    Ok(())
}

/// §4.4 "record in the deviated module's import table a back-import tagged
/// `direct-deviator`; mark the deviated module with a flag".
fn record_direct_deviator(ctx: &mut Context, deviator: ModuleId, deviated: ModuleId) {
    let already = ctx
        .module(deviated)
        .imports
        .iter()
        .any(|imp| imp.resolved == Some(deviator) && imp.external == ExternalFlag::DirectDeviator);
    if !already {
        let deviator_name = ctx.module(deviator).name.clone();
        let deviator_prefix = ctx
            .module(deviator)
            .prefix
            .clone()
            .unwrap_or_else(|| deviator_name.clone());
        ctx.module_mut(deviated).imports.push(Import {
            module_name: deviator_name,
            prefix: deviator_prefix,
            revision: None,
            external: ExternalFlag::DirectDeviator,
            resolved: Some(deviator),
        });
    }
    ctx.module_mut(deviated).is_deviated = true;
}

/// §6 toggle: "temporarily disable/re-enable all deviations of a module".
/// Disabling fully reverts every deviate record — `not-supported` targets
/// are relinked at their recorded ring slot, and `add`/`replace`/`delete`
/// fields are restored from the pristine snapshot `apply_deviate_fields`
/// took — so the tree is indistinguishable from one the deviation module
/// was never loaded against. Re-enabling is then just a fresh
/// [`apply_deviations`] pass over that pristine tree, not a re-run against
/// already-deviated state.
pub fn set_deviations_disabled(ctx: &mut Context, module_id: ModuleId, disabled: bool, bag: &mut DiagnosticBag) {
    let was_disabled = ctx.module(module_id).deviations_disabled;
    ctx.module_mut(module_id).deviations_disabled = disabled;
    if disabled && !was_disabled {
        revert_deviations(ctx, module_id);
    } else if !disabled && was_disabled {
        apply_deviations(ctx, module_id, bag);
    }
}

/// Undoes every deviate record of `module_id` in reverse application
/// order, across every deviation that targets it.
fn revert_deviations(ctx: &mut Context, module_id: ModuleId) {
    let count = ctx.module(module_id).deviations.len();
    for idx in (0..count).rev() {
        revert_one_deviation(ctx, module_id, idx);
    }
}

fn revert_one_deviation(ctx: &mut Context, module_id: ModuleId, idx: usize) {
    let target = ctx.module(module_id).deviations[idx].target;
    let target = match target {
        Some(t) => t,
        None => return,
    };
    let deviate_count = ctx.module(module_id).deviations[idx].deviates.len();
    for d in (0..deviate_count).rev() {
        let kind = ctx.module(module_id).deviations[idx].deviates[d].kind;
        match kind {
            Some(DeviateKind::NotSupported) => {
                if ctx.module(module_id).deviations[idx].original.is_some() {
                    let was_head = ctx.module(module_id).deviations[idx].original_was_head;
                    relink_node(ctx, target, was_head);
                    ctx.module_mut(module_id).deviations[idx].original = None;
                }
            }
            Some(DeviateKind::Add | DeviateKind::Replace | DeviateKind::Delete) => {
                revert_deviate_fields(ctx, module_id, idx, d, target);
            }
            None => {}
        }
    }
}

/// Restores whichever fields `deviates[deviate_idx]` touched back to the
/// [`crate::model::Pristine`] snapshot captured before it was applied.
/// A `None` pristine means this record never actually ran (e.g. an earlier
/// deviate in the same deviation failed validation first) and there is
/// nothing to undo.
fn revert_deviate_fields(ctx: &mut Context, module_id: ModuleId, deviation_idx: usize, deviate_idx: usize, target: NodeHandle) {
    let fields = ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].fields;
    let pristine = match ctx.module(module_id).deviations[deviation_idx].deviates[deviate_idx].pristine.take() {
        Some(p) => p,
        None => return,
    };

    if fields.contains(DeviateFields::CONFIG) {
        ctx.node_mut(target).flags.set(NodeFlags::CONFIG_SET, pristine.config_set);
        ctx.node_mut(target).flags.set(NodeFlags::CONFIG_W, pristine.config);
    }
    if fields.contains(DeviateFields::MANDATORY) {
        ctx.node_mut(target).flags.set(NodeFlags::MANDATORY, pristine.mandatory);
    }
    match &mut ctx.node_mut(target).payload {
        NodePayload::Leaf(d) => {
            if fields.contains(DeviateFields::UNITS) {
                d.units = pristine.units.clone();
            }
            if fields.contains(DeviateFields::DEFAULT) {
                d.default = pristine.default.clone();
            }
            if fields.contains(DeviateFields::TYPE) {
                if let Some(ty) = pristine.ty.clone() {
                    d.ty = ty;
                }
            }
        }
        NodePayload::LeafList(d) => {
            if fields.contains(DeviateFields::UNITS) {
                d.units = pristine.units.clone();
            }
            if fields.contains(DeviateFields::DEFAULT) {
                d.defaults = pristine.defaults.clone();
            }
            if fields.contains(DeviateFields::MIN_ELEMENTS) {
                d.min_elements = pristine.min_elements;
            }
            if fields.contains(DeviateFields::MAX_ELEMENTS) {
                d.max_elements = pristine.max_elements;
            }
            if fields.contains(DeviateFields::TYPE) {
                if let Some(ty) = pristine.ty.clone() {
                    d.ty = ty;
                }
            }
        }
        NodePayload::List(d) => {
            if fields.contains(DeviateFields::MIN_ELEMENTS) {
                d.min_elements = pristine.min_elements;
            }
            if fields.contains(DeviateFields::MAX_ELEMENTS) {
                d.max_elements = pristine.max_elements;
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------
// Access-control inheritance
// ---------------------------------------------------------------------

/// §4.4 "Propagate the access-control flags from each node to structural
/// descendants except groupings and except across the leaf/leaf-list
/// boundary" — leaf/leaf-list have no schema-node children in this model
/// (their "children" are the non-owning leafref backlink set), so the
/// exclusion falls out of the walk naturally rather than needing a
/// special case.
fn propagate_access_control(ctx: &mut Context, module_id: ModuleId) {
    let roots: Vec<NodeHandle> = ctx.iter_siblings(ctx.module(module_id).data_head).collect();
    for root in roots {
        propagate_access_control_from(ctx, root);
    }
}

fn propagate_access_control_from(ctx: &mut Context, node: NodeHandle) {
    let has_ac = ctx.node(node).flags.contains(NodeFlags::ACCESS_CONTROL);
    let children: Vec<NodeHandle> = ctx.iter_siblings(ctx.node(node).child_head).collect();
    for child in children {
        if ctx.node(child).kind() == NodeKind::Grouping {
            continue;
        }
        if has_ac {
            ctx.node_mut(child).flags.insert(NodeFlags::ACCESS_CONTROL);
        }
        propagate_access_control_from(ctx, child);
    }
}

// ---------------------------------------------------------------------
// Status inheritance
// ---------------------------------------------------------------------

/// §4.4 "A subtree containing any `config false` descendant marks its
/// ancestor containers/lists so consumers can skip them in config-only
/// walks." Bottom-up: a node "has a state descendant" if it is itself
/// `config false`, or any child does.
fn propagate_status(ctx: &mut Context, module_id: ModuleId) {
    let roots: Vec<NodeHandle> = ctx.iter_siblings(ctx.module(module_id).data_head).collect();
    for root in roots {
        mark_state_descendants(ctx, root);
    }
}

fn mark_state_descendants(ctx: &mut Context, node: NodeHandle) -> bool {
    let children: Vec<NodeHandle> = ctx.iter_siblings(ctx.node(node).child_head).collect();
    let mut has_state = !ctx.node(node).flags.is_config();
    for child in children {
        if ctx.node(child).kind() == NodeKind::Grouping {
            continue;
        }
        if mark_state_descendants(ctx, child) {
            has_state = true;
        }
    }
    if has_state && matches!(ctx.node(node).kind(), NodeKind::Container | NodeKind::List) {
        ctx.node_mut(node).flags.insert(NodeFlags::HAS_STATE_DESCENDANT);
    }
    has_state
}

// ---------------------------------------------------------------------
// Feature state (§4.4, §6 feature-enable/feature-disable/feature-state)
// ---------------------------------------------------------------------

/// §4.4 "A feature is enabled iff explicitly enabled *and* every predicate
/// feature transitively resolves enabled; enabling a feature transitively
/// enables referenced features." Enabling walks the (already-resolved)
/// `if-feature` predicate graph outward and flips every feature it depends
/// on, rather than leaving that to be recomputed lazily.
pub fn enable_feature(ctx: &mut Context, module_id: ModuleId, name: &str) -> Result<(), ()> {
    if name == "*" {
        let count = ctx.module(module_id).features.len();
        for i in 0..count {
            enable_feature_handle(ctx, crate::model::FeatureHandle {
                module: module_id,
                feature: crate::model::FeatureId(i as u32),
            });
        }
        return Ok(());
    }
    let id = ctx.module(module_id).find_feature(name).ok_or(())?;
    enable_feature_handle(ctx, crate::model::FeatureHandle { module: module_id, feature: id });
    Ok(())
}

fn enable_feature_handle(ctx: &mut Context, handle: crate::model::FeatureHandle) {
    let already = ctx.module(handle.module).features[handle.feature.index()].enabled;
    if already {
        return;
    }
    ctx.module_mut(handle.module).features[handle.feature.index()].enabled = true;
    let predicates: Vec<crate::model::FeatureHandle> = ctx.module(handle.module).features[handle.feature.index()]
        .predicates
        .iter()
        .filter_map(|p| match p {
            crate::model::IfFeature::Resolved(h) => Some(*h),
            crate::model::IfFeature::Pending(_) => None,
        })
        .collect();
    for p in predicates {
        enable_feature_handle(ctx, p);
    }
    warn!(feature = %ctx.module(handle.module).features[handle.feature.index()].name, "feature enabled");
}

pub fn disable_feature(ctx: &mut Context, module_id: ModuleId, name: &str) -> Result<(), ()> {
    if name == "*" {
        let count = ctx.module(module_id).features.len();
        for i in 0..count {
            ctx.module_mut(module_id).features[i].enabled = false;
        }
        return Ok(());
    }
    let id = ctx.module(module_id).find_feature(name).ok_or(())?;
    ctx.module_mut(module_id).features[id.index()].enabled = false;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    Enabled,
    Disabled,
}

/// A feature's *effective* state recurses through its predicate graph
/// (§4.4); the `enabled` bit alone only records the explicit toggle.
pub fn feature_state(ctx: &Context, module_id: ModuleId, name: &str) -> Option<FeatureState> {
    let id = ctx.module(module_id).find_feature(name)?;
    let handle = crate::model::FeatureHandle { module: module_id, feature: id };
    Some(if effective_feature_state(ctx, handle, &mut Vec::new()) {
        FeatureState::Enabled
    } else {
        FeatureState::Disabled
    })
}

fn effective_feature_state(ctx: &Context, handle: crate::model::FeatureHandle, visiting: &mut Vec<crate::model::FeatureHandle>) -> bool {
    if visiting.contains(&handle) {
        return false; // guards a malformed if-feature cycle; never expected post-validation
    }
    let feature = &ctx.module(handle.module).features[handle.feature.index()];
    if !feature.enabled {
        return false;
    }
    visiting.push(handle);
    let result = feature.predicates.iter().all(|p| match p {
        crate::model::IfFeature::Resolved(h) => effective_feature_state(ctx, *h, visiting),
        crate::model::IfFeature::Pending(_) => false,
    });
    visiting.pop();
    result
}

pub fn list_features(ctx: &Context, module_id: ModuleId) -> Vec<(String, FeatureState)> {
    let count = ctx.module(module_id).features.len();
    (0..count)
        .map(|i| {
            let name = ctx.module(module_id).features[i].name.to_string();
            let handle = crate::model::FeatureHandle { module: module_id, feature: crate::model::FeatureId(i as u32) };
            let state = if effective_feature_state(ctx, handle, &mut Vec::new()) {
                FeatureState::Enabled
            } else {
                FeatureState::Disabled
            };
            (name, state)
        })
        .collect()
}
