//! Builder
//!
//! Corresponds to §4.1. Translates a stream of parse events — which in this
//! crate means direct calls from whatever front end owns lexing/parsing
//! (§1, out of scope here) — into schema entities, performing the *local*
//! checks that don't need the fixed-point resolver: cardinality,
//! identifier-scope uniqueness, lexical validity. Anything that needs
//! another entity to exist first is handed to the [`crate::unres::UnresSet`]
//! instead of checked here.

use crate::context::Context;
use crate::diagnostics::{BuildResult, Diagnostic, ErrorKind};
use crate::flags::NodeFlags;
use crate::model::{
    AugmentData, ChoiceData, ContainerData, ExternalFlag, FeatureId, Identity, IdentityId, Import,
    Include, LeafData, LeafListData, ListData, Module, ModuleId, NodeHandle, NodeId, NodePayload,
    Revision, SchemaNode, Type, Typedef, TypedefId, UsesData,
};
use crate::unres::{TypeLocation, UnresEntry, UnresSet};
use crate::util;

/// Declared array cardinalities from the size pass (§4.5). `None` means
/// the front end is running in one-pass (streaming) mode and arrays grow
/// unbounded; `Some(n)` locks a [`crate::model::Growable`] to capacity `n`.
#[derive(Debug, Clone, Default)]
pub struct SizeHints {
    pub typedefs: Option<usize>,
    pub identities: Option<usize>,
    pub features: Option<usize>,
    pub imports: Option<usize>,
    pub deviations: Option<usize>,
}

pub struct Builder<'ctx> {
    ctx: &'ctx mut Context,
    module_id: ModuleId,
    unres: UnresSet,
}

fn set_once<T>(field: &mut Option<T>, value: T, statement: &str) -> BuildResult<()> {
    if field.is_some() {
        return Err(Diagnostic::error(
            ErrorKind::MisplacedStatement,
            format!("duplicate '{statement}' statement"),
        ));
    }
    *field = Some(value);
    Ok(())
}

fn validate_identifier(name: &str) -> BuildResult<()> {
    if util::is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Diagnostic::error(ErrorKind::InvalidChar, format!("'{name}' is not a valid YANG identifier")))
    }
}

impl<'ctx> Builder<'ctx> {
    /// Reserves a module slot in `ctx` and begins construction directly
    /// into it — the module is addressable by `ModuleId` from the first
    /// statement rather than assembled off to the side and inserted later,
    /// which is what lets node construction record cross-references (a
    /// node's `module` field, a typedef's owning module) as it goes.
    pub fn begin_module(ctx: &'ctx mut Context, name: &str, hints: SizeHints) -> BuildResult<Self> {
        validate_identifier(name)?;
        let interned = ctx.intern(name);
        let mut module = Module::new(interned);
        if let Some(n) = hints.typedefs {
            module.typedefs = crate::model::Growable::with_size_hint(n);
        }
        if let Some(n) = hints.identities {
            module.identities = crate::model::Growable::with_size_hint(n);
        }
        if let Some(n) = hints.features {
            module.features = crate::model::Growable::with_size_hint(n);
        }
        if let Some(n) = hints.deviations {
            module.deviations = crate::model::Growable::with_size_hint(n);
        }
        let module_id = ctx.insert_module(module)?;
        Ok(Builder { ctx, module_id, unres: UnresSet::new() })
    }

    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    pub fn intern(&self, s: &str) -> crate::intern::YangStr {
        self.ctx.intern(s)
    }

    fn module_mut(&mut self) -> &mut Module {
        self.ctx.module_mut(self.module_id)
    }

    pub fn set_namespace(&mut self, uri: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(uri);
        set_once(&mut self.module_mut().namespace, interned, "namespace")
    }

    pub fn set_prefix(&mut self, prefix: &str) -> BuildResult<()> {
        validate_identifier(prefix)?;
        let interned = self.ctx.intern(prefix);
        set_once(&mut self.module_mut().prefix, interned, "prefix")
    }

    pub fn set_organization(&mut self, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.module_mut().organization, interned, "organization")
    }

    pub fn set_contact(&mut self, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.module_mut().contact, interned, "contact")
    }

    pub fn set_description(&mut self, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.module_mut().description, interned, "description")
    }

    pub fn set_reference(&mut self, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.module_mut().reference, interned, "reference")
    }

    pub fn set_belongs_to(&mut self, main_module: &str) -> BuildResult<()> {
        validate_identifier(main_module)?;
        let interned = self.ctx.intern(main_module);
        set_once(&mut self.module_mut().belongs_to, interned, "belongs-to")
    }

    pub fn set_implemented(&mut self, implemented: bool) {
        self.module_mut().implemented = implemented;
    }

    /// §4.1 "Revision insertion sorts by date descending on the fly."
    pub fn add_revision(&mut self, date: &str, description: Option<&str>, reference: Option<&str>) {
        let date = self.ctx.intern(date);
        let description = description.map(|d| self.ctx.intern(d));
        let reference = reference.map(|r| self.ctx.intern(r));
        self.module_mut().insert_revision(Revision { date, description, reference });
    }

    pub fn add_import(&mut self, module_name: &str, prefix: &str, revision: Option<&str>) -> BuildResult<()> {
        validate_identifier(prefix)?;
        let module = self.module_mut();
        if module.find_prefix(prefix).is_some() {
            return Err(Diagnostic::error(ErrorKind::DuplicateId, format!("prefix '{prefix}' already bound")));
        }
        let module_name = self.ctx.intern(module_name);
        let prefix = self.ctx.intern(prefix);
        let revision = revision.map(|r| self.ctx.intern(r));
        self.module_mut().imports.push(Import {
            module_name,
            prefix,
            revision,
            external: ExternalFlag::None,
            resolved: None,
        });
        Ok(())
    }

    pub fn add_include(&mut self, submodule_name: &str, revision: Option<&str>) {
        let submodule_name = self.ctx.intern(submodule_name);
        let revision = revision.map(|r| self.ctx.intern(r));
        self.module_mut().includes.push(Include { submodule_name, revision, resolved: None });
    }

    /// §3 invariant: "typedef names do not shadow an ancestor typedef of
    /// the same name". At module scope the only ancestor is the module
    /// itself, so this call covers the common case; nested (in-node)
    /// typedef scopes call [`Builder::check_typedef_shadow`] first.
    pub fn add_typedef(&mut self, name: &str, ty: Type) -> BuildResult<TypedefId> {
        validate_identifier(name)?;
        let module = self.module_mut();
        if module.find_typedef(name).is_some() {
            return Err(Diagnostic::error(ErrorKind::DuplicateId, format!("duplicate typedef '{name}'")));
        }
        let needs_der = !ty.is_resolved();
        let interned = self.ctx.intern(name);
        let module_id = self.module_id;
        let idx = self.module_mut().typedefs.push(Typedef::new(interned, module_id, ty))?;
        let id = TypedefId(idx as u32);
        if needs_der {
            self.unres.push(UnresEntry::TypeDerTpdf {
                subject: TypeLocation::Typedef(module_id, id),
            });
        }
        Ok(id)
    }

    /// Scope-shadow check for a typedef declared inside a node rather than
    /// at module scope (§3 invariant: "typedef names do not shadow an
    /// ancestor typedef of the same name"). The front end calls this before
    /// [`Builder::add_typedef`] when the enclosing scope is a node, walking
    /// `ancestor_typedefs` (gathered by the caller from each ancestor's own
    /// local typedef list) since nested typedef scopes aren't modeled as
    /// their own arena here.
    pub fn check_typedef_shadow(name: &str, ancestor_typedefs: &[&str]) -> BuildResult<()> {
        if ancestor_typedefs.iter().any(|t| *t == name) {
            return Err(Diagnostic::error(
                ErrorKind::DuplicateId,
                format!("typedef '{name}' shadows an ancestor typedef of the same name"),
            ));
        }
        Ok(())
    }

    /// Mutable access to a leaf's or leaf-list's embedded [`Type`] so the
    /// front end can attach facets (`length`, `range`, `pattern`,
    /// `fraction-digits`, `enum`, `bit`, union members, leafref path,
    /// identityref bases) directly rather than through one setter per
    /// facet — the fields themselves are `pub` on [`Type`].
    pub fn leaf_type_mut(&mut self, node: NodeHandle) -> BuildResult<&mut Type> {
        match &mut self.ctx.node_mut(node).payload {
            NodePayload::Leaf(d) => Ok(&mut d.ty),
            NodePayload::LeafList(d) => Ok(&mut d.ty),
            _ => Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'type' only valid on leaf or leaf-list")),
        }
    }

    pub fn typedef_type_mut(&mut self, typedef: TypedefId) -> &mut Type {
        &mut self.module_mut().typedefs[typedef.index()].ty
    }

    fn type_location_for(&self, node: NodeHandle) -> Option<TypeLocation> {
        match &self.ctx.node(node).payload {
            NodePayload::Leaf(_) => Some(TypeLocation::Leaf(node)),
            NodePayload::LeafList(_) => Some(TypeLocation::LeafList(node)),
            _ => None,
        }
    }

    /// Call once the front end has finished setting `leaf_type_mut(node)
    /// .leafref.raw_path`; queues `type-leafref` (§4.2) so the resolver
    /// rewrites the path and, outside typedef/grouping bodies, resolves it
    /// against the schema tree.
    pub fn push_leafref_unres(&mut self, node: NodeHandle) {
        if let Some(loc) = self.type_location_for(node) {
            self.unres.push(UnresEntry::TypeLeafref { subject: loc, parent: node });
        }
    }

    /// Call once an identityref's `base` statement(s) have been appended to
    /// `leaf_type_mut(node).identityref.raw_bases`; queues `type-identref`.
    pub fn push_identref_unres(&mut self, node: NodeHandle, raw_name: &str) {
        let raw = self.ctx.intern(raw_name);
        if let Some(loc) = self.type_location_for(node) {
            self.unres.push(UnresEntry::TypeIdentref { subject: loc, raw_name: raw });
        }
    }

    /// Call after pushing a new (possibly still-unresolved) member type
    /// onto `leaf_type_mut(node).union_members`; queues its own `type-der`
    /// keyed at the member's position so the resolver recurses into it
    /// independently of the outer union type (§8 "a union resolves by
    /// recursively resolving each member").
    pub fn push_union_member_unres(&mut self, node: NodeHandle, member_index: usize) {
        if let Some(loc) = self.type_location_for(node) {
            self.unres.push(UnresEntry::TypeDer {
                subject: TypeLocation::UnionMember(Box::new(loc), member_index),
            });
        }
    }

    /// Same as [`Builder::push_union_member_unres`] but for a union member
    /// nested inside a typedef's own `type` rather than a leaf's — queued
    /// as `type-der-tpdf` since the member's derivation bottoms out in a
    /// typedef scope (§4.2's distinction between `type-der` and
    /// `type-der-tpdf`).
    pub fn push_typedef_union_member_unres(&mut self, typedef: TypedefId, member_index: usize) {
        let loc = TypeLocation::Typedef(self.module_id, typedef);
        self.unres.push(UnresEntry::TypeDerTpdf {
            subject: TypeLocation::UnionMember(Box::new(loc), member_index),
        });
    }

    pub fn set_typedef_units(&mut self, typedef: TypedefId, units: crate::intern::YangStr) {
        self.module_mut().typedefs[typedef.index()].units = Some(units);
    }

    pub fn set_typedef_default(&mut self, typedef: TypedefId, default: crate::intern::YangStr) {
        self.module_mut().typedefs[typedef.index()].default = Some(default);
    }

    pub fn add_identity(&mut self, name: &str) -> BuildResult<IdentityId> {
        validate_identifier(name)?;
        let module = self.module_mut();
        if module.find_identity(name).is_some() {
            return Err(Diagnostic::error(ErrorKind::DuplicateId, format!("duplicate identity '{name}'")));
        }
        let interned = self.ctx.intern(name);
        let module_id = self.module_id;
        let idx = self.module_mut().identities.push(Identity::new(interned, module_id))?;
        Ok(IdentityId(idx as u32))
    }

    pub fn add_identity_base(&mut self, identity: IdentityId, raw_name: &str) {
        let raw = self.ctx.intern(raw_name);
        let slot = self.module_mut().identities[identity.index()].bases.len();
        self.module_mut().identities[identity.index()]
            .bases
            .push(crate::model::IdentityBase::Pending(raw.clone()));
        self.unres.push(UnresEntry::IdentBase {
            subject: crate::model::IdentityHandle { module: self.module_id, identity },
            slot,
            raw_name: raw,
        });
    }

    pub fn add_feature(&mut self, name: &str) -> BuildResult<FeatureId> {
        validate_identifier(name)?;
        let module = self.module_mut();
        if module.find_feature(name).is_some() {
            return Err(Diagnostic::error(ErrorKind::DuplicateId, format!("duplicate feature '{name}'")));
        }
        let interned = self.ctx.intern(name);
        let module_id = self.module_id;
        let idx = self.module_mut().features.push(crate::model::Feature::new(interned, module_id))?;
        Ok(FeatureId(idx as u32))
    }

    pub fn add_feature_predicate_on_feature(&mut self, feature: FeatureId, raw_name: &str) {
        let raw = self.ctx.intern(raw_name);
        let slot = self.module_mut().features[feature.index()].predicates.len();
        self.module_mut().features[feature.index()]
            .predicates
            .push(crate::model::IfFeature::Pending(raw.clone()));
        self.unres.push(UnresEntry::IfFeature {
            subject: crate::unres::FeatureSubject::Feature(crate::model::FeatureHandle {
                module: self.module_id,
                feature,
            }),
            slot,
            raw_name: raw,
        });
    }

    pub fn add_feature_predicate_on_node(&mut self, node: NodeHandle, raw_name: &str) {
        let raw = self.ctx.intern(raw_name);
        let slot = self.ctx.node(node).features.len();
        self.ctx.node_mut(node).features.push(crate::model::IfFeature::Pending(raw.clone()));
        self.unres.push(UnresEntry::IfFeature {
            subject: crate::unres::FeatureSubject::Node(node),
            slot,
            raw_name: raw,
        });
    }

    /// Attaches `node_id` (already pushed into `module.nodes`) under
    /// `parent`, or as a new top-level node when `parent` is `None`.
    /// Maintains the cyclic-prev sibling ring (§3 invariant) and applies
    /// config inheritance (§4.1 "Inherited flags").
    fn attach(&mut self, parent: Option<NodeHandle>, node_id: NodeId) -> BuildResult<NodeHandle> {
        let handle = NodeHandle::new(self.module_id, node_id);

        // Structural nodes (uses/grouping/augment) carry no config flag of
        // their own; a child attached directly under one inherits nothing
        // from it and defaults to true, same as a top-level node. Only a
        // data-node parent's *effective* (explicit-or-already-inherited)
        // value propagates further down.
        let parent_config = parent.and_then(|p| {
            let n = self.ctx.node(p);
            if n.is_data_node() { Some(n.flags.is_config()) } else { None }
        });

        {
            let node = self.ctx.node_mut(handle);
            if node.is_data_node() && !node.flags.has_explicit_config() {
                let inherited = parent_config.unwrap_or(true);
                node.flags.set(NodeFlags::CONFIG_W, inherited);
            }
        }

        let head = match parent {
            Some(p) => self.ctx.node(p).child_head,
            None => self.ctx.module(self.module_id).data_head,
        };

        // §3 invariant: data-node names unique among direct siblings.
        {
            let new_name = self.ctx.node(handle).name.clone();
            for sibling in self.ctx.iter_siblings(head) {
                if sibling != handle && self.ctx.node(sibling).name.as_str() == new_name.as_str() {
                    return Err(Diagnostic::error(
                        ErrorKind::DuplicateId,
                        format!("duplicate child name '{new_name}'"),
                    ));
                }
            }
        }

        match head {
            None => {
                let n = self.ctx.node_mut(handle);
                n.prev = Some(handle);
                n.next = None;
            }
            Some(head_handle) => {
                let tail = self.ctx.node(head_handle).prev.expect("ring head always has prev");
                self.ctx.node_mut(tail).next = Some(handle);
                let n = self.ctx.node_mut(handle);
                n.prev = Some(tail);
                n.next = None;
                self.ctx.node_mut(head_handle).prev = Some(handle);
            }
        }

        match parent {
            Some(p) => {
                if head.is_none() {
                    self.ctx.node_mut(p).child_head = Some(handle);
                }
            }
            None => {
                if head.is_none() {
                    self.module_mut().data_head = Some(handle);
                }
            }
        }

        self.parent_of(handle, parent);
        Ok(handle)
    }

    fn parent_of(&mut self, handle: NodeHandle, parent: Option<NodeHandle>) {
        self.ctx.node_mut(handle).parent = parent;
    }

    fn push_node(&mut self, node: SchemaNode) -> NodeId {
        let idx = self.module_mut().nodes.push(node).expect("node arrays are unbounded in this builder");
        NodeId(idx as u32)
    }

    pub fn add_container(
        &mut self,
        parent: Option<NodeHandle>,
        name: &str,
        presence: Option<&str>,
    ) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let presence = presence.map(|p| self.ctx.intern(p));
        let node = SchemaNode::new(
            interned,
            self.module_id,
            NodePayload::Container(ContainerData { presence, typedefs: Vec::new() }),
        );
        let id = self.push_node(node);
        self.attach(parent, id)
    }

    pub fn add_leaf(&mut self, parent: Option<NodeHandle>, name: &str, ty: Type) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(
            interned,
            self.module_id,
            NodePayload::Leaf(LeafData { ty, default: None, units: None, leafref_backlinks: Vec::new() }),
        );
        let id = self.push_node(node);
        let handle = self.attach(parent, id)?;
        self.push_type_unres(TypeLocation::Leaf(handle));
        Ok(handle)
    }

    pub fn add_leaf_list(&mut self, parent: Option<NodeHandle>, name: &str, ty: Type) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(
            interned,
            self.module_id,
            NodePayload::LeafList(LeafListData {
                ty,
                defaults: Vec::new(),
                units: None,
                min_elements: 0,
                max_elements: None,
                ordered_by_user: false,
            }),
        );
        let id = self.push_node(node);
        let handle = self.attach(parent, id)?;
        self.push_type_unres(TypeLocation::LeafList(handle));
        Ok(handle)
    }

    fn push_type_unres(&mut self, loc: TypeLocation) {
        self.unres.push(UnresEntry::TypeDer { subject: loc });
    }

    pub fn add_list(&mut self, parent: Option<NodeHandle>, name: &str, raw_keys: Option<&str>) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let raw_keys_interned = raw_keys.map(|k| self.ctx.intern(k));
        let node = SchemaNode::new(
            interned,
            self.module_id,
            NodePayload::List(ListData { raw_keys: raw_keys_interned.clone(), ..Default::default() }),
        );
        let id = self.push_node(node);
        let handle = self.attach(parent, id)?;
        if let Some(raw) = raw_keys_interned {
            self.unres.push(UnresEntry::ListKeys { subject: handle, raw_keys: raw });
        }
        Ok(handle)
    }

    pub fn add_list_unique(&mut self, list: NodeHandle, raw_unique: &str) {
        let raw = self.ctx.intern(raw_unique);
        if let NodePayload::List(data) = &mut self.ctx.node_mut(list).payload {
            data.raw_unique.push(raw.clone());
        }
        self.unres.push(UnresEntry::ListUnique { subject: list, raw_unique: raw });
    }

    pub fn add_anyxml(&mut self, parent: Option<NodeHandle>, name: &str) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Anyxml(Default::default()));
        let id = self.push_node(node);
        self.attach(parent, id)
    }

    pub fn add_choice(&mut self, parent: Option<NodeHandle>, name: &str, raw_default: Option<&str>) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let raw_default = raw_default.map(|d| self.ctx.intern(d));
        let node = SchemaNode::new(
            interned,
            self.module_id,
            NodePayload::Choice(ChoiceData { raw_default: raw_default.clone(), default_case: None }),
        );
        let id = self.push_node(node);
        let handle = self.attach(parent, id)?;
        if raw_default.is_some() {
            self.unres.push(UnresEntry::ChoiceDflt {
                subject: handle,
                raw_case: raw_default.unwrap(),
            });
        }
        Ok(handle)
    }

    pub fn add_case(&mut self, parent: NodeHandle, name: &str) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Case);
        let id = self.push_node(node);
        self.attach(Some(parent), id)
    }

    pub fn add_grouping(&mut self, parent: Option<NodeHandle>, name: &str) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Grouping);
        let id = self.push_node(node);
        self.attach(parent, id)
    }

    pub fn add_rpc(&mut self, parent: Option<NodeHandle>, name: &str) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Rpc);
        let id = self.push_node(node);
        self.attach(parent, id)
    }

    pub fn add_notification(&mut self, parent: Option<NodeHandle>, name: &str) -> BuildResult<NodeHandle> {
        validate_identifier(name)?;
        let interned = self.ctx.intern(name);
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Notification);
        let id = self.push_node(node);
        self.attach(parent, id)
    }

    /// `input`/`output` are implicitly-named, singleton substatements of an
    /// `rpc` (or `action`); RFC 7950 fixes their name to the literal
    /// keyword rather than letting the front end supply one.
    pub fn add_input(&mut self, parent: NodeHandle) -> BuildResult<NodeHandle> {
        let interned = self.ctx.intern("input");
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Input);
        let id = self.push_node(node);
        self.attach(Some(parent), id)
    }

    pub fn add_output(&mut self, parent: NodeHandle) -> BuildResult<NodeHandle> {
        let interned = self.ctx.intern("output");
        let node = SchemaNode::new(interned, self.module_id, NodePayload::Output);
        let id = self.push_node(node);
        self.attach(Some(parent), id)
    }

    pub fn add_uses(&mut self, parent: Option<NodeHandle>, grouping_name: &str) -> BuildResult<NodeHandle> {
        let raw = self.ctx.intern(grouping_name);
        let node = SchemaNode::new(
            raw.clone(),
            self.module_id,
            NodePayload::Uses(UsesData { grouping_name: raw, grouping_target: None, refines: Vec::new() }),
        );
        let id = self.push_node(node);
        let handle = self.attach(parent, id)?;
        self.unres.push(UnresEntry::Uses { subject: handle });
        Ok(handle)
    }

    /// Appends a `refine` record to a `uses` node, applied by the resolver
    /// once the grouping body is expanded under it (§4.3 "Uses expansion").
    pub fn add_uses_refine(&mut self, uses: NodeHandle, refine: crate::model::node::Refine) {
        if let NodePayload::Uses(d) = &mut self.ctx.node_mut(uses).payload {
            d.refines.push(refine);
        }
    }

    /// Top-level `augment` — recorded both as a schema node (so its
    /// floating children have somewhere to live until applied) and in
    /// `module.augments` so the post-processor can find it directly.
    pub fn add_augment(&mut self, target_path: &str) -> BuildResult<NodeHandle> {
        let raw = self.ctx.intern(target_path);
        let node = SchemaNode::new(
            raw.clone(),
            self.module_id,
            NodePayload::Augment(AugmentData { target_path: raw, target: None, when: None, applied: false }),
        );
        let id = self.push_node(node);
        self.module_mut().augments.push(id);
        let handle = NodeHandle::new(self.module_id, id);
        self.unres.push(UnresEntry::AugmentTarget { subject: handle });
        Ok(handle)
    }

    pub fn set_node_description(&mut self, node: NodeHandle, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.ctx.node_mut(node).description, interned, "description")
    }

    pub fn set_node_reference(&mut self, node: NodeHandle, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        set_once(&mut self.ctx.node_mut(node).reference, interned, "reference")
    }

    pub fn set_units(&mut self, node: NodeHandle, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        match &mut self.ctx.node_mut(node).payload {
            NodePayload::Leaf(d) => set_once(&mut d.units, interned, "units"),
            NodePayload::LeafList(d) => set_once(&mut d.units, interned, "units"),
            _ => Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'units' only valid on leaf or leaf-list")),
        }
    }

    /// Leaf/leaf-list defaults carry a textual value that can't be checked
    /// against the type until the type itself resolves — `type-dflt`
    /// (§4.2) defers that, but storing the raw text happens immediately.
    pub fn set_leaf_default(&mut self, node: NodeHandle, raw_default: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(raw_default);
        let loc = match &mut self.ctx.node_mut(node).payload {
            NodePayload::Leaf(d) => {
                set_once(&mut d.default, interned.clone(), "default")?;
                TypeLocation::Leaf(node)
            }
            NodePayload::LeafList(d) => {
                d.defaults.push(interned.clone());
                TypeLocation::LeafList(node)
            }
            _ => return Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'default' only valid on leaf or leaf-list")),
        };
        self.unres.push(UnresEntry::TypeDflt { subject: loc, default: interned });
        Ok(())
    }

    /// Explicit `config` marks the flag as set so [`Builder::attach`]'s
    /// inheritance step leaves it alone; can only be called before the
    /// node has children, same ordering the concrete syntax enforces.
    pub fn set_config(&mut self, node: NodeHandle, value: bool) {
        let n = self.ctx.node_mut(node);
        n.flags.set(NodeFlags::CONFIG_SET, true);
        n.flags.set(NodeFlags::CONFIG_W, value);
    }

    pub fn set_mandatory(&mut self, node: NodeHandle, value: bool) {
        self.ctx.node_mut(node).flags.set(NodeFlags::MANDATORY, value);
    }

    /// `anyxml`/`anydata` carry their own `mandatory` bit on the payload
    /// rather than `NodeFlags::MANDATORY` (§4.6, RFC 6020 §7.10.4), since
    /// mandatory-presence is the only thing that bit means for these kinds
    /// and a node flag would otherwise sit unused for every other kind.
    pub fn set_anyxml_mandatory(&mut self, node: NodeHandle, value: bool) {
        if let NodePayload::Anyxml(d) = &mut self.ctx.node_mut(node).payload {
            d.mandatory = value;
        }
    }

    pub fn set_status(&mut self, node: NodeHandle, status: crate::flags::Status) {
        use crate::flags::Status;
        let n = self.ctx.node_mut(node);
        n.flags.set(NodeFlags::STATUS_DEPRECATED, status == Status::Deprecated);
        n.flags.set(NodeFlags::STATUS_OBSOLETE, status == Status::Obsolete);
    }

    pub fn set_presence(&mut self, node: NodeHandle, text: &str) -> BuildResult<()> {
        let interned = self.ctx.intern(text);
        match &mut self.ctx.node_mut(node).payload {
            NodePayload::Container(d) => set_once(&mut d.presence, interned, "presence"),
            _ => Err(Diagnostic::error(ErrorKind::InvalidSubstatement, "'presence' only valid on container")),
        }
    }

    pub fn add_must(&mut self, node: NodeHandle, must: Must) {
        self.ctx.node_mut(node).musts.push(must);
    }

    pub fn set_when(&mut self, node: NodeHandle, when: When) {
        self.ctx.node_mut(node).when = Some(when);
    }

    /// Children of an augment or uses are built the same way as any other
    /// node tree, just rooted at `parent` instead of the module's top-level
    /// data list — `add_container`/`add_leaf`/etc. already take an
    /// `Option<NodeHandle>` parent so no separate API is needed.
    pub fn add_deviation(&mut self, target_path: &str) -> BuildResult<usize> {
        let raw = self.ctx.intern(target_path);
        let idx = self.module_mut().deviations.push(crate::model::Deviation::new(raw))?;
        self.unres.push(UnresEntry::DeviationTarget { module: self.module_id, deviation: idx });
        Ok(idx)
    }

    pub fn add_deviate(&mut self, deviation_idx: usize, deviate: crate::model::deviation::Deviate) {
        self.module_mut().deviations[deviation_idx].deviates.push(deviate);
    }

    /// Hands the accumulated obligations to the resolver. Consumes the
    /// builder: once construction finishes there's no reason to keep
    /// mutating the module outside the fixed-point loop.
    pub fn finish(self) -> UnresSet {
        self.unres
    }
}
