//! Context
//!
//! §3 "Context": the process-wide registry mapping `(module-name, revision)`
//! to compiled module, plus the string dictionary and the built-in module
//! set. §1 and the design notes ("Process-wide context") call this an
//! external collaborator the core never creates implicitly — callers build
//! one and pass it by reference into every `compile_*` call.

use indexmap::IndexMap;

use crate::intern::{Dictionary, YangStr};
use crate::model::{Module, NodeHandle, NodeId, ModuleId, SchemaNode};

#[derive(Default)]
pub struct Context {
    modules: Vec<Module>,
    /// name -> every loaded revision, newest-registered last; lookups by
    /// explicit revision scan this, lookups by name alone take the one
    /// flagged `implemented`, falling back to the most recently inserted.
    /// `IndexMap` rather than `HashMap` so `module_names()` enumerates in
    /// load order instead of hash order, matching §8's "bytewise equal
    /// diagnostic sequences" determinism across repeated compiles.
    by_name: IndexMap<String, Vec<ModuleId>>,
    dictionary: Dictionary,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// §1 "a set of built-in modules" / SPEC_FULL §C.1: registers a small,
    /// fixed set of library modules modeled on `ietf-yang-types` so that
    /// `import ietf-yang-types { prefix yang; }` resolves to something real
    /// without the embedder having to preload anything. Not a faithful
    /// reproduction of the IETF module text — just enough derived typedefs
    /// (`yang-identifier`, `counter32`) for `type-der` resolution against an
    /// import to have a real terminus in tests.
    pub fn with_builtins() -> Self {
        let mut ctx = Self::new();
        crate::builtins::register(&mut ctx);
        ctx
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn intern(&self, s: &str) -> YangStr {
        self.dictionary.intern(s)
    }

    /// §3 invariant: "A module marked `implemented` may not coexist in the
    /// context with another revision of the same module also marked
    /// `implemented`."
    pub fn insert_module(&mut self, module: Module) -> Result<ModuleId, crate::diagnostics::Diagnostic> {
        if module.implemented {
            if let Some(existing) = self.find_implemented(module.name.as_str()) {
                if self.modules[existing.index()].revisions.first().map(|r| r.date.as_str())
                    != module.revisions.first().map(|r| r.date.as_str())
                {
                    return Err(crate::diagnostics::Diagnostic::error(
                        crate::diagnostics::ErrorKind::InvalidArgument,
                        format!(
                            "module '{}' is already implemented at a different revision",
                            module.name
                        ),
                    ));
                }
            }
        }
        let id = ModuleId(self.modules.len() as u32);
        self.by_name.entry(module.name.to_string()).or_default().push(id);
        self.modules.push(module);
        Ok(id)
    }

    pub fn find_implemented(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name)?.iter().copied().find(|id| self.modules[id.index()].implemented)
    }

    /// `find_module(name, None)` returns the implemented revision if any,
    /// else the most recently inserted one.
    pub fn find_module(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        let candidates = self.by_name.get(name)?;
        match revision {
            Some(rev) => candidates
                .iter()
                .copied()
                .find(|id| self.modules[id.index()].revisions.iter().any(|r| r.date.as_str() == rev)),
            None => self
                .find_implemented(name)
                .or_else(|| candidates.last().copied()),
        }
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(|i| ModuleId(i as u32))
    }

    /// Every distinct registered module name, in first-load order — an
    /// embedder-facing query surface alongside `module_ids`, deterministic
    /// the same way (see `by_name`'s doc comment) rather than hash order.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn node(&self, handle: NodeHandle) -> &SchemaNode {
        &self.modules[handle.module.index()].nodes[handle.node.index()]
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> &mut SchemaNode {
        &mut self.modules[handle.module.index()].nodes[handle.node.index()]
    }

    /// Iterate a sibling ring starting at `head`, following `next` across
    /// module boundaries (augmented children live in the defining module's
    /// arena but link into the target module's ring, §4.4).
    pub fn iter_siblings(&self, head: Option<NodeHandle>) -> ContextSiblingIter<'_> {
        ContextSiblingIter { ctx: self, next: head }
    }

    /// §6 `node-module(node) → main module`: returns the main module even
    /// if the node was declared in a submodule.
    pub fn node_module(&self, handle: NodeHandle) -> ModuleId {
        self.main_module(handle.module)
    }

    /// §6 `main-module(module) → main module`: identity for non-submodules,
    /// otherwise the module this one `belongs-to`.
    pub fn main_module(&self, module: ModuleId) -> ModuleId {
        let m = self.module(module);
        match &m.belongs_to {
            Some(owner) => self.find_module(owner.as_str(), None).unwrap_or(module),
            None => module,
        }
    }

    /// §6 `parent(node) → node | nil`: across augments, returns the
    /// augment's target rather than the augment node itself.
    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        let node = self.node(handle);
        match node.parent {
            Some(p) => {
                let parent_node = self.node(p);
                if let crate::model::NodePayload::Augment(aug) = &parent_node.payload {
                    aug.target.or(Some(p))
                } else {
                    Some(p)
                }
            }
            None => None,
        }
    }

    /// §6 `set-private(node, ptr) → previous-ptr`.
    pub fn set_private(&mut self, handle: NodeHandle, value: Option<usize>) -> Option<usize> {
        let node = self.node_mut(handle);
        std::mem::replace(&mut node.private, value)
    }

    /// §6 `is-disabled(node, recursive) → disabling-feature | nil`.
    ///
    /// `recursive`: `None` checks only `handle` itself; `All` walks every
    /// ancestor (following augment targets per `parent`); `DataOnly` stops
    /// climbing once it reaches a node that can hold a data instance
    /// (container/list/leaf/leaf-list), mirroring the original's
    /// "recursive == 2" early-out.
    pub fn is_disabled(&self, handle: NodeHandle, recursive: Recursive) -> Option<NodeHandle> {
        use crate::model::{IfFeature, NodeKind};
        let mut current = handle;
        loop {
            let node = self.node(current);
            if !matches!(node.kind(), NodeKind::Input | NodeKind::Output) {
                for pred in &node.features {
                    if let IfFeature::Resolved(fh) = pred {
                        if !self.module(fh.module).features[fh.feature.index()].enabled {
                            return Some(current);
                        }
                    }
                }
            }
            if recursive == Recursive::None {
                return None;
            }
            match self.parent(current) {
                Some(p) => {
                    if recursive == Recursive::DataOnly {
                        let pn = self.node(p);
                        if matches!(
                            pn.kind(),
                            NodeKind::Container | NodeKind::Leaf | NodeKind::LeafList | NodeKind::List
                        ) {
                            return None;
                        }
                    }
                    current = p;
                }
                None => return None,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recursive {
    None,
    All,
    DataOnly,
}

pub struct ContextSiblingIter<'a> {
    ctx: &'a Context,
    next: Option<NodeHandle>,
}

impl<'a> Iterator for ContextSiblingIter<'a> {
    type Item = NodeHandle;
    fn next(&mut self) -> Option<NodeHandle> {
        let current = self.next?;
        let node = self.ctx.node(current);
        self.next = node.next;
        Some(current)
    }
}

/// Unused by the core itself; helper so downstream crates can address a
/// node's own arena slot without reaching into `model::ids`.
pub fn handle_of(module: ModuleId, node: NodeId) -> NodeHandle {
    NodeHandle::new(module, node)
}
