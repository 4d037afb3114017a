//! §3 "Identity"
//!
//! Base references start out as raw text pending resolution (unres kind
//! `ident-base`, §4.2); `derived` is a pure back-edge populated once the
//! resolver links a child identity to this one (§8 "for every identity I
//! with base B, I ∈ B.derived-set").

use crate::intern::YangStr;
use crate::model::ids::{IdentityHandle, ModuleId};

#[derive(Debug, Clone)]
pub enum IdentityBase {
    Pending(YangStr),
    Resolved(IdentityHandle),
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub name: YangStr,
    pub module: ModuleId,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub bases: Vec<IdentityBase>,
    pub derived: Vec<IdentityHandle>,
}

impl Identity {
    pub fn new(name: YangStr, module: ModuleId) -> Self {
        Identity { name, module, description: None, reference: None, bases: Vec::new(), derived: Vec::new() }
    }
}
