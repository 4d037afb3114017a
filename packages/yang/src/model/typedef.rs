//! §3 "Typedef"

use crate::intern::YangStr;
use crate::model::ids::ModuleId;
use crate::model::types::Type;

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: YangStr,
    pub module: ModuleId,
    pub ty: Type,
    pub default: Option<YangStr>,
    pub units: Option<YangStr>,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
}

impl Typedef {
    pub fn new(name: YangStr, module: ModuleId, ty: Type) -> Self {
        Typedef { name, module, ty, default: None, units: None, description: None, reference: None }
    }
}
