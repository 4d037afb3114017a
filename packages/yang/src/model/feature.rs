//! §3 "Feature" / if-feature predicates
//!
//! A predicate slot starts as a self-reference sentinel (the qualified
//! name as written) and becomes a resolved [`FeatureHandle`] once the
//! resolver discharges the `iffeat` unres entry (§4.2, §3 "Schema node").

use crate::intern::YangStr;
use crate::model::ids::{FeatureHandle, ModuleId};

#[derive(Debug, Clone)]
pub enum IfFeature {
    Pending(YangStr),
    Resolved(FeatureHandle),
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub name: YangStr,
    pub module: ModuleId,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub enabled: bool,
    pub predicates: Vec<IfFeature>,
}

impl Feature {
    pub fn new(name: YangStr, module: ModuleId) -> Self {
        Feature { name, module, description: None, reference: None, enabled: false, predicates: Vec::new() }
    }
}
