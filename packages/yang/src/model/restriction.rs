//! Restriction bodies: `when`, `must`, `length`, `range`, `pattern`
//!
//! Corresponds to §3 "Restriction". The expression text itself is opaque to
//! the core — the XPath engine collaborator (§1, out of scope) is the only
//! thing that ever evaluates it; the builder's job is just to hold the
//! textual body plus its documentation fields.

use crate::intern::YangStr;

#[derive(Debug, Clone)]
pub struct Restriction {
    pub expression: YangStr,
    pub description: Option<YangStr>,
    pub reference: Option<YangStr>,
    pub error_app_tag: Option<YangStr>,
    pub error_message: Option<YangStr>,
}

impl Restriction {
    pub fn new(expression: YangStr) -> Self {
        Restriction {
            expression,
            description: None,
            reference: None,
            error_app_tag: None,
            error_message: None,
        }
    }
}

/// A `when` clause. The core only checks it for well-formedness by asking
/// the XPath collaborator (§1); it never evaluates it against data.
pub type When = Restriction;

/// A `must` clause, identical shape to `when` but attached to data nodes
/// rather than `uses`/`augment`/`choice`.
pub type Must = Restriction;
