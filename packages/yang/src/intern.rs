//! String dictionary
//!
//! §1 treats the string interning dictionary as an external collaborator;
//! this module is the thin handle type the core consumes from it. Grounded
//! on the refcounted-handle idiom in `ouros::intern` (string interner
//! returning a cheap-to-compare id), adapted to the contract that equal
//! strings compare by pointer and intern/release are paired on every
//! ownership transfer (§5 "Shared resources").
//!
//! `Rc<str>` already gives us pointer-stable, refcounted strings for free:
//! cloning a handle is "intern", dropping it is "release", and two handles
//! for the same text are `Rc::ptr_eq` whenever they came from the same
//! dictionary lookup. Compilation is single-threaded by contract (§5), so
//! `Rc` rather than `Arc` is the right tool.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// An interned string handle. Equality is by content (matching what callers
/// expect from `==`); use [`YangStr::ptr_eq`] when the pointer-equality
/// guarantee from the dictionary is what's being tested, e.g. in tests that
/// assert two lookups of the same name returned the same allocation.
#[derive(Clone)]
pub struct YangStr(Rc<str>);

impl YangStr {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ptr_eq(a: &YangStr, b: &YangStr) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for YangStr {
    fn default() -> Self {
        YangStr(Rc::from(""))
    }
}

impl PartialEq for YangStr {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for YangStr {}

impl std::hash::Hash for YangStr {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Debug for YangStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for YangStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::ops::Deref for YangStr {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for YangStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for YangStr {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

/// The dictionary itself. Interning is idempotent: calling it twice with the
/// same text returns handles that are `Rc::ptr_eq`. The table only holds a
/// weak-ish de-duplication entry (we keep one `Rc` alive per distinct
/// string); `gc` drops entries whose only remaining reference is the table's
/// own, i.e. nobody outside the dictionary holds the string anymore.
#[derive(Default)]
pub struct Dictionary {
    table: RefCell<HashMap<Box<str>, Rc<str>>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, text: &str) -> YangStr {
        let mut table = self.table.borrow_mut();
        if let Some(existing) = table.get(text) {
            return YangStr(existing.clone());
        }
        let rc: Rc<str> = Rc::from(text);
        table.insert(text.into(), rc.clone());
        YangStr(rc)
    }

    /// Drop dictionary entries that are no longer referenced by any live
    /// `YangStr` handle. Not required for correctness (the table would just
    /// keep every string alive for the dictionary's lifetime otherwise) but
    /// keeps long-running contexts that load and release many modules from
    /// growing unboundedly.
    pub fn gc(&self) {
        self.table.borrow_mut().retain(|_, rc| Rc::strong_count(rc) > 1);
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
