//! Fixed-size-chunk growable arrays
//!
//! Corresponds to §4.1 "Array-typed attributes ... grow in fixed-size
//! chunks; the builder refuses additions beyond pre-counted sizes if the
//! front end declared a count (two-pass mode)" and §4.5. The two-pass
//! distinction is a property of the container itself here, rather than a
//! flag threaded through every caller, since every array-typed attribute in
//! the data model (children, imports, typedefs, ...) needs it.

use crate::diagnostics::{BuildResult, Diagnostic, ErrorKind};

#[derive(Debug, Clone, Default)]
pub struct Growable<T> {
    items: Vec<T>,
    /// `Some(n)` once the size pass has declared a cardinality; pushes
    /// beyond `n` are a builder bug (the size pass under-counted) rather
    /// than a user error, so they report as `Internal`.
    locked_capacity: Option<usize>,
}

impl<T> Growable<T> {
    pub fn new() -> Self {
        Growable { items: Vec::new(), locked_capacity: None }
    }

    pub fn with_size_hint(count: usize) -> Self {
        Growable { items: Vec::with_capacity(count), locked_capacity: Some(count) }
    }

    pub fn push(&mut self, item: T) -> BuildResult<usize> {
        if let Some(cap) = self.locked_capacity {
            if self.items.len() >= cap {
                return Err(Diagnostic::error(
                    ErrorKind::Internal,
                    format!(
                        "array overflow: size pass counted {} entries but the build pass produced more",
                        cap
                    ),
                ));
            }
        }
        let idx = self.items.len();
        self.items.push(item);
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T> std::ops::Index<usize> for Growable<T> {
    type Output = T;
    fn index(&self, idx: usize) -> &T {
        &self.items[idx]
    }
}

impl<T> std::ops::IndexMut<usize> for Growable<T> {
    fn index_mut(&mut self, idx: usize) -> &mut T {
        &mut self.items[idx]
    }
}

impl<T> IntoIterator for Growable<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Growable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
