//! Grant scopes

use std::{slice, vec};

use aliri_braid::braid;
use serde::Serialize;

/// A single scope carried by a grant, such as `read:email`
#[braid(serde, ref_doc = "A borrowed reference to a [`Scope`]")]
pub struct Scope;

/// An ordered set of scopes
///
/// Scopes keep the order in which they were first inserted. Inserting a
/// scope that is already present leaves the set unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[must_use]
pub struct Scopes(Vec<Scope>);

impl Scopes {
    /// Produces an empty scope set
    #[inline]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Adds a scope to the end of the set
    ///
    /// Returns `false` if the scope was already present.
    pub fn insert(&mut self, scope: Scope) -> bool {
        if self.contains(&scope) {
            false
        } else {
            self.0.push(scope);
            true
        }
    }

    /// Checks whether the set holds `scope`
    #[must_use]
    pub fn contains(&self, scope: &ScopeRef) -> bool {
        self.0.iter().any(|s| s.as_str() == scope.as_str())
    }

    /// Produces an iterator of the scopes in this set, in order
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// The number of scopes in the set
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no scopes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<Scope> for Scopes {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Scope>,
    {
        for scope in iter {
            self.insert(scope);
        }
    }
}

impl FromIterator<Scope> for Scopes {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for Scopes {
    type Item = Scope;
    type IntoIter = vec::IntoIter<Scope>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An iterator over a set of borrowed scopes
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    iter: slice::Iter<'a, Scope>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ScopeRef;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|x| &**x)
    }
}

impl<'a> IntoIterator for &'a Scopes {
    type Item = &'a ScopeRef;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        Iter {
            iter: self.0.iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence_order() {
        let scopes: Scopes = ["b", "a", "b", "c"]
            .into_iter()
            .map(Scope::from_static)
            .collect();

        let names: Vec<&str> = scopes.iter().map(ScopeRef::as_str).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut scopes = Scopes::new();
        assert!(scopes.insert(Scope::from_static("read:email")));
        assert!(!scopes.insert(Scope::from_static("read:email")));
        assert_eq!(scopes.len(), 1);
        assert!(scopes.contains(ScopeRef::from_str("read:email")));
        assert!(!scopes.contains(ScopeRef::from_str("write:email")));
    }

    #[test]
    fn serializes_as_array() -> color_eyre::Result<()> {
        let scopes: Scopes = vec![Scope::from_static("x"), Scope::from_static("y")]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&scopes)?, r#"["x","y"]"#);
        Ok(())
    }
}
