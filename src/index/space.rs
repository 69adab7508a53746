// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Canonical enumeration of the concrete indices a model defines.

use std::collections::{BTreeSet, HashMap};

use super::types::Index;
use crate::error::IndexError;

/// The finite set of basis indices of a model.
///
/// Indices are held in canonical (lexicographic) order. The offset of an
/// index is its position in that order and equals the row of the index in
/// eigenvector storage.
#[derive(Debug, Clone, Default)]
pub struct IndexSpace {
    indices: Vec<Index>,
    offsets: HashMap<Index, usize>,
    ranks: BTreeSet<usize>,
}

impl IndexSpace {
    /// Build an index space. Duplicates are rejected.
    pub fn new(indices: impl IntoIterator<Item = Index>) -> Result<Self, IndexError> {
        let mut indices: Vec<Index> = indices.into_iter().collect();
        indices.sort();

        let mut offsets = HashMap::with_capacity(indices.len());
        let mut ranks = BTreeSet::new();
        for (offset, index) in indices.iter().enumerate() {
            if offsets.insert(index.clone(), offset).is_some() {
                return Err(IndexError::Duplicate(index.to_string()));
            }
            ranks.insert(index.rank());
        }

        Ok(Self {
            indices,
            offsets,
            ranks,
        })
    }

    /// Number of basis elements.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Offset of `index` in canonical order.
    pub fn offset(&self, index: &Index) -> Option<usize> {
        self.offsets.get(index).copied()
    }

    /// Offset of `index`, or `UnknownIndex`.
    pub fn require_offset(&self, index: &Index) -> Result<usize, IndexError> {
        self.offset(index)
            .ok_or_else(|| IndexError::UnknownIndex(index.to_string()))
    }

    /// Index at `offset`.
    pub fn index(&self, offset: usize) -> Option<&Index> {
        self.indices.get(offset)
    }

    pub fn contains(&self, index: &Index) -> bool {
        self.offsets.contains_key(index)
    }

    /// Indices in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indices.iter()
    }

    /// Distinct ranks present, ascending.
    pub fn ranks(&self) -> Vec<usize> {
        self.ranks.iter().copied().collect()
    }

    pub fn has_rank(&self, rank: usize) -> bool {
        self.ranks.contains(&rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let space = IndexSpace::new(vec![
            Index::from([1, 0]),
            Index::from([0, 1]),
            Index::from([0, 0]),
            Index::from([1, 1]),
        ])
        .unwrap();

        let order: Vec<String> = space.iter().map(|i| i.to_string()).collect();
        assert_eq!(order, vec!["{0, 0}", "{0, 1}", "{1, 0}", "{1, 1}"]);
        assert_eq!(space.offset(&Index::from([1, 0])), Some(2));
        assert_eq!(space.index(3), Some(&Index::from([1, 1])));
    }

    #[test]
    fn test_mixed_ranks() {
        let space = IndexSpace::new(vec![
            Index::from([0]),
            Index::from([0, 0, 1]),
            Index::from([1]),
        ])
        .unwrap();
        assert_eq!(space.ranks(), vec![1, 3]);
        assert!(space.has_rank(3));
        assert!(!space.has_rank(2));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = IndexSpace::new(vec![Index::from([0]), Index::from([0])]);
        assert_eq!(result.unwrap_err(), IndexError::Duplicate("{0}".into()));
    }

    #[test]
    fn test_require_offset_unknown() {
        let space = IndexSpace::new(vec![Index::from([0])]).unwrap();
        assert!(matches!(
            space.require_offset(&Index::from([5])),
            Err(IndexError::UnknownIndex(_))
        ));
    }
}
