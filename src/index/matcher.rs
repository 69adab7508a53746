// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolution of patterns against an [`IndexSpace`].
//!
//! A pattern resolves to an ordered list of [`MatchGroup`]s. Each group is
//! one output entry: its key is the residual index (summed and spin
//! positions removed) and its members are the concrete sites contracted
//! into that entry. Range wildcards produce one group per value, summation
//! wildcards fold every value into the same group.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use super::space::IndexSpace;
use super::types::{CompoundIndex, CompoundPattern, Index, Pattern, Subindex};
use crate::error::IndexError;

/// A concrete basis element selected by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// The concrete index (spin subindex, if any, set to 0).
    pub index: Index,
    /// Offset of `index` in the index space.
    pub offset: usize,
    /// Offset of the spin-1 partner when the pattern has a spin marker.
    pub spin_partner: Option<usize>,
}

/// One output entry of a resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup<K, M = Site> {
    pub key: K,
    pub members: Vec<M>,
}

/// Resolves patterns against an index space.
#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'a> {
    space: &'a IndexSpace,
}

impl<'a> PatternMatcher<'a> {
    /// Create a matcher over `space`.
    pub fn new(space: &'a IndexSpace) -> Self {
        Self { space }
    }

    /// Resolve a single pattern in canonical order.
    pub fn match_pattern(&self, pattern: &Pattern) -> Result<Vec<MatchGroup<Index>>, IndexError> {
        let spin = pattern.spin_position()?;
        self.check_rank(pattern)?;

        let mut groups = GroupBuilder::default();
        for (offset, index) in self.space.iter().enumerate() {
            if !pattern.matches(index) {
                continue;
            }
            let site = self.site(index.clone(), offset, spin)?;
            groups.add(pattern.residual(index), site);
        }

        if groups.is_empty() {
            debug!(pattern = %pattern, "Pattern matched no indices");
        }
        Ok(groups.finish())
    }

    /// Resolve several patterns into the union of their groups.
    ///
    /// Identical groups produced by more than one pattern appear once. The
    /// same key produced from different index sets is rejected.
    pub fn match_patterns(
        &self,
        patterns: &[Pattern],
    ) -> Result<Vec<MatchGroup<Index>>, IndexError> {
        let mut merged = Union::default();
        for pattern in patterns {
            for group in self.match_pattern(pattern)? {
                merged.insert(group)?;
            }
        }
        Ok(merged.groups)
    }

    /// Resolve a pattern by iterating wildcard positions over explicit
    /// ranges.
    ///
    /// Range and summation positions take the values `0..ranges[i]`; value
    /// positions ignore their range. Every generated index must exist.
    pub fn match_ranges(
        &self,
        pattern: &Pattern,
        ranges: &[usize],
    ) -> Result<Vec<MatchGroup<Index>>, IndexError> {
        if ranges.len() != pattern.rank() {
            return Err(IndexError::ArityMismatch {
                context: format!("ranges for pattern {}", pattern),
                expected: pattern.rank(),
                actual: ranges.len(),
            });
        }
        let spin = pattern.spin_position()?;
        self.check_rank(pattern)?;

        let axes: Vec<Vec<i32>> = pattern
            .subindices()
            .iter()
            .zip(ranges)
            .map(|(subindex, &range)| match subindex {
                Subindex::Value(v) => vec![*v],
                Subindex::All | Subindex::Sum => (0..range as i32).collect(),
                Subindex::Spin => vec![0],
            })
            .collect();

        let mut groups = GroupBuilder::default();
        for subindices in cartesian(&axes) {
            let index = Index::new(subindices);
            let offset = self.space.require_offset(&index)?;
            let key = pattern.residual(&index);
            let site = self.site(index, offset, spin)?;
            groups.add(key, site);
        }
        Ok(groups.finish())
    }

    /// Resolve compound patterns of exactly `arity` components.
    ///
    /// The groups of each component are combined as a cartesian product,
    /// and each member holds one site per component.
    pub fn match_compound(
        &self,
        patterns: &[CompoundPattern],
        arity: usize,
        context: &str,
    ) -> Result<Vec<MatchGroup<CompoundIndex, Vec<Site>>>, IndexError> {
        let mut merged = Union::default();
        for pattern in patterns {
            if pattern.len() != arity {
                return Err(IndexError::ArityMismatch {
                    context: format!("{} (pattern {})", context, pattern),
                    expected: arity,
                    actual: pattern.len(),
                });
            }

            let mut combos: Vec<(Vec<Index>, Vec<Vec<Site>>)> =
                vec![(Vec::new(), vec![Vec::new()])];
            for component in pattern.components() {
                let groups = self.match_pattern(component)?;
                let mut next = Vec::with_capacity(combos.len() * groups.len());
                for (keys, members) in &combos {
                    for group in &groups {
                        let mut key = keys.clone();
                        key.push(group.key.clone());
                        let product = members
                            .iter()
                            .flat_map(|prefix| {
                                group.members.iter().map(move |site| {
                                    let mut member = prefix.clone();
                                    member.push(site.clone());
                                    member
                                })
                            })
                            .collect();
                        next.push((key, product));
                    }
                }
                combos = next;
            }

            for (keys, members) in combos {
                merged.insert(MatchGroup {
                    key: CompoundIndex::from_components(keys),
                    members,
                })?;
            }
        }
        Ok(merged.groups)
    }

    fn check_rank(&self, pattern: &Pattern) -> Result<(), IndexError> {
        if self.space.has_rank(pattern.rank()) {
            Ok(())
        } else {
            Err(IndexError::RankMismatch {
                pattern: pattern.to_string(),
                available: self.space.ranks(),
            })
        }
    }

    fn site(&self, index: Index, offset: usize, spin: Option<usize>) -> Result<Site, IndexError> {
        let spin_partner = match spin {
            Some(position) => Some(self.space.require_offset(&index.with(position, 1))?),
            None => None,
        };
        Ok(Site {
            index,
            offset,
            spin_partner,
        })
    }
}

/// Groups sites by key, preserving first-seen key order.
#[derive(Default)]
struct GroupBuilder {
    groups: Vec<MatchGroup<Index>>,
    positions: HashMap<Index, usize>,
}

impl GroupBuilder {
    fn add(&mut self, key: Index, site: Site) {
        match self.positions.get(&key) {
            Some(&position) => self.groups[position].members.push(site),
            None => {
                self.positions.insert(key.clone(), self.groups.len());
                self.groups.push(MatchGroup {
                    key,
                    members: vec![site],
                });
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn finish(self) -> Vec<MatchGroup<Index>> {
        self.groups
    }
}

/// Union of groups across patterns.
struct Union<K, M> {
    groups: Vec<MatchGroup<K, M>>,
    positions: HashMap<K, usize>,
}

impl<K, M> Default for Union<K, M> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<K, M> Union<K, M>
where
    K: Clone + Eq + Hash + std::fmt::Display,
    M: PartialEq,
{
    fn insert(&mut self, group: MatchGroup<K, M>) -> Result<(), IndexError> {
        match self.positions.get(&group.key) {
            Some(&position) if self.groups[position].members == group.members => Ok(()),
            Some(_) => Err(IndexError::AmbiguousKey(group.key.to_string())),
            None => {
                self.positions.insert(group.key.clone(), self.groups.len());
                self.groups.push(group);
                Ok(())
            }
        }
    }
}

/// Lexicographic cartesian product of the value lists.
fn cartesian(axes: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let mut product = vec![Vec::with_capacity(axes.len())];
    for axis in axes {
        product = product
            .into_iter()
            .flat_map(|prefix| {
                axis.iter().map(move |&value| {
                    let mut next = prefix.clone();
                    next.push(value);
                    next
                })
            })
            .collect();
    }
    product
}
