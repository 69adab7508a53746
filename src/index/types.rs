// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Index, pattern and compound index types.
//!
//! Textual forms follow the `{0, 1, 2}` convention. Patterns use `*` for
//! the range wildcard, `sum` for the summation wildcard and `spin` for the
//! spin marker. Compound forms are comma separated brace groups:
//! `{0, 0}, {1}, {0}, {1}, {0}`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// A concrete basis index: an ordered tuple of integer subindices.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Index(Vec<i32>);

impl Index {
    /// Create an index from its subindices.
    pub fn new(subindices: Vec<i32>) -> Self {
        Self(subindices)
    }

    /// Number of subindices.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Subindices in order.
    pub fn subindices(&self) -> &[i32] {
        &self.0
    }

    /// Subindex at `position`, if present.
    pub fn at(&self, position: usize) -> Option<i32> {
        self.0.get(position).copied()
    }

    /// Copy of this index with the subindex at `position` replaced.
    ///
    /// # Panics
    /// Panics if `position >= self.rank()`.
    pub fn with(&self, position: usize, value: i32) -> Self {
        let mut subindices = self.0.clone();
        subindices[position] = value;
        Self(subindices)
    }
}

impl From<Vec<i32>> for Index {
    fn from(subindices: Vec<i32>) -> Self {
        Self(subindices)
    }
}

impl<const N: usize> From<[i32; N]> for Index {
    fn from(subindices: [i32; N]) -> Self {
        Self(subindices.to_vec())
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_group(f, self.0.iter())
    }
}

impl FromStr for Index {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups = brace_groups(s)?;
        if groups.len() != 1 {
            return Err(IndexError::Parse(format!(
                "expected a single index, found {} groups in '{}'",
                groups.len(),
                s
            )));
        }
        parse_items(groups[0], parse_value).map(Index)
    }
}

/// One element of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subindex {
    /// Must equal the given value.
    Value(i32),
    /// Range over every value, one output entry per value.
    All,
    /// Contract over every value into a single output entry.
    Sum,
    /// Spin subindex, resolved by spin-dependent properties.
    Spin,
}

impl Subindex {
    fn accepts(&self, value: i32) -> bool {
        match self {
            Subindex::Value(v) => *v == value,
            Subindex::All | Subindex::Sum => true,
            Subindex::Spin => value == 0,
        }
    }

    /// Whether this subindex survives into the output key.
    pub(crate) fn is_kept(&self) -> bool {
        matches!(self, Subindex::Value(_) | Subindex::All)
    }
}

impl From<i32> for Subindex {
    fn from(value: i32) -> Self {
        Subindex::Value(value)
    }
}

impl fmt::Display for Subindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subindex::Value(v) => write!(f, "{}", v),
            Subindex::All => write!(f, "*"),
            Subindex::Sum => write!(f, "sum"),
            Subindex::Spin => write!(f, "spin"),
        }
    }
}

impl FromStr for Subindex {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(Subindex::All),
            "sum" => Ok(Subindex::Sum),
            "spin" => Ok(Subindex::Spin),
            other => parse_value(other).map(Subindex::Value),
        }
    }
}

/// An index in which some subindices are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<Subindex>);

impl Pattern {
    /// Create a pattern from its subindices.
    pub fn new(subindices: Vec<Subindex>) -> Self {
        Self(subindices)
    }

    /// Number of subindices, wildcards included.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Subindices in order.
    pub fn subindices(&self) -> &[Subindex] {
        &self.0
    }

    /// Whether any subindex is `wildcard`.
    pub fn contains(&self, wildcard: Subindex) -> bool {
        self.0.contains(&wildcard)
    }

    /// Position of the spin marker. At most one is allowed.
    pub fn spin_position(&self) -> Result<Option<usize>, IndexError> {
        let mut positions = self
            .0
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Subindex::Spin)
            .map(|(i, _)| i);
        let first = positions.next();
        if positions.next().is_some() {
            return Err(IndexError::UnsupportedWildcard {
                wildcard: Subindex::Spin.to_string(),
                context: format!("pattern {} (more than one spin subindex)", self),
            });
        }
        Ok(first)
    }

    /// Whether the concrete `index` satisfies this pattern.
    pub fn matches(&self, index: &Index) -> bool {
        index.rank() == self.rank()
            && self
                .0
                .iter()
                .zip(index.subindices())
                .all(|(s, v)| s.accepts(*v))
    }

    /// Output key of `index`: the subindices at value and range positions.
    pub fn residual(&self, index: &Index) -> Index {
        Index(
            self.0
                .iter()
                .zip(index.subindices())
                .filter(|(s, _)| s.is_kept())
                .map(|(_, v)| *v)
                .collect(),
        )
    }
}

impl From<Vec<Subindex>> for Pattern {
    fn from(subindices: Vec<Subindex>) -> Self {
        Self(subindices)
    }
}

impl<const N: usize> From<[Subindex; N]> for Pattern {
    fn from(subindices: [Subindex; N]) -> Self {
        Self(subindices.to_vec())
    }
}

impl From<&Index> for Pattern {
    fn from(index: &Index) -> Self {
        Self(index.subindices().iter().map(|v| Subindex::Value(*v)).collect())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_group(f, self.0.iter())
    }
}

impl FromStr for Pattern {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups = brace_groups(s)?;
        if groups.len() != 1 {
            return Err(IndexError::Parse(format!(
                "expected a single pattern, found {} groups in '{}'",
                groups.len(),
                s
            )));
        }
        parse_items(groups[0], str::parse::<Subindex>).map(Pattern)
    }
}

/// Concatenation of component indices addressing a tensor-product quantity.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CompoundIndex(Vec<Index>);

impl CompoundIndex {
    /// Create a compound index from its components.
    pub fn from_components(components: Vec<Index>) -> Self {
        Self(components)
    }

    /// Component indices in order.
    pub fn components(&self) -> &[Index] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Split into exactly `arity` components.
    ///
    /// Components from position `single_from` onward must each hold exactly
    /// one subindex.
    pub fn split_exact(
        &self,
        arity: usize,
        single_from: usize,
        context: &str,
    ) -> Result<&[Index], IndexError> {
        if self.0.len() != arity {
            return Err(IndexError::ArityMismatch {
                context: format!("{} (index {})", context, self),
                expected: arity,
                actual: self.0.len(),
            });
        }
        for (n, component) in self.0.iter().enumerate().skip(single_from) {
            if component.rank() != 1 {
                return Err(IndexError::ComponentArity {
                    component: n,
                    expected: 1,
                    actual: component.rank(),
                });
            }
        }
        Ok(&self.0)
    }
}

impl From<Vec<Index>> for CompoundIndex {
    fn from(components: Vec<Index>) -> Self {
        Self(components)
    }
}

impl fmt::Display for CompoundIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_components(f, self.0.iter())
    }
}

impl FromStr for CompoundIndex {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        brace_groups(s)?
            .into_iter()
            .map(|g| parse_items(g, parse_value).map(Index))
            .collect::<Result<Vec<_>, _>>()
            .map(CompoundIndex)
    }
}

/// Compound counterpart of [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundPattern(Vec<Pattern>);

impl CompoundPattern {
    /// Create a compound pattern from its components.
    pub fn from_components(components: Vec<Pattern>) -> Self {
        Self(components)
    }

    /// Component patterns in order.
    pub fn components(&self) -> &[Pattern] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&CompoundIndex> for CompoundPattern {
    fn from(index: &CompoundIndex) -> Self {
        Self(index.components().iter().map(Pattern::from).collect())
    }
}

impl fmt::Display for CompoundPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_components(f, self.0.iter())
    }
}

impl FromStr for CompoundPattern {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        brace_groups(s)?
            .into_iter()
            .map(|g| parse_items(g, str::parse::<Subindex>).map(Pattern))
            .collect::<Result<Vec<_>, _>>()
            .map(CompoundPattern)
    }
}

fn write_group<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    write!(f, "{{")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "}}")
}

fn write_components<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    components: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, component) in components.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", component)?;
    }
    Ok(())
}

/// Contents of each top-level `{...}` group. Separators between groups may
/// be commas or whitespace.
fn brace_groups(s: &str) -> Result<Vec<&str>, IndexError> {
    let mut groups = Vec::new();
    let mut rest = s.trim();
    while !rest.is_empty() {
        let body = rest
            .strip_prefix('{')
            .ok_or_else(|| IndexError::Parse(format!("expected '{{' in '{}'", s)))?;
        let close = body
            .find('}')
            .ok_or_else(|| IndexError::Parse(format!("unclosed '{{' in '{}'", s)))?;
        let inner = &body[..close];
        if inner.contains('{') {
            return Err(IndexError::Parse(format!("nested braces in '{}'", s)));
        }
        groups.push(inner);
        rest = body[close + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    if groups.is_empty() {
        return Err(IndexError::Parse("empty index string".into()));
    }
    Ok(groups)
}

fn parse_items<T>(
    group: &str,
    parse: impl Fn(&str) -> Result<T, IndexError>,
) -> Result<Vec<T>, IndexError> {
    if group.trim().is_empty() {
        return Ok(Vec::new());
    }
    group.split(',').map(|item| parse(item.trim())).collect()
}

fn parse_value(s: &str) -> Result<i32, IndexError> {
    s.parse::<i32>()
        .map_err(|e| IndexError::Parse(format!("invalid subindex '{}': {}", s, e)))
}
