// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Basis indices, wildcard patterns and pattern resolution.
//!
//! - [`Index`]: concrete basis index `{x, y, s}`
//! - [`Pattern`]: index with [`Subindex`] wildcards
//! - [`CompoundIndex`] / [`CompoundPattern`]: concatenated components for
//!   two-particle quantities
//! - [`IndexSpace`]: canonical enumeration of a model's indices
//! - [`PatternMatcher`]: resolves patterns into ordered [`MatchGroup`]s

pub mod matcher;
pub mod space;
pub mod types;

pub use matcher::{MatchGroup, PatternMatcher, Site};
pub use space::IndexSpace;
pub use types::{CompoundIndex, CompoundPattern, Index, Pattern, Subindex};
