// /////////////////////////////////////////////////////////////////////////////
// SentryStream
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The `Filter` port (§3, §4.3). Implementations are cheap, synchronous
//! predicates; `apply` takes `&self` because a single Capture invokes the
//! same filter instance concurrently with its own interior mutability for
//! stats (a `parking_lot::Mutex<FilterStats>` in the engine's
//! implementations).

use crate::entities::stats::FilterStats;
use crate::value_objects::enums::FilterPriority;

pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> FilterPriority;

    /// Evaluate the predicate over a chunk. `true` means "accept" — for
    /// the length filter this reads as "not too long"; the pipeline
    /// composes these uniformly per §4.3.
    fn apply(&self, bytes: &[u8]) -> bool;

    fn stats(&self) -> FilterStats;
}
