// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure fusion logic. No I/O, no runtime.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`fusion`] | `FusionPolicy`, `fuse` |
//! | [`failure`] | `UnitFailure` |

pub mod failure;
pub mod fusion;

pub use failure::UnitFailure;
pub use fusion::{fuse, FusionPolicy};
