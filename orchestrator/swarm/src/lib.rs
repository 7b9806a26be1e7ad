// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `sentinel-swarm` — Specialist Fan-out Crate
//!
//! Runs a group of independent risk-scanning units (a **swarm** of
//! specialists) against one target and fuses their answers into a single
//! [`AggregatedResult`](sentinel_core::domain::specialist::AggregatedResult).
//! The Oracle pipeline stage is built on top of it.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `FusionPolicy`, `fuse`, `UnitFailure` |
//! | [`application`] | Application | `SpecialistCoordinator`, `OracleAgent` |
//! | [`infrastructure`] | Infrastructure | `StaticSpecialist` canned data source |
//!
//! ## Key Concepts
//!
//! - **Isolation**: one unit erroring, panicking or timing out never aborts its
//!   siblings; it is recorded as a degraded result instead.
//! - **Shared deadline**: a single overall timeout bounds the whole fan-out.
//!   Units still pending at the deadline are aborted and their late results are
//!   never observed.
//! - **Fusion**: weighted mean of unit risks, max severity, and confidence as
//!   the fraction of units that succeeded.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CoordinatorError, OracleAgent, OracleStatus, SpecialistCoordinator};
pub use domain::*;
pub use infrastructure::StaticSpecialist;
