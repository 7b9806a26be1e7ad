// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application services of the swarm crate.
//!
//! - [`coordinator`]: concurrent fan-out with a shared deadline
//! - [`oracle`]: the `oracle` pipeline stage and hire-request handling

pub mod coordinator;
pub mod oracle;

pub use coordinator::{CoordinatorError, SpecialistCoordinator};
pub use oracle::{OracleAgent, OracleStatus};
