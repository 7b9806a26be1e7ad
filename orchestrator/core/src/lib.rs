// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Sentinel Core
//!
//! Signed agent messaging, weighted multi-agent consensus and the sequential
//! analysis pipeline that ties them together.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, use cases and in-process adapters for the orchestrator

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
