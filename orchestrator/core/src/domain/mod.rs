// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Pure types, invariants and collaborator traits. Nothing in this layer
//! performs I/O or spawns tasks.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Envelope, vote, consensus and workflow models shared by every agent

pub mod agent;
pub mod canonical;
pub mod config;
pub mod consensus;
pub mod envelope;
pub mod events;
pub mod identity;
pub mod specialist;
pub mod verdict;
pub mod workflow;
