// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Sentinel CLI

pub mod analyze;
pub mod config;
pub mod keygen;
pub mod verify;

pub use self::analyze::AnalyzeArgs;
pub use self::config::ConfigCommand;
pub use self::keygen::KeygenArgs;
pub use self::verify::VerifyArgs;
