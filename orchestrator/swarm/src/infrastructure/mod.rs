// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Data-source adapters for specialists.

pub mod static_specialist;

pub use static_specialist::StaticSpecialist;
