// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod explainer;
pub mod message_bus;
pub mod settlement;
pub mod signing;
pub mod wallet;

pub use event_bus::{DomainEvent, EventBus, EventBusError, EventReceiver};
pub use message_bus::{ChannelSink, EnvelopeSink, MessageBus, ProtocolViolation};
pub use signing::AgentKeypair;
