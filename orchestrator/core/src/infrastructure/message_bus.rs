// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Signed Message Bus
//!
//! The bus is the only trust boundary between agents. It keeps the registry of
//! agent DIDs and their Ed25519 keys, verifies every inbound envelope, and
//! broadcasts verified envelopes to connected subscribers.
//!
//! ## Publish Pipeline
//!
//! ```text
//! envelope ─▶ from_did present? ─▶ registered? ─▶ signed? ─▶ signature valid?
//!                   │                   │            │               │
//!                   └──── reject ◀──────┴────────────┴───────────────┘
//!                                                                    │
//!                                         history ◀── accept ◀───────┘
//!                                            │
//!                                            └─▶ broadcast to subscribers
//! ```
//!
//! A rejected envelope is dropped; the reason is logged locally and published
//! on the lifecycle [`EventBus`] if one is attached, never returned to the
//! sender.
//!
//! ## Concurrency
//!
//! Registry, subscriber set and history each sit behind their own
//! `parking_lot` lock. Broadcast snapshots the subscriber set, releases the
//! lock, then delivers to every subscriber concurrently. Each delivery has its
//! own deadline. A subscriber whose delivery fails or misses the deadline is
//! removed after the round completes.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::envelope::MessageEnvelope;
use crate::domain::events::MessageBusEvent;
use crate::domain::identity::{AgentIdentity, PUBLIC_KEY_LENGTH};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::signing::{verify_detailed, SigningError};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum MessageBusError {
    #[error("Invalid public key for '{did}': {source}")]
    InvalidPublicKey {
        did: String,
        #[source]
        source: SigningError,
    },
    #[error("Invalid base64 public key for '{did}': {message}")]
    InvalidKeyEncoding { did: String, message: String },
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
    #[error("Delivery timed out after {0:?}")]
    DeliveryTimedOut(Duration),
}

/// Why an envelope was refused at the bus boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("envelope has no from_did")]
    MissingSender,
    #[error("sender '{0}' is not registered")]
    UnknownSender(String),
    #[error("envelope from '{0}' is not signed")]
    MissingSignature(String),
    #[error("invalid signature from '{did}': {reason}")]
    BadSignature { did: String, reason: String },
}

/// Listener connected to the bus.
#[async_trait]
pub trait EnvelopeSink: Send + Sync {
    async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), MessageBusError>;
}

/// Forwards envelopes into a bounded mpsc channel. Full or closed counts as failure.
pub struct ChannelSink {
    sender: mpsc::Sender<MessageEnvelope>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<MessageEnvelope>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving half of a fresh channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MessageEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EnvelopeSink for ChannelSink {
    async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), MessageBusError> {
        self.sender
            .try_send(envelope.clone())
            .map_err(|e| MessageBusError::DeliveryFailed(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber-{}", self.0)
    }
}

/// Audit entry for an accepted envelope. Payload values are not retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub from_did: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub timestamp: String,
    pub payload_keys: Vec<String>,
}

pub struct MessageBus {
    registry: RwLock<HashMap<String, [u8; PUBLIC_KEY_LENGTH]>>,
    subscribers: Mutex<BTreeMap<SubscriberId, Arc<dyn EnvelopeSink>>>,
    next_subscriber: AtomicU64,
    history: Mutex<VecDeque<HistoryRecord>>,
    history_capacity: usize,
    delivery_timeout: Duration,
    event_bus: Option<EventBus>,
}

impl MessageBus {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber: AtomicU64::new(1),
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity: history_capacity.max(1),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            event_bus: None,
        }
    }

    pub fn with_delivery_timeout(mut self, delivery_timeout: Duration) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    // ── Registry ──────────────────────────────────────────────────────────────

    /// Insert or replace the verification key for `did`.
    pub fn register_agent(&self, did: &str, public_key: &[u8]) -> Result<(), MessageBusError> {
        let key: [u8; PUBLIC_KEY_LENGTH] =
            public_key
                .try_into()
                .map_err(|_| MessageBusError::InvalidPublicKey {
                    did: did.to_string(),
                    source: SigningError::InvalidKeyLength(public_key.len()),
                })?;
        self.registry.write().insert(did.to_string(), key);
        info!(did = %did, "Registered agent");
        Ok(())
    }

    pub fn register_identity(&self, identity: &AgentIdentity) -> Result<(), MessageBusError> {
        self.register_agent(&identity.did, &identity.public_key)
    }

    pub fn register_agent_base64(&self, did: &str, public_key: &str) -> Result<(), MessageBusError> {
        let bytes = STANDARD
            .decode(public_key.trim())
            .map_err(|e| MessageBusError::InvalidKeyEncoding {
                did: did.to_string(),
                message: e.to_string(),
            })?;
        self.register_agent(did, &bytes)
    }

    pub fn unregister_agent(&self, did: &str) -> bool {
        let removed = self.registry.write().remove(did).is_some();
        if removed {
            info!(did = %did, "Unregistered agent");
        }
        removed
    }

    pub fn is_registered(&self, did: &str) -> bool {
        self.registry.read().contains_key(did)
    }

    pub fn registered_agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = self.registry.read().keys().cloned().collect();
        agents.sort();
        agents
    }

    // ── Subscribers ───────────────────────────────────────────────────────────

    pub fn connect(&self, sink: Arc<dyn EnvelopeSink>) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().insert(id, sink);
        debug!(subscriber = %id, "Subscriber connected");
        id
    }

    /// Idempotent: returns whether the subscriber was still connected.
    pub fn disconnect(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(&id).is_some();
        if removed {
            debug!(subscriber = %id, "Subscriber disconnected");
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    // ── Publish ───────────────────────────────────────────────────────────────

    /// Check that `envelope` comes from a registered agent and carries a valid
    /// signature by that agent's key.
    pub fn validate(&self, envelope: &MessageEnvelope) -> Result<(), ProtocolViolation> {
        let did = envelope.sender().ok_or(ProtocolViolation::MissingSender)?;

        let public_key = self
            .registry
            .read()
            .get(did)
            .copied()
            .ok_or_else(|| ProtocolViolation::UnknownSender(did.to_string()))?;

        let signature = envelope
            .signature
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProtocolViolation::MissingSignature(did.to_string()))?;

        verify_detailed(&envelope.signing_bytes(), signature, &public_key).map_err(|e| {
            ProtocolViolation::BadSignature {
                did: did.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Verify, record and broadcast `envelope`. Returns whether it was accepted.
    pub async fn publish(&self, envelope: &MessageEnvelope) -> bool {
        if let Err(violation) = self.validate(envelope) {
            match &violation {
                ProtocolViolation::BadSignature { did, reason } => {
                    error!(did = %did, reason = %reason, message_type = %envelope.message_type, "Rejected envelope with invalid signature");
                }
                other => {
                    warn!(reason = %other, message_type = %envelope.message_type, "Rejected envelope");
                }
            }
            if let Some(bus) = &self.event_bus {
                bus.publish_bus_event(MessageBusEvent::EnvelopeRejected {
                    from_did: envelope.sender().map(str::to_string),
                    message_type: envelope.message_type.clone(),
                    reason: violation.to_string(),
                    rejected_at: Utc::now(),
                });
            }
            return false;
        }

        let from_did = envelope.sender().unwrap_or_default().to_string();
        self.record(envelope, &from_did);
        let delivered = self.broadcast(envelope).await;

        info!(did = %from_did, message_type = %envelope.message_type, delivered, "Envelope accepted");
        if let Some(bus) = &self.event_bus {
            bus.publish_bus_event(MessageBusEvent::EnvelopeAccepted {
                from_did,
                message_type: envelope.message_type.clone(),
                subscribers: delivered,
                accepted_at: Utc::now(),
            });
        }
        true
    }

    /// Deliver to every connected subscriber concurrently. Failed subscribers
    /// are dropped. Returns the number of successful deliveries.
    pub async fn broadcast(&self, envelope: &MessageEnvelope) -> usize {
        let snapshot: Vec<(SubscriberId, Arc<dyn EnvelopeSink>)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, sink)| (*id, Arc::clone(sink)))
            .collect();

        if snapshot.is_empty() {
            return 0;
        }

        let deadline = self.delivery_timeout;
        let deliveries = snapshot.iter().map(|(id, sink)| async move {
            let outcome = match tokio::time::timeout(deadline, sink.deliver(envelope)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(MessageBusError::DeliveryTimedOut(deadline)),
            };
            (*id, outcome)
        });
        let outcomes = futures::future::join_all(deliveries).await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(subscriber = %id, error = %e, "Delivery failed, dropping subscriber");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.subscribers.lock();
            for id in &failed {
                subscribers.remove(id);
            }
            drop(subscribers);
            if let Some(bus) = &self.event_bus {
                for id in failed {
                    bus.publish_bus_event(MessageBusEvent::SubscriberDropped {
                        subscriber_id: id.0,
                        dropped_at: Utc::now(),
                    });
                }
            }
        }

        delivered
    }

    // ── History ───────────────────────────────────────────────────────────────

    fn record(&self, envelope: &MessageEnvelope, from_did: &str) {
        let record = HistoryRecord {
            from_did: from_did.to_string(),
            message_type: envelope.message_type.clone(),
            timestamp: envelope.timestamp.clone(),
            payload_keys: envelope.payload.keys().cloned().collect(),
        };
        let mut history = self.history.lock();
        while history.len() >= self.history_capacity {
            history.pop_front();
        }
        history.push_back(record);
    }

    /// Newest `limit` accepted envelopes, oldest first.
    pub fn message_history(&self, limit: usize) -> Vec<HistoryRecord> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
