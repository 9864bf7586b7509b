// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation registry: the concurrent table of in-flight requests.
//!
//! Each published request owns a [`SlotHandle`] holding a single-shot reply
//! channel. The reply listener resolves slots through [`Registry::complete`];
//! the awaiting request task resolves them through its own deadline or
//! cancellation. The first terminal claim wins — the slot carries an atomic
//! state word (`Pending → {Completed, TimedOut, Cancelled}`) and the losing
//! side is a no-op. A slot is removed from the table on every terminal
//! signal, including the handler future being dropped mid-await.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::envelope::ResponseEnvelope;

const STATE_PENDING: u8 = 0;
const STATE_COMPLETED: u8 = 1;
const STATE_TIMED_OUT: u8 = 2;
const STATE_CANCELLED: u8 = 3;

/// Terminal-state word shared between the table entry and the slot handle.
struct SlotState {
    state: AtomicU8,
}

impl SlotState {
    fn new() -> Self {
        Self { state: AtomicU8::new(STATE_PENDING) }
    }

    /// Claim the terminal state. Returns true iff this call performed the
    /// `Pending → terminal` transition; transitions are exclusive.
    fn claim(&self, terminal: u8) -> bool {
        self.state
            .compare_exchange(STATE_PENDING, terminal, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Table entry for one in-flight request.
struct PendingSlot {
    tx: oneshot::Sender<ResponseEnvelope>,
    state: Arc<SlotState>,
}

/// Outcome of [`Registry::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    /// The reply was handed to the waiter.
    Delivered,
    /// No slot exists for this correlation id; the reply is dropped.
    Orphan,
    /// The slot had already been terminated by timeout or cancellation in the
    /// window before its removal; the reply is dropped.
    LateCompletion,
}

/// Outcome of [`SlotHandle::await_reply`].
#[derive(Debug)]
pub enum AwaitOutcome {
    Reply(ResponseEnvelope),
    TimedOut,
    Cancelled,
}

/// Why a [`Registry::register`] call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The correlation id is already in flight. Never expected; the losing
    /// request surfaces this as an internal error.
    Duplicate,
    /// The configured in-flight ceiling was reached.
    Full,
}

/// Per-registry counters, exposed on the metrics endpoint.
#[derive(Default)]
pub struct RegistryCounters {
    pub registered: AtomicU64,
    pub delivered: AtomicU64,
    pub orphaned: AtomicU64,
    pub late: AtomicU64,
    pub timed_out: AtomicU64,
    pub cancelled: AtomicU64,
}

/// Concurrent map from correlation id to pending reply slot.
///
/// Cheap to clone; all clones share the same table and counters.
#[derive(Clone)]
pub struct Registry {
    pending: Arc<DashMap<String, PendingSlot>>,
    counters: Arc<RegistryCounters>,
    /// 0 means unlimited.
    max_in_flight: usize,
}

impl Registry {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            counters: Arc::new(RegistryCounters::default()),
            max_in_flight,
        }
    }

    /// Insert a new pending slot and return the handle the request task will
    /// await on. The deadline starts counting immediately.
    pub fn register(
        &self,
        id: impl Into<String>,
        timeout: Duration,
    ) -> Result<SlotHandle, RegisterError> {
        let id = id.into();
        if self.max_in_flight > 0 && self.pending.len() >= self.max_in_flight {
            return Err(RegisterError::Full);
        }

        let (tx, rx) = oneshot::channel();
        let state = Arc::new(SlotState::new());
        match self.pending.entry(id.clone()) {
            Entry::Occupied(_) => Err(RegisterError::Duplicate),
            Entry::Vacant(vacant) => {
                vacant.insert(PendingSlot { tx, state: Arc::clone(&state) });
                self.counters.registered.fetch_add(1, Ordering::Relaxed);
                Ok(SlotHandle {
                    id,
                    rx,
                    deadline: Instant::now() + timeout,
                    state,
                    pending: Arc::clone(&self.pending),
                    counters: Arc::clone(&self.counters),
                })
            }
        }
    }

    /// Resolve a pending slot with a reply. Called by the reply listener.
    pub fn complete(&self, id: &str, envelope: ResponseEnvelope) -> CompleteOutcome {
        let Some((_, slot)) = self.pending.remove(id) else {
            self.counters.orphaned.fetch_add(1, Ordering::Relaxed);
            return CompleteOutcome::Orphan;
        };

        if slot.state.claim(STATE_COMPLETED) && slot.tx.send(envelope).is_ok() {
            self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            CompleteOutcome::Delivered
        } else {
            self.counters.late.fetch_add(1, Ordering::Relaxed);
            CompleteOutcome::LateCompletion
        }
    }

    /// Number of requests currently awaiting a reply.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn counters(&self) -> &RegistryCounters {
        &self.counters
    }
}

/// Handle to one pending slot, owned by the request task.
///
/// Dropping the handle without awaiting (client disconnect drops the handler
/// future) claims `Cancelled` and removes the slot from the table.
pub struct SlotHandle {
    id: String,
    rx: oneshot::Receiver<ResponseEnvelope>,
    deadline: Instant,
    state: Arc<SlotState>,
    pending: Arc<DashMap<String, PendingSlot>>,
    counters: Arc<RegistryCounters>,
}

impl SlotHandle {
    pub fn correlation_id(&self) -> &str {
        &self.id
    }

    /// Await the reply until the deadline elapses or `cancel` fires.
    ///
    /// Exactly one terminal event is observable per slot: if the completion
    /// raced ahead of the deadline the buffered reply still wins, otherwise
    /// this side claims the terminal state and deregisters the slot.
    pub async fn await_reply(mut self, cancel: &CancellationToken) -> AwaitOutcome {
        enum Wakeup {
            Reply(Result<ResponseEnvelope, oneshot::error::RecvError>),
            Deadline,
            Shutdown,
        }

        let deadline = self.deadline;
        let wakeup = tokio::select! {
            reply = &mut self.rx => Wakeup::Reply(reply),
            _ = tokio::time::sleep_until(deadline) => Wakeup::Deadline,
            _ = cancel.cancelled() => Wakeup::Shutdown,
        };

        match wakeup {
            Wakeup::Reply(Ok(envelope)) => AwaitOutcome::Reply(envelope),
            // Sender dropped without a send: the registry itself went away.
            Wakeup::Reply(Err(_)) => AwaitOutcome::Cancelled,
            Wakeup::Deadline => {
                if self.state.claim(STATE_TIMED_OUT) {
                    self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    remove_slot(&self.pending, &self.id, &self.state);
                    AwaitOutcome::TimedOut
                } else {
                    // Completion claimed first; the reply is in the channel.
                    self.recv_claimed_reply().await
                }
            }
            Wakeup::Shutdown => {
                if self.state.claim(STATE_CANCELLED) {
                    self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
                    remove_slot(&self.pending, &self.id, &self.state);
                    AwaitOutcome::Cancelled
                } else {
                    self.recv_claimed_reply().await
                }
            }
        }
    }

    /// Drain the reply the completion side already committed to sending.
    async fn recv_claimed_reply(&mut self) -> AwaitOutcome {
        match (&mut self.rx).await {
            Ok(envelope) => AwaitOutcome::Reply(envelope),
            Err(_) => AwaitOutcome::Cancelled,
        }
    }
}

impl Drop for SlotHandle {
    fn drop(&mut self) {
        // No-op when await_reply already observed a terminal state.
        if self.state.claim(STATE_CANCELLED) {
            self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
            remove_slot(&self.pending, &self.id, &self.state);
        }
    }
}

/// Remove the slot only if the entry still belongs to this handle: a retried
/// client may re-register the same correlation id after a timeout.
fn remove_slot(pending: &DashMap<String, PendingSlot>, id: &str, state: &Arc<SlotState>) {
    pending.remove_if(id, |_, slot| Arc::ptr_eq(&slot.state, state));
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
