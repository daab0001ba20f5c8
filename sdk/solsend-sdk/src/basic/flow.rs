use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::info;

use crate::error::TransitionError;

/// Lifecycle of creating the receiver's associated token account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreationState {
    #[default]
    NotInitiated,
    Initialized,
    Pending,
    Success,
    Failed,
    Completed,
}

impl CreationState {
    /// Forward transitions. Dismissal back to `NotInitiated` is allowed from
    /// any state and handled separately.
    pub fn can_transition_to(self, next: CreationState) -> bool {
        use CreationState::*;
        matches!(
            (self, next),
            (NotInitiated, Initialized)
                | (Initialized, Pending)
                | (Pending, Success)
                | (Pending, Failed)
                | (Success, Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CreationState::Completed | CreationState::Failed)
    }

    /// Whether the affordance that advances the flow may be enabled
    pub fn accepts_confirmation(self) -> bool {
        self == CreationState::Initialized
    }
}

#[derive(Debug)]
struct FlowInner {
    state: CreationState,
    attempt: u64,
}

/// Single-owner state machine for the account creation sub-flow.
///
/// Every attempt has an id. Transitions that complete asynchronous work
/// carry the id they started under, so results arriving after a dismissal
/// are rejected as stale instead of moving the new attempt.
#[derive(Debug)]
pub struct AssociatedAccountFlow {
    inner: Mutex<FlowInner>,
    notify: watch::Sender<CreationState>,
}

impl Default for AssociatedAccountFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociatedAccountFlow {
    pub fn new() -> Self {
        let (notify, _) = watch::channel(CreationState::NotInitiated);
        Self {
            inner: Mutex::new(FlowInner {
                state: CreationState::NotInitiated,
                attempt: 0,
            }),
            notify,
        }
    }

    pub fn state(&self) -> CreationState {
        self.lock().state
    }

    pub fn attempt(&self) -> u64 {
        self.lock().attempt
    }

    /// Receiver observing every state change
    pub fn subscribe(&self) -> watch::Receiver<CreationState> {
        self.notify.subscribe()
    }

    /// Start a fresh attempt in `NotInitiated`
    pub fn reset(&self) -> u64 {
        let mut inner = self.lock();
        inner.attempt += 1;
        self.set(&mut inner, CreationState::NotInitiated);
        inner.attempt
    }

    /// User dismissal. Anything still in flight for the current attempt
    /// becomes stale.
    pub fn dismiss(&self) -> u64 {
        let mut inner = self.lock();
        info!(from = ?inner.state, attempt = inner.attempt, "account creation dismissed");
        inner.attempt += 1;
        self.set(&mut inner, CreationState::NotInitiated);
        inner.attempt
    }

    /// `NotInitiated -> Initialized`; returns the attempt id
    pub fn initialize(&self) -> Result<u64, TransitionError> {
        let mut inner = self.lock();
        self.advance(&mut inner, None, CreationState::Initialized)?;
        Ok(inner.attempt)
    }

    /// `Initialized -> Pending`; at most one creation is in flight per attempt
    pub fn begin_creation(&self) -> Result<u64, TransitionError> {
        let mut inner = self.lock();
        self.advance(&mut inner, None, CreationState::Pending)?;
        Ok(inner.attempt)
    }

    /// `Pending -> Success`
    pub fn creation_confirmed(&self, attempt: u64) -> Result<(), TransitionError> {
        let mut inner = self.lock();
        self.advance(&mut inner, Some(attempt), CreationState::Success)
    }

    /// `Pending -> Failed`
    pub fn creation_failed(&self, attempt: u64) -> Result<(), TransitionError> {
        let mut inner = self.lock();
        self.advance(&mut inner, Some(attempt), CreationState::Failed)
    }

    /// `Success -> Completed`
    pub fn complete(&self, attempt: u64) -> Result<(), TransitionError> {
        let mut inner = self.lock();
        self.advance(&mut inner, Some(attempt), CreationState::Completed)
    }

    fn advance(
        &self,
        inner: &mut FlowInner,
        attempt: Option<u64>,
        to: CreationState,
    ) -> Result<(), TransitionError> {
        if let Some(attempt) = attempt {
            if attempt != inner.attempt {
                return Err(TransitionError::StaleAttempt {
                    attempt,
                    current: inner.attempt,
                });
            }
        }
        if !inner.state.can_transition_to(to) {
            return Err(TransitionError::Illegal {
                from: inner.state,
                to,
            });
        }
        info!(from = ?inner.state, ?to, attempt = inner.attempt, "account creation transition");
        self.set(inner, to);
        Ok(())
    }

    fn set(&self, inner: &mut FlowInner, state: CreationState) {
        inner.state = state;
        self.notify.send_replace(state);
    }

    fn lock(&self) -> MutexGuard<'_, FlowInner> {
        // The guarded data stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
