use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::{
    registry::{MatchResult, WaitingRegistry},
    sessions::SessionStore,
    window::default_window,
    PairingError,
};
use crate::models::{Notice, Notification, PairId, PendingPair, Request, VoteOutcome};

/// How long entries may stay unresolved before the sweeper drops them
///
/// `None` disables expiry for that kind of entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub request_ttl: Option<Duration>,
    pub pending_ttl: Option<Duration>,
}

impl ExpiryPolicy {
    pub fn is_enabled(&self) -> bool {
        self.request_ttl.is_some() || self.pending_ttl.is_some()
    }
}

/// Current registry and session sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingStats {
    pub waiting: usize,
    pub pending: usize,
}

/// All mutable matchmaking state, always accessed under one lock
#[derive(Debug)]
struct PairingState {
    registry: WaitingRegistry,
    sessions: SessionStore,
}

/// Orchestrates the waiting registry and the session store
///
/// Every operation runs entirely under a single lock, so matching, voting and
/// resets never interleave. No I/O happens while the lock is held; callers
/// deliver the returned notifications afterwards.
#[derive(Debug)]
pub struct Coordinator {
    state: Mutex<PairingState>,
    expiry: ExpiryPolicy,
}

impl Coordinator {
    pub fn new(window: Duration) -> Self {
        Self {
            state: Mutex::new(PairingState {
                registry: WaitingRegistry::new(window),
                sessions: SessionStore::new(),
            }),
            expiry: ExpiryPolicy::default(),
        }
    }

    pub fn with_default_window() -> Self {
        Self::new(default_window())
    }

    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// Submit a new request
    ///
    /// On a miss the requester is told they are waiting. On a hit a pending
    /// pair is created and both parties (the waiting one first) receive a
    /// confirmation prompt.
    pub async fn handle_request(&self, request: Request) -> Result<Vec<Notification>, PairingError> {
        let user_id = request.user_id.clone();
        let location = request.location.clone();
        let waiting_notice = Notification::to(
            &request,
            Notice::Waiting {
                location: request.location.clone(),
                when: request.when,
            },
        );

        let mut state = self.state.lock().await;

        match state.registry.submit(request) {
            MatchResult::AlreadyWaiting => {
                tracing::debug!("Rejected duplicate request from {}", user_id);
                Err(PairingError::AlreadyWaiting(user_id))
            }
            MatchResult::Waiting => {
                tracing::info!(
                    "User {} waiting at {} ({} waiting)",
                    user_id,
                    location,
                    state.registry.count()
                );
                Ok(vec![waiting_notice])
            }
            MatchResult::Matched { a, b } => {
                let location = b.location.clone();
                let when = b.when;
                let pair_id = state.sessions.create(location.clone(), when, a.clone(), b.clone());

                tracing::info!(
                    "Paired {} with {} at {} (pair {})",
                    a.user_id,
                    b.user_id,
                    location,
                    pair_id
                );

                let prompt = Notice::ConfirmationPrompt {
                    pair_id,
                    location,
                    when,
                };
                Ok(vec![
                    Notification::to(&a, prompt.clone()),
                    Notification::to(&b, prompt),
                ])
            }
        }
    }

    /// Record a vote and turn the outcome into notifications
    pub async fn handle_vote(
        &self,
        pair_id: &PairId,
        user_id: &str,
        accept: bool,
    ) -> Result<Vec<Notification>, PairingError> {
        let mut state = self.state.lock().await;

        let outcome = state.sessions.record_vote(pair_id, user_id, accept)?;

        match outcome {
            VoteOutcome::AwaitingOther => {
                tracing::debug!("Pair {}: {} accepted, awaiting other party", pair_id, user_id);
                let voter = state
                    .sessions
                    .get(pair_id)
                    .and_then(|pair| pair.party(user_id))
                    .map(|voter| Notification::to(voter, Notice::AwaitingOther));
                Ok(voter.into_iter().collect())
            }
            VoteOutcome::Declined => {
                let Some(pair) = state.sessions.remove(pair_id) else {
                    return Err(PairingError::SessionNotFound(pair_id.to_string()));
                };
                tracing::info!("Pair {} cancelled by {}", pair_id, user_id);
                Ok(vec![
                    Notification::to(&pair.a, Notice::Cancelled),
                    Notification::to(&pair.b, Notice::Cancelled),
                ])
            }
            VoteOutcome::BothConfirmed => {
                let Some(pair) = state.sessions.remove(pair_id) else {
                    return Err(PairingError::SessionNotFound(pair_id.to_string()));
                };
                tracing::info!("Pair {} confirmed by both parties", pair_id);
                Ok(vec![
                    Notification::to(&pair.a, Notice::Confirmed { other: pair.b.contact_ref() }),
                    Notification::to(&pair.b, Notice::Confirmed { other: pair.a.contact_ref() }),
                ])
            }
        }
    }

    /// Withdraw a waiting request; pending pairs are left untouched
    pub async fn handle_cancel(&self, user_id: &str) -> Result<(), PairingError> {
        let mut state = self.state.lock().await;

        if state.registry.cancel(user_id) {
            tracing::info!("User {} stopped waiting", user_id);
            Ok(())
        } else {
            Err(PairingError::NotWaiting(user_id.to_string()))
        }
    }

    /// Return `user_id` to idle, cancelling any pair they are part of
    ///
    /// The other party of each cancelled pair receives an involuntary-cancel
    /// notice. Leaving the waiting registry produces no notification.
    pub async fn handle_reset(&self, user_id: &str) -> Vec<Notification> {
        let mut state = self.state.lock().await;

        let was_waiting = state.registry.cancel(user_id);
        let removed = state.sessions.remove_all_involving(user_id);

        if was_waiting || !removed.is_empty() {
            tracing::info!(
                "Reset {} (was waiting: {}, pairs cancelled: {})",
                user_id,
                was_waiting,
                removed.len()
            );
        }

        removed
            .into_iter()
            .map(|(pair_id, other)| {
                tracing::debug!("Pair {} cancelled, notifying {}", pair_id, other.user_id);
                Notification::to(&other, Notice::InvoluntaryCancel)
            })
            .collect()
    }

    /// Drop waiting requests and pending pairs older than their TTL
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut state = self.state.lock().await;
        let mut notifications = Vec::new();

        if let Some(cutoff) = expiry_cutoff(now, self.expiry.request_ttl) {
            for request in state.registry.expire(cutoff) {
                tracing::info!("Waiting request of {} expired", request.user_id);
                notifications.push(Notification::to(
                    &request,
                    Notice::RequestExpired {
                        location: request.location.clone(),
                        when: request.when,
                    },
                ));
            }
        }

        if let Some(cutoff) = expiry_cutoff(now, self.expiry.pending_ttl) {
            for pair in state.sessions.expire(cutoff) {
                tracing::info!("Pair {} expired before confirmation", pair.pair_id);
                let notice = Notice::PairExpired { pair_id: pair.pair_id.clone() };
                notifications.push(Notification::to(&pair.a, notice.clone()));
                notifications.push(Notification::to(&pair.b, notice));
            }
        }

        notifications
    }

    pub async fn pending_pair(&self, pair_id: &PairId) -> Option<PendingPair> {
        self.state.lock().await.sessions.get(pair_id).cloned()
    }

    pub async fn is_waiting(&self, user_id: &str) -> bool {
        self.state.lock().await.registry.contains(user_id)
    }

    pub async fn stats(&self) -> PairingStats {
        let state = self.state.lock().await;
        PairingStats {
            waiting: state.registry.count(),
            pending: state.sessions.count(),
        }
    }

    /// Forget all waiting requests and pending pairs
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.registry.clear();
        state.sessions.clear();
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::with_default_window()
    }
}

/// Entries created before the returned instant are stale
///
/// Non-positive TTLs and cutoffs outside the representable range skip the pass.
fn expiry_cutoff(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    let ttl = ttl.filter(|ttl| *ttl > Duration::zero())?;
    let cutoff = now.checked_sub_signed(ttl);
    if cutoff.is_none() {
        tracing::warn!("Expiry TTL {} reaches past the earliest representable time, skipping", ttl);
    }
    cutoff
}
