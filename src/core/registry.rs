use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::core::window::{default_window, within_window};
use crate::models::Request;

/// Result of submitting a request to the registry
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// The requester already has an outstanding request; nothing changed
    AlreadyWaiting,
    /// No compatible request; the new one is now waiting
    Waiting,
    /// `a` was waiting and has been removed, `b` is the new request
    Matched { a: Request, b: Request },
}

/// Store of outstanding, unmatched requests
///
/// Requests are bucketed by location tag. Each bucket keeps insertion order,
/// so the first compatible entry found is always the oldest one.
#[derive(Debug)]
pub struct WaitingRegistry {
    window: Duration,
    buckets: HashMap<String, Vec<Request>>,
    /// user id -> location of their waiting request
    index: HashMap<String, String>,
}

impl WaitingRegistry {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            buckets: HashMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Submit a request, matching it against the oldest compatible waiting one
    pub fn submit(&mut self, request: Request) -> MatchResult {
        if self.index.contains_key(&request.user_id) {
            tracing::debug!("User {} is already waiting", request.user_id);
            return MatchResult::AlreadyWaiting;
        }

        if let Some(bucket) = self.buckets.get_mut(&request.location) {
            let window = self.window;
            if let Some(pos) = bucket
                .iter()
                .position(|waiting| within_window(waiting.when, request.when, window))
            {
                let a = bucket.remove(pos);
                if bucket.is_empty() {
                    self.buckets.remove(&request.location);
                }
                self.index.remove(&a.user_id);

                tracing::debug!(
                    "Matched {} with waiting {} at {}",
                    request.user_id,
                    a.user_id,
                    request.location
                );
                return MatchResult::Matched { a, b: request };
            }
        }

        self.index
            .insert(request.user_id.clone(), request.location.clone());
        self.buckets
            .entry(request.location.clone())
            .or_default()
            .push(request);

        MatchResult::Waiting
    }

    /// Remove the waiting request of `user_id`, returning whether one existed
    pub fn cancel(&mut self, user_id: &str) -> bool {
        let Some(location) = self.index.remove(user_id) else {
            return false;
        };

        if let Some(bucket) = self.buckets.get_mut(&location) {
            bucket.retain(|r| r.user_id != user_id);
            if bucket.is_empty() {
                self.buckets.remove(&location);
            }
        }

        true
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.index.contains_key(user_id)
    }

    pub fn get(&self, user_id: &str) -> Option<&Request> {
        let location = self.index.get(user_id)?;
        self.buckets
            .get(location)?
            .iter()
            .find(|r| r.user_id == user_id)
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }

    /// Remove every request submitted before `cutoff`, oldest first
    pub fn expire(&mut self, cutoff: DateTime<Utc>) -> Vec<Request> {
        let mut expired = Vec::new();

        self.buckets.retain(|_, bucket| {
            let (stale, fresh): (Vec<Request>, Vec<Request>) = bucket
                .drain(..)
                .partition(|r| r.submitted_at < cutoff);
            expired.extend(stale);
            *bucket = fresh;
            !bucket.is_empty()
        });

        for request in &expired {
            self.index.remove(&request.user_id);
        }

        expired.sort_by_key(|r| r.submitted_at);
        expired
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.index.clear();
    }
}

impl Default for WaitingRegistry {
    fn default() -> Self {
        Self::new(default_window())
    }
}
