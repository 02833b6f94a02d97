use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Longest window honoured; larger configured values are clamped to it
const MAX_WINDOW_MINS: u64 = 60 * 24 * 365;

/// Recent start attempts of a single user
#[derive(Debug, Clone)]
struct StartWindow {
    hits: Vec<DateTime<Utc>>,
    limited: bool,
}

/// Sliding-window limiter for start attempts
///
/// Allows `max_starts` attempts per user in any window of `window` length.
/// Idle users are evicted from the in-memory cache after one window.
pub struct StartLimiter {
    max_starts: usize,
    window: ChronoDuration,
    hits: moka::future::Cache<String, StartWindow>,
}

impl StartLimiter {
    pub fn new(max_starts: usize, window_mins: u64, max_users: u64) -> Self {
        if window_mins > MAX_WINDOW_MINS {
            tracing::warn!(
                "Rate limit window of {} min clamped to {} min",
                window_mins,
                MAX_WINDOW_MINS
            );
        }
        let window_mins = window_mins.min(MAX_WINDOW_MINS);

        let hits = moka::future::CacheBuilder::new(max_users)
            .time_to_idle(Duration::from_secs(window_mins.max(1).saturating_mul(60)))
            .build();

        let window = i64::try_from(window_mins)
            .ok()
            .and_then(ChronoDuration::try_minutes)
            .unwrap_or_else(|| ChronoDuration::minutes(10));

        Self {
            max_starts,
            window,
            hits,
        }
    }

    /// Register an attempt now; returns false when the user is over the limit
    pub async fn check(&self, user_id: &str) -> bool {
        self.check_at(user_id, Utc::now()).await
    }

    /// Register an attempt at `now`; rejected attempts are not counted
    pub async fn check_at(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        let max_starts = self.max_starts;
        let window_start = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let entry = self
            .hits
            .entry(user_id.to_string())
            .and_upsert_with(|existing| {
                let mut hits = existing
                    .map(|e| e.into_value().hits)
                    .unwrap_or_default();
                hits.retain(|t| *t >= window_start);

                let limited = hits.len() >= max_starts;
                if !limited {
                    hits.push(now);
                }
                std::future::ready(StartWindow { hits, limited })
            })
            .await;

        let allowed = !entry.into_value().limited;
        if !allowed {
            tracing::warn!("Start rate limit hit for user {}", user_id);
        }
        allowed
    }

    /// Forget a user's history
    pub async fn reset(&self, user_id: &str) {
        self.hits.invalidate(user_id).await;
    }
}
