use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::core::PairingError;
use crate::models::{PairId, PendingPair, Request, VoteOutcome};

/// Pending two-party confirmations keyed by pair id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<PairId, PendingPair>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new pending pair with no votes
    pub fn create(&mut self, location: String, when: DateTime<Utc>, a: Request, b: Request) -> PairId {
        let mut pair_id = PairId::generate();
        while self.sessions.contains_key(&pair_id) {
            pair_id = PairId::generate();
        }

        let pair = PendingPair::new(pair_id.clone(), location, when, a, b);
        self.sessions.insert(pair_id.clone(), pair);
        pair_id
    }

    pub fn get(&self, pair_id: &PairId) -> Option<&PendingPair> {
        self.sessions.get(pair_id)
    }

    /// Record or overwrite a party's vote and report the resulting state
    pub fn record_vote(
        &mut self,
        pair_id: &PairId,
        user_id: &str,
        accept: bool,
    ) -> Result<VoteOutcome, PairingError> {
        let pair = self
            .sessions
            .get_mut(pair_id)
            .ok_or_else(|| PairingError::SessionNotFound(pair_id.to_string()))?;

        if !pair.set_vote(user_id, accept) {
            return Err(PairingError::UnknownParty {
                pair_id: pair_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        Ok(pair.outcome())
    }

    pub fn remove(&mut self, pair_id: &PairId) -> Option<PendingPair> {
        self.sessions.remove(pair_id)
    }

    /// Drop every pair `user_id` belongs to, returning each pair id with the other party
    pub fn remove_all_involving(&mut self, user_id: &str) -> Vec<(PairId, Request)> {
        let ids: Vec<PairId> = self
            .sessions
            .iter()
            .filter(|(_, pair)| pair.involves(user_id))
            .map(|(id, _)| id.clone())
            .collect();

        let mut removed: Vec<PendingPair> = ids
            .iter()
            .filter_map(|id| self.sessions.remove(id))
            .collect();
        removed.sort_by_key(|pair| pair.created_at);

        removed
            .into_iter()
            .filter_map(|pair| {
                let pair_id = pair.pair_id.clone();
                pair.into_other_party(user_id).map(|other| (pair_id, other))
            })
            .collect()
    }

    /// Remove every pair created before `cutoff`, oldest first
    pub fn expire(&mut self, cutoff: DateTime<Utc>) -> Vec<PendingPair> {
        let ids: Vec<PairId> = self
            .sessions
            .values()
            .filter(|pair| pair.created_at < cutoff)
            .map(|pair| pair.pair_id.clone())
            .collect();

        let mut expired: Vec<PendingPair> = ids
            .iter()
            .filter_map(|id| self.sessions.remove(id))
            .collect();
        expired.sort_by_key(|pair| pair.created_at);
        expired
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> Request {
        Request::new(id, format!("chat-{}", id), "Center", Utc::now()).unwrap()
    }

    fn store_with_pair() -> (SessionStore, PairId) {
        let mut store = SessionStore::new();
        let pair_id = store.create("Center".to_string(), Utc::now(), request("a"), request("b"));
        (store, pair_id)
    }

    #[test]
    fn test_create_starts_without_votes() {
        let (store, pair_id) = store_with_pair();
        let pair = store.get(&pair_id).unwrap();
        assert_eq!(pair.vote_count(), 0);
        assert_eq!(pair.a.user_id, "a");
        assert_eq!(pair.b.user_id, "b");
    }

    #[test]
    fn test_unknown_pair() {
        let mut store = SessionStore::new();
        let result = store.record_vote(&PairId::from("missing"), "a", true);
        assert_eq!(result, Err(PairingError::SessionNotFound("missing".to_string())));
    }

    #[test]
    fn test_unknown_party() {
        let (mut store, pair_id) = store_with_pair();
        let result = store.record_vote(&pair_id, "c", true);
        assert!(matches!(result, Err(PairingError::UnknownParty { .. })));
        assert_eq!(store.get(&pair_id).unwrap().vote_count(), 0);
    }

    #[test]
    fn test_awaiting_then_confirmed() {
        let (mut store, pair_id) = store_with_pair();
        assert_eq!(store.record_vote(&pair_id, "b", true), Ok(VoteOutcome::AwaitingOther));
        assert_eq!(store.record_vote(&pair_id, "a", true), Ok(VoteOutcome::BothConfirmed));
    }

    #[test]
    fn test_decline_wins_in_any_order() {
        let (mut store, pair_id) = store_with_pair();
        assert_eq!(store.record_vote(&pair_id, "a", false), Ok(VoteOutcome::Declined));

        let (mut store, pair_id) = store_with_pair();
        assert_eq!(store.record_vote(&pair_id, "a", true), Ok(VoteOutcome::AwaitingOther));
        assert_eq!(store.record_vote(&pair_id, "b", false), Ok(VoteOutcome::Declined));
    }

    #[test]
    fn test_vote_is_overwritten() {
        let (mut store, pair_id) = store_with_pair();
        store.record_vote(&pair_id, "a", true).unwrap();
        store.record_vote(&pair_id, "a", true).unwrap();
        assert_eq!(store.get(&pair_id).unwrap().vote_count(), 1);
        assert_eq!(store.get(&pair_id).unwrap().vote_of("a"), Some(true));
    }

    #[test]
    fn test_remove_all_involving() {
        let mut store = SessionStore::new();
        let first = store.create("Center".into(), Utc::now(), request("a"), request("b"));
        let _unrelated = store.create("Vič".into(), Utc::now(), request("c"), request("d"));

        let removed = store.remove_all_involving("b");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, first);
        assert_eq!(removed[0].1.user_id, "a");
        assert_eq!(store.count(), 1);
        assert!(store.remove_all_involving("b").is_empty());
    }

    #[test]
    fn test_expire() {
        let (mut store, pair_id) = store_with_pair();
        assert!(store.expire(Utc::now() - chrono::Duration::minutes(5)).is_empty());

        let expired = store.expire(Utc::now() + chrono::Duration::minutes(5));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].pair_id, pair_id);
        assert_eq!(store.count(), 0);
    }
}
