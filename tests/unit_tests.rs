// Unit tests for BoniBuddy

use boni_buddy::core::{
    Coordinator,
    registry::{MatchResult, WaitingRegistry},
    sessions::SessionStore,
    window::{default_window, within_window},
    PairingError,
};
use boni_buddy::models::{PairId, Request, VoteOutcome};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 20, hour, minute, 0).unwrap()
}

fn request(id: &str, location: &str, when: DateTime<Utc>) -> Request {
    Request::new(id, format!("chat-{}", id), location, when).unwrap()
}

#[test]
fn test_window_is_symmetric() {
    let window = default_window();
    for minutes in [0, 5, 15] {
        let later = at(12, 0) + Duration::minutes(minutes);
        assert!(within_window(at(12, 0), later, window));
        assert!(within_window(later, at(12, 0), window));
    }
    assert!(!within_window(at(12, 0), at(12, 30), window));
}

#[test]
fn test_at_most_one_request_per_identity() {
    let mut registry = WaitingRegistry::default();
    let locations = ["Center", "Rožna", "Bežigrad", "Šiška"];

    for (i, location) in locations.iter().enumerate() {
        let result = registry.submit(request("u1", location, at(12 + i as u32, 0)));
        if i == 0 {
            assert_eq!(result, MatchResult::Waiting);
        } else {
            assert_eq!(result, MatchResult::AlreadyWaiting);
        }
    }

    assert_eq!(registry.count(), 1);
}

#[test]
fn test_match_requires_same_location() {
    let mut registry = WaitingRegistry::default();
    registry.submit(request("u1", "Center", at(12, 0)));
    assert_eq!(registry.submit(request("u2", "Vič", at(12, 0))), MatchResult::Waiting);
    assert_eq!(registry.count(), 2);
}

#[test]
fn test_window_boundary() {
    let mut registry = WaitingRegistry::default();
    registry.submit(request("u1", "Center", at(12, 0)));
    assert!(matches!(
        registry.submit(request("u2", "Center", at(12, 15))),
        MatchResult::Matched { .. }
    ));

    registry.submit(request("u3", "Center", at(12, 0)));
    assert_eq!(registry.submit(request("u4", "Center", at(12, 16))), MatchResult::Waiting);
}

#[test]
fn test_cancelled_user_can_submit_again() {
    let mut registry = WaitingRegistry::default();
    registry.submit(request("u1", "Center", at(12, 0)));
    assert!(registry.cancel("u1"));
    assert_eq!(registry.submit(request("u1", "Vič", at(13, 0))), MatchResult::Waiting);
    assert_eq!(registry.get("u1").map(|r| r.location.clone()), Some("Vič".to_string()));
}

#[test]
fn test_decline_regardless_of_order_or_value() {
    for (first, first_vote, second, second_vote) in [
        ("a", false, "b", true),
        ("a", true, "b", false),
        ("b", false, "a", true),
        ("b", true, "a", false),
        ("a", false, "b", false),
    ] {
        let mut store = SessionStore::new();
        let pair_id = store.create("Center".into(), at(12, 0), request("a", "Center", at(12, 0)), request("b", "Center", at(12, 5)));

        let outcome = store.record_vote(&pair_id, first, first_vote).unwrap();
        if !first_vote {
            assert_eq!(outcome, VoteOutcome::Declined);
        }
        let outcome = store.record_vote(&pair_id, second, second_vote).unwrap();
        assert_eq!(outcome, VoteOutcome::Declined);
    }
}

#[test]
fn test_both_accept_in_either_order() {
    for (first, second) in [("a", "b"), ("b", "a")] {
        let mut store = SessionStore::new();
        let pair_id = store.create("Center".into(), at(12, 0), request("a", "Center", at(12, 0)), request("b", "Center", at(12, 5)));

        assert_eq!(store.record_vote(&pair_id, first, true), Ok(VoteOutcome::AwaitingOther));
        assert_eq!(store.record_vote(&pair_id, second, true), Ok(VoteOutcome::BothConfirmed));
    }
}

#[test]
fn test_vote_on_removed_session() {
    let mut store = SessionStore::new();
    let pair_id = store.create("Center".into(), at(12, 0), request("a", "Center", at(12, 0)), request("b", "Center", at(12, 5)));
    assert!(store.remove(&pair_id).is_some());

    assert_eq!(
        store.record_vote(&pair_id, "a", true),
        Err(PairingError::SessionNotFound(pair_id.to_string()))
    );
    assert!(store.get(&PairId::from(pair_id.as_str())).is_none());
}

#[test]
fn test_unique_pair_ids() {
    let mut store = SessionStore::new();
    let mut ids = std::collections::HashSet::new();
    for i in 0..200 {
        let a = request(&format!("a{}", i), "Center", at(12, 0));
        let b = request(&format!("b{}", i), "Center", at(12, 0));
        ids.insert(store.create("Center".into(), at(12, 0), a, b));
    }
    assert_eq!(ids.len(), 200);
    assert_eq!(store.count(), 200);
}

#[test]
fn test_coordinator_on_blocking_runtime() {
    let coordinator = Coordinator::default();
    tokio_test::block_on(async {
        coordinator.handle_request(request("u1", "Center", at(12, 0))).await.unwrap();
        let err = coordinator
            .handle_request(request("u1", "Center", at(12, 0)))
            .await
            .unwrap_err();
        assert_eq!(err, PairingError::AlreadyWaiting("u1".into()));
    });
}
