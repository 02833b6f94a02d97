use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::PairingError;

/// A request to share a meal at a given place and time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub location: String,
    pub when: DateTime<Utc>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
}

impl Request {
    /// Create a request, rejecting empty identity, contact channel or location
    pub fn new(
        user_id: impl Into<String>,
        chat_id: impl Into<String>,
        location: impl Into<String>,
        when: DateTime<Utc>,
    ) -> Result<Self, PairingError> {
        let user_id = user_id.into().trim().to_string();
        let chat_id = chat_id.into().trim().to_string();
        let location = location.into().trim().to_string();

        if user_id.is_empty() {
            return Err(PairingError::InvalidRequest("user id must not be empty".to_string()));
        }
        if chat_id.is_empty() {
            return Err(PairingError::InvalidRequest("chat id must not be empty".to_string()));
        }
        if location.is_empty() {
            return Err(PairingError::InvalidRequest("location must not be empty".to_string()));
        }

        Ok(Self {
            user_id,
            chat_id,
            location,
            when,
            display_name: None,
            username: None,
            submitted_at: Utc::now(),
        })
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self
    }

    /// Attach a handle; surrounding whitespace and a leading `@` are dropped
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username
            .map(|u| u.trim().trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());
        self
    }

    /// Override the submission timestamp (used when replaying or testing expiry)
    pub fn with_submitted_at(mut self, at: DateTime<Utc>) -> Self {
        self.submitted_at = at;
        self
    }

    /// Reference revealed to the other party once both confirm
    pub fn contact_ref(&self) -> ContactRef {
        let name = self
            .display_name
            .clone()
            .unwrap_or_else(|| "user".to_string());

        let link = match &self.username {
            Some(username) => format!("https://t.me/{}", username),
            None => format!("tg://user?id={}", self.user_id),
        };

        ContactRef {
            user_id: self.user_id.clone(),
            name,
            username: self.username.clone(),
            link,
        }
    }
}

/// Opaque identifier of a pending pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    /// Fresh identifier with 128 bits of random entropy
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PairId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PairId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A proposed two-party match awaiting mutual confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPair {
    #[serde(rename = "pairId")]
    pub pair_id: PairId,
    pub location: String,
    pub when: DateTime<Utc>,
    pub a: Request,
    pub b: Request,
    votes: HashMap<String, bool>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl PendingPair {
    pub fn new(pair_id: PairId, location: String, when: DateTime<Utc>, a: Request, b: Request) -> Self {
        Self {
            pair_id,
            location,
            when,
            a,
            b,
            votes: HashMap::with_capacity(2),
            created_at: Utc::now(),
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.a.user_id == user_id || self.b.user_id == user_id
    }

    pub fn party(&self, user_id: &str) -> Option<&Request> {
        if self.a.user_id == user_id {
            Some(&self.a)
        } else if self.b.user_id == user_id {
            Some(&self.b)
        } else {
            None
        }
    }

    /// Consume the pair, keeping the party that is not `user_id`
    pub fn into_other_party(self, user_id: &str) -> Option<Request> {
        if self.a.user_id == user_id {
            Some(self.b)
        } else if self.b.user_id == user_id {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn vote_of(&self, user_id: &str) -> Option<bool> {
        self.votes.get(user_id).copied()
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Record a vote for one of the two parties. Returns false for outsiders.
    pub(crate) fn set_vote(&mut self, user_id: &str, accept: bool) -> bool {
        if !self.involves(user_id) {
            return false;
        }
        self.votes.insert(user_id.to_string(), accept);
        true
    }

    /// A decline by either party wins over everything else
    pub fn outcome(&self) -> VoteOutcome {
        if self.votes.values().any(|accepted| !accepted) {
            return VoteOutcome::Declined;
        }

        let a_yes = self.vote_of(&self.a.user_id).unwrap_or(false);
        let b_yes = self.vote_of(&self.b.user_id).unwrap_or(false);

        if a_yes && b_yes {
            VoteOutcome::BothConfirmed
        } else {
            VoteOutcome::AwaitingOther
        }
    }
}

/// Result of recording a vote on a pending pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    Declined,
    AwaitingOther,
    BothConfirmed,
}

/// Contact details revealed on mutual confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub username: Option<String>,
    pub link: String,
}

/// Outbound intent for the chat transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    Waiting {
        location: String,
        when: DateTime<Utc>,
    },
    ConfirmationPrompt {
        #[serde(rename = "pairId")]
        pair_id: PairId,
        location: String,
        when: DateTime<Utc>,
    },
    AwaitingOther,
    Cancelled,
    Confirmed {
        other: ContactRef,
    },
    InvoluntaryCancel,
    RequestExpired {
        location: String,
        when: DateTime<Utc>,
    },
    PairExpired {
        #[serde(rename = "pairId")]
        pair_id: PairId,
    },
}

/// A notice addressed to one party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    #[serde(rename = "chatId")]
    pub chat_id: String,
    pub notice: Notice,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn to(request: &Request, notice: Notice) -> Self {
        Self {
            recipient: request.user_id.clone(),
            chat_id: request.chat_id.clone(),
            notice,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str) -> Request {
        Request::new(id, format!("chat-{}", id), "Center", Utc::now()).unwrap()
    }

    #[test]
    fn test_request_rejects_empty_fields() {
        let now = Utc::now();
        assert!(matches!(
            Request::new("  ", "c", "Center", now),
            Err(PairingError::InvalidRequest(_))
        ));
        assert!(Request::new("u1", "", "Center", now).is_err());
        assert!(Request::new("u1", "c", "", now).is_err());
    }

    #[test]
    fn test_username_is_normalized() {
        let req = request("u1").with_username(Some(" @ana ".to_string()));
        assert_eq!(req.username.as_deref(), Some("ana"));

        let req = request("u1").with_username(Some("@".to_string()));
        assert_eq!(req.username, None);
    }

    #[test]
    fn test_contact_ref_prefers_handle() {
        let req = request("42")
            .with_display_name(Some("Ana".to_string()))
            .with_username(Some("ana".to_string()));
        let contact = req.contact_ref();
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.link, "https://t.me/ana");
    }

    #[test]
    fn test_contact_ref_falls_back_to_identity_link() {
        let contact = request("42").contact_ref();
        assert_eq!(contact.name, "user");
        assert_eq!(contact.link, "tg://user?id=42");
    }

    #[test]
    fn test_outcome_decline_short_circuits() {
        let mut pair = PendingPair::new(PairId::generate(), "Center".into(), Utc::now(), request("a"), request("b"));
        assert_eq!(pair.outcome(), VoteOutcome::AwaitingOther);

        assert!(pair.set_vote("b", false));
        assert_eq!(pair.outcome(), VoteOutcome::Declined);

        assert!(pair.set_vote("a", true));
        assert_eq!(pair.outcome(), VoteOutcome::Declined);
    }

    #[test]
    fn test_outsider_vote_is_not_recorded() {
        let mut pair = PendingPair::new(PairId::generate(), "Center".into(), Utc::now(), request("a"), request("b"));
        assert!(!pair.set_vote("c", true));
        assert_eq!(pair.vote_count(), 0);
    }

    #[test]
    fn test_pair_id_is_hex() {
        let id = PairId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, PairId::generate());
    }

    #[test]
    fn test_notice_serializes_with_type_tag() {
        let json = serde_json::to_value(Notice::AwaitingOther).unwrap();
        assert_eq!(json["type"], "awaiting_other");
    }
}
