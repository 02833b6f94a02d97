use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to join the waiting registry
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "chat_id", rename = "chatId")]
    pub chat_id: String,
    #[validate(length(min = 1, max = 64))]
    pub location: String,
    /// Minutes from now; ignored when `when` is set
    #[validate(range(min = 0, max = 720))]
    #[serde(alias = "offset_minutes", rename = "offsetMinutes", default)]
    pub offset_minutes: i64,
    #[serde(default)]
    pub when: Option<DateTime<Utc>>,
    #[serde(alias = "display_name", rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl SubmitRequest {
    /// Desired meal time relative to `now`
    pub fn desired_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.when
            .unwrap_or_else(|| now + chrono::Duration::minutes(self.offset_minutes))
    }
}

/// Accept/decline vote on a pending pair
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VoteRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "pair_id", rename = "pairId")]
    pub pair_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    pub accept: bool,
}

/// Request carrying only the acting user (start, cancel)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

/// Query for draining a user's outbox
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NotificationsQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_out_of_range_is_rejected() {
        let req: SubmitRequest = serde_json::from_value(serde_json::json!({
            "userId": "u1",
            "chatId": "c1",
            "location": "Center",
            "offsetMinutes": 2000
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_desired_time_prefers_explicit_when() {
        let now = Utc::now();
        let explicit = now + chrono::Duration::hours(3);
        let req = SubmitRequest {
            user_id: "u1".into(),
            chat_id: "c1".into(),
            location: "Center".into(),
            offset_minutes: 30,
            when: Some(explicit),
            display_name: None,
            username: None,
        };
        assert_eq!(req.desired_time(now), explicit);

        let req = SubmitRequest { when: None, ..req };
        assert_eq!(req.desired_time(now), now + chrono::Duration::minutes(30));
    }
}
