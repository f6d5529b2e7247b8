use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::User;

/// Full profile as returned to the owning user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub preferred_sport: String,
    pub prism_balance: i64,
    pub created_at: OffsetDateTime,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            nickname: user.nickname,
            phone: user.phone,
            city: user.city,
            district: user.district,
            preferred_sport: user.preferred_sport,
            prism_balance: user.prism_balance,
            created_at: user.created_at,
        }
    }
}

/// Request body for profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub nickname: String,
    pub preferred_sport: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_response_serialization() {
        let resp = ProfileResponse {
            id: Uuid::new_v4(),
            email: "player@example.com".into(),
            nickname: "striker".into(),
            phone: None,
            city: Some("seoul".into()),
            district: Some("gangnam".into()),
            preferred_sport: "soccer".into(),
            prism_balance: 120,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("striker"));
        assert!(json.contains("prism_balance"));
    }
}
