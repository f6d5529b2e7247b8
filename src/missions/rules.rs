use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::missions::repo::{Mission, MissionType};

/// Declarative eligibility conditions, stored per catalog row as JSON.
/// The set is closed: unknown kinds fail deserialization instead of being
/// silently skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationRule {
    AutoOnSignup,
    DailyCheck,
    CheckTeamMember,
    CheckInvitation,
    CheckMatchParticipation,
    FirstMatchComplete,
    CheckProfile { required_fields: Vec<String> },
    WeeklyActivity { min_rewards: i64 },
}

/// Platform events that drive auto-verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionEvent {
    Signup,
    Login,
    ProfileUpdate,
    TeamJoin,
    MatchConfirmed,
    MatchCompleted,
}

/// Snapshot of the user data a rule may inspect, loaded inside the
/// completion transaction so the evaluation itself stays pure.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub now: OffsetDateTime,
    pub last_check_in: Option<OffsetDateTime>,
    pub nickname: &'a str,
    pub phone: Option<&'a str>,
    pub city: Option<&'a str>,
    pub district: Option<&'a str>,
    pub preferred_sport: &'a str,
    pub is_team_member: bool,
    pub has_sent_invitation: bool,
    pub has_match_participation: bool,
    pub has_completed_match: bool,
    pub rewards_last_7_days: i64,
    pub completed_within_7_days: bool,
}

impl VerificationRule {
    /// Whether this rule should be re-evaluated when `event` happens.
    /// CheckInvitation is credited on the named completion path when an
    /// invitation is created, so no event drives it.
    pub fn responds_to(&self, event: MissionEvent) -> bool {
        use MissionEvent::*;
        match self {
            VerificationRule::AutoOnSignup => matches!(event, Signup),
            VerificationRule::DailyCheck => matches!(event, Login),
            VerificationRule::CheckTeamMember => matches!(event, TeamJoin),
            VerificationRule::CheckInvitation => false,
            VerificationRule::CheckMatchParticipation => matches!(event, MatchConfirmed),
            VerificationRule::FirstMatchComplete => matches!(event, MatchCompleted),
            VerificationRule::CheckProfile { .. } => matches!(event, Signup | ProfileUpdate),
            VerificationRule::WeeklyActivity { .. } => true,
        }
    }
}

/// The built-in rule for catalog rows that carry no JSON rule of their own.
/// MATCH_VERIFY stays ruleless: a manual self-report is always eligible.
pub fn default_rule(mission_type: MissionType) -> Option<VerificationRule> {
    match mission_type {
        MissionType::SportSelect => Some(VerificationRule::AutoOnSignup),
        MissionType::DailyCheckIn => Some(VerificationRule::DailyCheck),
        MissionType::TeamJoin => Some(VerificationRule::CheckTeamMember),
        MissionType::InviteMember => Some(VerificationRule::CheckInvitation),
        MissionType::TeamMatch => Some(VerificationRule::CheckMatchParticipation),
        MissionType::FirstMatch => Some(VerificationRule::FirstMatchComplete),
        MissionType::ProfileComplete => Some(VerificationRule::CheckProfile {
            required_fields: vec![
                "nickname".into(),
                "phone".into(),
                "city".into(),
                "district".into(),
                "preferred_sport".into(),
            ],
        }),
        MissionType::WeeklyActivity => Some(VerificationRule::WeeklyActivity { min_rewards: 5 }),
        MissionType::MatchVerify => None,
    }
}

/// The rule in force for a catalog row: its JSON rule when present, the
/// per-type default otherwise. None means always eligible.
pub fn effective_rule(mission: &Mission) -> Result<Option<VerificationRule>, serde_json::Error> {
    match &mission.verification_rules {
        Some(value) => serde_json::from_value(value.clone()).map(Some),
        None => Ok(default_rule(mission.mission_type)),
    }
}

/// Both cooldown call paths use calendar-day equality in UTC.
pub fn checked_in_today(last_check_in: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    match last_check_in {
        Some(ts) => ts.to_offset(UtcOffset::UTC).date() == now.to_offset(UtcOffset::UTC).date(),
        None => false,
    }
}

/// Evaluates a rule against the snapshot. Err carries the reason shown to
/// the user.
pub fn evaluate(rule: &VerificationRule, ctx: &RuleContext<'_>) -> Result<(), &'static str> {
    match rule {
        VerificationRule::AutoOnSignup => Ok(()),
        VerificationRule::DailyCheck => {
            if checked_in_today(ctx.last_check_in, ctx.now) {
                Err("already checked in today")
            } else {
                Ok(())
            }
        }
        VerificationRule::CheckTeamMember => {
            if ctx.is_team_member {
                Ok(())
            } else {
                Err("join a team first")
            }
        }
        VerificationRule::CheckInvitation => {
            if ctx.has_sent_invitation {
                Ok(())
            } else {
                Err("invite a member first")
            }
        }
        VerificationRule::CheckMatchParticipation => {
            if ctx.has_match_participation {
                Ok(())
            } else {
                Err("participate in a match first")
            }
        }
        VerificationRule::FirstMatchComplete => {
            if ctx.has_completed_match {
                Ok(())
            } else {
                Err("complete a match first")
            }
        }
        VerificationRule::CheckProfile { required_fields } => {
            let filled = required_fields.iter().all(|field| {
                match field.as_str() {
                    "nickname" => !ctx.nickname.trim().is_empty(),
                    "phone" => ctx.phone.map_or(false, |v| !v.trim().is_empty()),
                    "city" => ctx.city.map_or(false, |v| !v.trim().is_empty()),
                    "district" => ctx.district.map_or(false, |v| !v.trim().is_empty()),
                    "preferred_sport" => !ctx.preferred_sport.trim().is_empty(),
                    _ => false,
                }
            });
            if filled {
                Ok(())
            } else {
                Err("complete your profile first")
            }
        }
        VerificationRule::WeeklyActivity { min_rewards } => {
            if ctx.completed_within_7_days {
                Err("weekly reward already claimed")
            } else if ctx.rewards_last_7_days < *min_rewards {
                Err("not enough activity this week")
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn base(now: OffsetDateTime) -> RuleContext<'static> {
        RuleContext {
            now,
            last_check_in: None,
            nickname: "tester",
            phone: None,
            city: None,
            district: None,
            preferred_sport: "futsal",
            is_team_member: false,
            has_sent_invitation: false,
            has_match_participation: false,
            has_completed_match: false,
            rewards_last_7_days: 0,
            completed_within_7_days: false,
        }
    }

    fn mission(mission_type: MissionType, rules: Option<serde_json::Value>) -> Mission {
        Mission {
            id: Uuid::new_v4(),
            mission_type,
            title: "t".into(),
            description: "d".into(),
            reward: 10,
            is_repeatable: false,
            is_active: true,
            verification_rules: rules,
            created_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn test_daily_check_never_checked_in() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let ctx = base(now);
        assert!(evaluate(&VerificationRule::DailyCheck, &ctx).is_ok());
    }

    #[test]
    fn test_daily_check_same_day_blocked() {
        let now = datetime!(2024-03-10 21:00 UTC);
        let ctx = RuleContext {
            last_check_in: Some(datetime!(2024-03-10 01:00 UTC)),
            ..base(now)
        };
        assert_eq!(
            evaluate(&VerificationRule::DailyCheck, &ctx),
            Err("already checked in today")
        );
    }

    #[test]
    fn test_daily_check_next_day_allowed() {
        let now = datetime!(2024-03-11 00:05 UTC);
        let ctx = RuleContext {
            last_check_in: Some(datetime!(2024-03-10 23:55 UTC)),
            ..base(now)
        };
        assert!(evaluate(&VerificationRule::DailyCheck, &ctx).is_ok());
    }

    #[test]
    fn test_daily_check_compares_in_utc() {
        // 2024-03-11 08:00 +09:00 is 2024-03-10 23:00 UTC, same UTC day.
        let now = datetime!(2024-03-10 10:00 UTC);
        let ctx = RuleContext {
            last_check_in: Some(datetime!(2024-03-11 08:00 +09:00)),
            ..base(now)
        };
        assert_eq!(
            evaluate(&VerificationRule::DailyCheck, &ctx),
            Err("already checked in today")
        );
    }

    #[test]
    fn test_team_member_gating() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let ctx = base(now);
        assert_eq!(
            evaluate(&VerificationRule::CheckTeamMember, &ctx),
            Err("join a team first")
        );

        let ctx = RuleContext {
            is_team_member: true,
            ..base(now)
        };
        assert!(evaluate(&VerificationRule::CheckTeamMember, &ctx).is_ok());
    }

    #[test]
    fn test_profile_rule_requires_every_field() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let rule = VerificationRule::CheckProfile {
            required_fields: vec!["nickname".into(), "phone".into(), "city".into()],
        };

        let ctx = RuleContext {
            phone: Some("010-1234-5678"),
            city: Some("서울"),
            ..base(now)
        };
        assert!(evaluate(&rule, &ctx).is_ok());

        let ctx = RuleContext {
            phone: Some("  "),
            city: Some("서울"),
            ..base(now)
        };
        assert_eq!(evaluate(&rule, &ctx), Err("complete your profile first"));
    }

    #[test]
    fn test_profile_rule_unknown_field_fails() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let rule = VerificationRule::CheckProfile {
            required_fields: vec!["shoe_size".into()],
        };
        assert_eq!(
            evaluate(&rule, &base(now)),
            Err("complete your profile first")
        );
    }

    #[test]
    fn test_weekly_activity_threshold() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let rule = VerificationRule::WeeklyActivity { min_rewards: 5 };

        let ctx = RuleContext {
            rewards_last_7_days: 4,
            ..base(now)
        };
        assert_eq!(evaluate(&rule, &ctx), Err("not enough activity this week"));

        let ctx = RuleContext {
            rewards_last_7_days: 5,
            ..base(now)
        };
        assert!(evaluate(&rule, &ctx).is_ok());
    }

    #[test]
    fn test_weekly_activity_cooldown() {
        let now = datetime!(2024-03-10 09:00 UTC);
        let rule = VerificationRule::WeeklyActivity { min_rewards: 5 };
        let ctx = RuleContext {
            rewards_last_7_days: 9,
            completed_within_7_days: true,
            ..base(now)
        };
        assert_eq!(evaluate(&rule, &ctx), Err("weekly reward already claimed"));
    }

    #[test]
    fn test_responds_to_wiring() {
        use MissionEvent::*;
        assert!(VerificationRule::AutoOnSignup.responds_to(Signup));
        assert!(!VerificationRule::AutoOnSignup.responds_to(Login));
        assert!(VerificationRule::DailyCheck.responds_to(Login));
        assert!(!VerificationRule::DailyCheck.responds_to(Signup));
        assert!(VerificationRule::CheckTeamMember.responds_to(TeamJoin));
        assert!(!VerificationRule::CheckInvitation.responds_to(TeamJoin));
        assert!(VerificationRule::CheckMatchParticipation.responds_to(MatchConfirmed));
        assert!(VerificationRule::FirstMatchComplete.responds_to(MatchCompleted));

        let profile = VerificationRule::CheckProfile {
            required_fields: vec![],
        };
        assert!(profile.responds_to(Signup));
        assert!(profile.responds_to(ProfileUpdate));
        assert!(!profile.responds_to(Login));

        let weekly = VerificationRule::WeeklyActivity { min_rewards: 5 };
        for event in [Signup, Login, ProfileUpdate, TeamJoin, MatchConfirmed, MatchCompleted] {
            assert!(weekly.responds_to(event));
        }
    }

    #[test]
    fn test_rule_json_round_trip() {
        let rule: VerificationRule =
            serde_json::from_str(r#"{"kind":"daily_check"}"#).unwrap();
        assert_eq!(rule, VerificationRule::DailyCheck);

        let rule: VerificationRule = serde_json::from_str(
            r#"{"kind":"check_profile","required_fields":["nickname","phone"]}"#,
        )
        .unwrap();
        assert_eq!(
            rule,
            VerificationRule::CheckProfile {
                required_fields: vec!["nickname".into(), "phone".into()],
            }
        );

        let rule: VerificationRule =
            serde_json::from_str(r#"{"kind":"weekly_activity","min_rewards":5}"#).unwrap();
        assert_eq!(rule, VerificationRule::WeeklyActivity { min_rewards: 5 });
    }

    #[test]
    fn test_unknown_rule_kind_rejected() {
        let parsed: Result<VerificationRule, _> =
            serde_json::from_str(r#"{"kind":"bribe_the_referee"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_effective_rule_prefers_stored_json() {
        let m = mission(
            MissionType::TeamJoin,
            Some(serde_json::json!({"kind": "auto_on_signup"})),
        );
        assert_eq!(
            effective_rule(&m).unwrap(),
            Some(VerificationRule::AutoOnSignup)
        );
    }

    #[test]
    fn test_effective_rule_falls_back_to_default() {
        let m = mission(MissionType::DailyCheckIn, None);
        assert_eq!(
            effective_rule(&m).unwrap(),
            Some(VerificationRule::DailyCheck)
        );

        let m = mission(MissionType::MatchVerify, None);
        assert_eq!(effective_rule(&m).unwrap(), None);
    }

    #[test]
    fn test_effective_rule_reports_bad_json() {
        let m = mission(
            MissionType::TeamJoin,
            Some(serde_json::json!({"kind": "nonsense"})),
        );
        assert!(effective_rule(&m).is_err());
    }
}
