//! The uniform response envelope.
//!
//! Every endpoint answers with `{success, message?, error?, data?}`.
//! Business-rule rejections (a stale report, nothing to revert) are
//! `success: false` with HTTP 200, so clients render them inline the same
//! way as successes. `error` is a machine-readable code and `message` is
//! meant for people.

use axum::response::{IntoResponse, Response};
use hunt_reports::{ReconcileOutcome, ResetOutcome, RevertOutcome, ToggleOutcome};
use serde::Serialize;

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation did what was asked.
    pub success: bool,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable failure code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            error: None,
            data: Some(data),
        }
    }

    /// A failed response without data.
    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            error: Some(code.to_owned()),
            data: None,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach data.
    #[must_use]
    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Outcomes that map onto the envelope.
pub trait Outcome: Serialize + Sized {
    /// `None` on success, otherwise the failure code.
    fn failure_code(&self) -> Option<&'static str>;

    /// Human-readable summary.
    fn message(&self) -> String;

    /// Wrap the outcome in the envelope.
    fn into_response_body(self) -> ApiResponse<Self> {
        let message = self.message();
        match self.failure_code() {
            None => ApiResponse::ok(self).with_message(message),
            Some(code) => ApiResponse::failure(code, message).with_data(self),
        }
    }
}

impl Outcome for ReconcileOutcome {
    fn failure_code(&self) -> Option<&'static str> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reason } => Some(match reason {
                hunt_types::SkipReason::UnknownMob => "unknown_mob",
                hunt_types::SkipReason::TooOldOrDuplicate => "too_old_or_duplicate",
                hunt_types::SkipReason::TooEarly => "too_early",
            }),
            Self::AlreadyProcessed => Some("already_processed"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Accepted { mob_id, kill_time } => {
                format!("kill of {mob_id} at {kill_time} recorded")
            }
            Self::Rejected { reason } => format!("report not applied: {reason}"),
            Self::AlreadyProcessed => String::from("report was already processed"),
        }
    }
}

impl Outcome for RevertOutcome {
    fn failure_code(&self) -> Option<&'static str> {
        match self {
            Self::Reverted { .. } => None,
            Self::NothingToRevert => Some("nothing_to_revert"),
            Self::UnknownMob => Some("unknown_mob"),
            Self::Unsupported => Some("unsupported"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Reverted { mob_id, kill_time } => {
                format!("{mob_id} restored to the kill at {kill_time}")
            }
            Self::NothingToRevert => String::from("nothing to revert"),
            Self::UnknownMob => String::from("unknown mob"),
            Self::Unsupported => String::from("only the previous record can be restored"),
        }
    }
}

impl Outcome for ToggleOutcome {
    fn failure_code(&self) -> Option<&'static str> {
        match self {
            Self::Applied { .. } => None,
            Self::UnknownMob => Some("unknown_mob"),
            Self::NotTracked => Some("not_tracked"),
            Self::UnknownPoint => Some("unknown_point"),
            Self::WrongRank => Some("wrong_rank"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Applied { point_id, action, .. } => match action {
                hunt_types::SuppressionAction::Suppress => format!("{point_id} suppressed"),
                hunt_types::SuppressionAction::Unsuppress => format!("{point_id} unsuppressed"),
            },
            Self::UnknownMob => String::from("unknown mob"),
            Self::NotTracked => String::from("this rank does not track spawn points"),
            Self::UnknownPoint => String::from("unknown spawn point"),
            Self::WrongRank => String::from("spawn point does not apply to this rank"),
        }
    }
}

impl Outcome for ResetOutcome {
    fn failure_code(&self) -> Option<&'static str> {
        match self {
            Self::Reset { .. } => None,
            Self::UnknownMob => Some("unknown_mob"),
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Reset { cleared } => format!("{cleared} spawn points cleared"),
            Self::UnknownMob => String::from("unknown mob"),
        }
    }
}

#[cfg(test)]
mod tests {
    use hunt_types::{MobId, SkipReason};

    use super::*;

    #[test]
    fn failure_omits_data() {
        let body = ApiResponse::<()>::failure("not_found", "mob 62001");
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "not_found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn rejection_keeps_its_outcome() {
        let body = ReconcileOutcome::Rejected {
            reason: SkipReason::TooEarly,
        }
        .into_response_body();
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("too_early"));
        assert!(body.data.is_some());
    }

    #[test]
    fn success_has_no_error() {
        let body = RevertOutcome::Reverted {
            mob_id: MobId::from("62001"),
            kill_time: chrono::DateTime::UNIX_EPOCH,
        }
        .into_response_body();
        assert!(body.success);
        assert!(body.error.is_none());
        assert!(body.message.is_some());
    }
}
