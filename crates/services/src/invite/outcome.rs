use pairly_db::models::InviteRecord;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Inviter,
    Invitee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Absent,
    Expired,
    Pending,
    Paired,
}

/// Why a join was turned away even though the invite is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinError {
    /// Already paired with someone else.
    Used,
}

/// Result of `InviteService::join_invite`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No record in the store: never created, evicted, or revoked.
    Absent,
    /// Record still stored but past its `expires_at`.
    Expired,
    /// The inviter checking an invite nobody has joined yet.
    Pending { invite: InviteRecord },
    Paired {
        invite: InviteRecord,
        role: Role,
        partner_key: String,
    },
    /// A third identity arriving after pairing completed.
    Used,
}

impl JoinOutcome {
    pub fn status(&self) -> JoinStatus {
        match self {
            JoinOutcome::Absent => JoinStatus::Absent,
            JoinOutcome::Expired => JoinStatus::Expired,
            JoinOutcome::Pending { .. } => JoinStatus::Pending,
            JoinOutcome::Paired { .. } | JoinOutcome::Used => JoinStatus::Paired,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            JoinOutcome::Pending { .. } => Some(Role::Inviter),
            JoinOutcome::Paired { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub fn partner_key(&self) -> Option<&str> {
        match self {
            JoinOutcome::Paired { partner_key, .. } => Some(partner_key),
            _ => None,
        }
    }

    pub fn invite(&self) -> Option<&InviteRecord> {
        match self {
            JoinOutcome::Pending { invite } | JoinOutcome::Paired { invite, .. } => Some(invite),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<JoinError> {
        match self {
            JoinOutcome::Used => Some(JoinError::Used),
            _ => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinView<'a> {
    status: JoinStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partner_key: Option<&'a str>,
    invite: Option<&'a InviteRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JoinError>,
}

impl Serialize for JoinOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        JoinView {
            status: self.status(),
            role: self.role(),
            partner_key: self.partner_key(),
            invite: self.invite(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Why an ownership-gated operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    NotFound,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReissueOutcome {
    Reissued {
        previous_invite_id: String,
        invite: InviteRecord,
    },
    Refused(Refusal),
}

impl ReissueOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ReissueOutcome::Reissued { .. })
    }

    pub fn invite_id(&self) -> Option<&str> {
        match self {
            ReissueOutcome::Reissued { invite, .. } => Some(&invite.invite_id),
            ReissueOutcome::Refused(_) => None,
        }
    }

    pub fn reason(&self) -> Option<Refusal> {
        match self {
            ReissueOutcome::Refused(reason) => Some(*reason),
            ReissueOutcome::Reissued { .. } => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueView<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    invite_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<Refusal>,
}

impl Serialize for ReissueOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ReissueView {
            ok: self.is_ok(),
            invite_id: self.invite_id(),
            reason: self.reason(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum RevokeOutcome {
    Revoked,
    Refused(Refusal),
}

impl RevokeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, RevokeOutcome::Revoked)
    }
}
