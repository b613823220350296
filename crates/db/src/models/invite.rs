use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invite {0} is already paired")]
    AlreadyPaired(String),
    #[error("TTL of {0}ms is out of range")]
    TtlOutOfRange(i64),
}

/// Who, besides the inviter, holds the invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pairing {
    Unpaired,
    Paired { invitee_key: String },
}

/// Caller-visible state of a stored invite at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteState {
    Unpaired,
    Paired,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredInvite", into = "StoredInvite")]
pub struct InviteRecord {
    pub invite_id: String,
    pub inviter_key: String,
    pairing: Pairing,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// On-store shape: camelCase JSON, epoch milliseconds, `inviteeKey` omitted until paired.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredInvite {
    invite_id: String,
    inviter_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    invitee_key: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    expires_at: DateTime<Utc>,
}

impl From<StoredInvite> for InviteRecord {
    fn from(stored: StoredInvite) -> Self {
        let pairing = match stored.invitee_key {
            Some(invitee_key) => Pairing::Paired { invitee_key },
            None => Pairing::Unpaired,
        };
        Self {
            invite_id: stored.invite_id,
            inviter_key: stored.inviter_key,
            pairing,
            created_at: stored.created_at,
            expires_at: stored.expires_at,
        }
    }
}

impl From<InviteRecord> for StoredInvite {
    fn from(record: InviteRecord) -> Self {
        let invitee_key = match record.pairing {
            Pairing::Paired { invitee_key } => Some(invitee_key),
            Pairing::Unpaired => None,
        };
        Self {
            invite_id: record.invite_id,
            inviter_key: record.inviter_key,
            invitee_key,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

impl InviteRecord {
    /// Builds an unpaired record expiring `ttl` after `created_at`.
    ///
    /// Fails when `expires_at` would fall outside the representable range.
    pub fn new(
        invite_id: String,
        inviter_key: String,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self, ModelError> {
        let created_at = created_at.trunc_subsecs(3);
        let expires_at = created_at
            .checked_add_signed(ttl)
            .ok_or(ModelError::TtlOutOfRange(ttl.num_milliseconds()))?;
        Ok(Self {
            invite_id,
            inviter_key,
            pairing: Pairing::Unpaired,
            created_at,
            expires_at,
        })
    }

    pub fn pairing(&self) -> &Pairing {
        &self.pairing
    }

    pub fn invitee_key(&self) -> Option<&str> {
        match &self.pairing {
            Pairing::Paired { invitee_key } => Some(invitee_key),
            Pairing::Unpaired => None,
        }
    }

    pub fn is_paired(&self) -> bool {
        matches!(self.pairing, Pairing::Paired { .. })
    }

    pub fn is_inviter(&self, key: &str) -> bool {
        self.inviter_key == key
    }

    /// One-shot transition from `Unpaired` to `Paired`.
    pub fn pair(&mut self, invitee_key: String) -> Result<(), ModelError> {
        match self.pairing {
            Pairing::Unpaired => {
                self.pairing = Pairing::Paired { invitee_key };
                Ok(())
            }
            Pairing::Paired { .. } => Err(ModelError::AlreadyPaired(self.invite_id.clone())),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> InviteState {
        if self.is_expired_at(now) {
            InviteState::Expired
        } else if self.is_paired() {
            InviteState::Paired
        } else {
            InviteState::Unpaired
        }
    }

    /// Physical TTL covering what is left of the logical lifetime, never below one second.
    pub fn remaining_ttl_secs(&self, now: DateTime<Utc>) -> u64 {
        let remaining_ms = (self.expires_at - now).num_milliseconds();
        ttl_secs_from_millis(remaining_ms.max(0) as u64).max(1)
    }
}

/// Store TTLs are whole seconds; round up so the store never evicts before the logical expiry.
pub fn ttl_secs_from_millis(ttl_ms: u64) -> u64 {
    ttl_ms.div_ceil(1000)
}
