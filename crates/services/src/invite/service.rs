use chrono::{DateTime, Duration, SubsecRound, Utc};
use pairly_config::{InviteSettings, Settings, StoreBackend};
use pairly_db::models::{InviteRecord, InviteState, ttl_secs_from_millis};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::outcome::{JoinOutcome, Refusal, ReissueOutcome, RevokeOutcome, Role};
use super::{InviteError, InviteResult};
use crate::lock::{DistributedLock, LocalLock, RedisLock, with_lock};
use crate::secure_id::new_invite_id;
use crate::store::{KeyValueStore, MemoryStore, RecordStore, RedisStore, StoreError};

/// Coordinates the invite lifecycle: create, read, join, reissue, revoke.
///
/// Every decision that depends on the current record (join, reissue, revoke)
/// runs inside the per-invite lock, so concurrent callers on the same invite
/// are totally ordered. Different invites never contend.
pub struct InviteService {
    records: RecordStore<InviteRecord>,
    lock: Arc<dyn DistributedLock>,
    default_ttl: std::time::Duration,
}

impl InviteService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        lock: Arc<dyn DistributedLock>,
        settings: &InviteSettings,
    ) -> Self {
        Self {
            records: RecordStore::new(store, settings.key_prefix.clone()),
            lock,
            default_ttl: std::time::Duration::from_millis(settings.default_ttl_ms),
        }
    }

    /// Builds the service over the backend named in `settings.store.backend`.
    pub async fn from_settings(settings: &Settings) -> InviteResult<Self> {
        let (store, lock): (Arc<dyn KeyValueStore>, Arc<dyn DistributedLock>) =
            match settings.store.backend {
                StoreBackend::Redis => {
                    let conn = pairly_db::connect(settings)
                        .await
                        .map_err(StoreError::from)?;
                    (
                        Arc::new(RedisStore::new(conn.clone())),
                        Arc::new(RedisLock::new(conn, &settings.lock)),
                    )
                }
                StoreBackend::Memory => (
                    Arc::new(MemoryStore::new()),
                    Arc::new(LocalLock::new(&settings.lock)),
                ),
            };
        info!(backend = ?settings.store.backend, "Invite service ready");
        Ok(Self::new(store, lock, &settings.invite))
    }

    /// Creates an unpaired invite. `ttl` defaults to the configured lifetime (24h).
    pub async fn create_invite(
        &self,
        inviter_key: &str,
        ttl: Option<std::time::Duration>,
    ) -> InviteResult<InviteRecord> {
        if inviter_key.is_empty() {
            return Err(InviteError::Validation("inviter key must not be empty".to_string()));
        }
        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl_ms = u64::try_from(ttl.as_millis())
            .map_err(|_| InviteError::Validation("ttl out of range".to_string()))?;
        if ttl_ms == 0 {
            return Err(InviteError::Validation("ttl must be at least 1ms".to_string()));
        }
        let logical_ttl = Duration::from_std(ttl)
            .map_err(|e| InviteError::Validation(format!("ttl out of range: {e}")))?;

        let invite = InviteRecord::new(
            new_invite_id(),
            inviter_key.to_string(),
            now(),
            logical_ttl,
        )
        .map_err(|e| InviteError::Validation(e.to_string()))?;
        let ttl_secs = ttl_secs_from_millis(ttl_ms);
        self.records.put(&invite.invite_id, &invite, ttl_secs).await?;

        info!(
            invite_id = %invite.invite_id,
            ttl_ms,
            ttl_secs,
            "Invite created"
        );
        Ok(invite)
    }

    /// Raw read. Does not check `expires_at`; use `join_invite` for decisions.
    pub async fn get_invite(&self, invite_id: &str) -> InviteResult<Option<InviteRecord>> {
        Ok(self.records.get(invite_id).await?)
    }

    pub async fn join_invite(&self, invite_id: &str, caller_key: &str) -> InviteResult<JoinOutcome> {
        if caller_key.is_empty() {
            return Err(InviteError::Validation("caller key must not be empty".to_string()));
        }
        let resource = self.records.key(invite_id);
        with_lock(self.lock.as_ref(), &resource, || {
            self.join_locked(invite_id, caller_key)
        })
        .await
    }

    async fn join_locked(&self, invite_id: &str, caller_key: &str) -> InviteResult<JoinOutcome> {
        let Some(mut invite) = self.records.get(invite_id).await? else {
            debug!(invite_id, "Join against absent invite");
            return Ok(JoinOutcome::Absent);
        };

        let now = now();
        if invite.state_at(now) == InviteState::Expired {
            debug!(invite_id, expires_at = %invite.expires_at, "Join against expired invite");
            return Ok(JoinOutcome::Expired);
        }

        let invitee_key = invite.invitee_key().map(str::to_owned);

        if invite.is_inviter(caller_key) {
            return Ok(match invitee_key {
                None => JoinOutcome::Pending { invite },
                Some(partner_key) => JoinOutcome::Paired {
                    invite,
                    role: Role::Inviter,
                    partner_key,
                },
            });
        }

        match invitee_key.as_deref() {
            None => {
                invite.pair(caller_key.to_string())?;
                let ttl_secs = invite.remaining_ttl_secs(now);
                self.records.put(invite_id, &invite, ttl_secs).await?;
                info!(invite_id, ttl_secs, "Invite paired");

                let partner_key = invite.inviter_key.clone();
                Ok(JoinOutcome::Paired {
                    invite,
                    role: Role::Invitee,
                    partner_key,
                })
            }
            Some(existing) if existing == caller_key => {
                let partner_key = invite.inviter_key.clone();
                Ok(JoinOutcome::Paired {
                    invite,
                    role: Role::Invitee,
                    partner_key,
                })
            }
            Some(_) => {
                debug!(invite_id, "Join rejected, invite already used");
                Ok(JoinOutcome::Used)
            }
        }
    }

    /// Replaces the invite with a fresh one for the same inviter and revokes the old id.
    pub async fn reissue_invite(
        &self,
        invite_id: &str,
        caller_key: &str,
    ) -> InviteResult<ReissueOutcome> {
        let resource = self.records.key(invite_id);
        with_lock(self.lock.as_ref(), &resource, || {
            self.reissue_locked(invite_id, caller_key)
        })
        .await
    }

    async fn reissue_locked(
        &self,
        invite_id: &str,
        caller_key: &str,
    ) -> InviteResult<ReissueOutcome> {
        let invite = match self.owned_invite(invite_id, caller_key).await? {
            Ok(invite) => invite,
            Err(refusal) => return Ok(ReissueOutcome::Refused(refusal)),
        };

        let replacement = self.create_invite(&invite.inviter_key, None).await?;
        if let Err(err) = self.records.delete(invite_id).await {
            // The old code stays live, so the unpublished replacement must not.
            if let Err(cleanup) = self.records.delete(&replacement.invite_id).await {
                warn!(
                    invite_id = %replacement.invite_id,
                    error = %cleanup,
                    "Failed to remove replacement after aborted reissue"
                );
            }
            return Err(err.into());
        }
        info!(
            previous_invite_id = invite_id,
            invite_id = %replacement.invite_id,
            "Invite reissued"
        );

        Ok(ReissueOutcome::Reissued {
            previous_invite_id: invite_id.to_string(),
            invite: replacement,
        })
    }

    /// Deletes the invite without a replacement. Only the inviter may revoke.
    pub async fn revoke_invite(
        &self,
        invite_id: &str,
        caller_key: &str,
    ) -> InviteResult<RevokeOutcome> {
        let resource = self.records.key(invite_id);
        with_lock(self.lock.as_ref(), &resource, || {
            self.revoke_locked(invite_id, caller_key)
        })
        .await
    }

    async fn revoke_locked(&self, invite_id: &str, caller_key: &str) -> InviteResult<RevokeOutcome> {
        if let Err(refusal) = self.owned_invite(invite_id, caller_key).await? {
            return Ok(RevokeOutcome::Refused(refusal));
        }
        self.records.delete(invite_id).await?;
        info!(invite_id, "Invite revoked");
        Ok(RevokeOutcome::Revoked)
    }

    /// Loads the invite and checks that `caller_key` created it.
    async fn owned_invite(
        &self,
        invite_id: &str,
        caller_key: &str,
    ) -> InviteResult<Result<InviteRecord, Refusal>> {
        let Some(invite) = self.records.get(invite_id).await? else {
            return Ok(Err(Refusal::NotFound));
        };
        if !invite.is_inviter(caller_key) {
            warn!(invite_id, "Ownership check failed");
            return Ok(Err(Refusal::Forbidden));
        }
        Ok(Ok(invite))
    }
}

/// Millisecond clock, matching the precision of stored timestamps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
