pub mod invite;
pub mod lock;
pub mod secure_id;
pub mod store;

pub use invite::{
    InviteError, InviteResult, InviteService, JoinError, JoinOutcome, JoinStatus, Refusal,
    ReissueOutcome, RevokeOutcome, Role,
};
pub use lock::{DistributedLock, LocalLock, LockError, LockLease, RedisLock, with_lock};
pub use store::{KeyValueStore, MemoryStore, RecordStore, RedisStore, StoreError};
