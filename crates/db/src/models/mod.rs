pub mod invite;

pub use invite::{InviteRecord, InviteState, ModelError, Pairing, ttl_secs_from_millis};
