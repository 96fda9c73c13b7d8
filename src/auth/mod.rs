pub mod api_keys;
pub mod membership;

pub use membership::{is_follower, is_host, is_participant, require_host, Relation};
