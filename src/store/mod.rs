//! Store Module
//!
//! Server-side message storage with TTL expiration.

mod expiry;
mod message_store;
mod record;


// Re-export public types
pub use expiry::ExpiryIndex;
pub use message_store::MessageStore;
pub use record::MessageRecord;

// == Public Constants ==
/// How long a message stays retrievable once stored
pub const MESSAGE_TTL_SECS: u64 = 5 * 60;
