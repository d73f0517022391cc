//! Analysis sessions: records, storage and the tracker that drives them.
//!
//! A session is created per request and polled by id. The
//! [`SessionTracker`] owns the lifecycle; records live in an injected
//! [`SessionStore`] and are only ever mutated through it.

mod lookup;
mod record;
mod store;
mod tracker;


pub use lookup::ContextLookup;
pub use record::{SessionRecord, SessionSnapshot, SessionStatus};
pub use store::{InMemorySessionStore, SessionStore};
pub use tracker::{ExecutionMode, SessionTracker};
