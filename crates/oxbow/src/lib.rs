//! Lazy sequences over one-shot producers, backed by a shared append-only
//! cache, with scoped cleanup for abandoned traversals and single-value
//! wrappers sharing one laziness protocol. Strictly single-threaded.

pub mod cleanup;
pub mod collections;
pub mod monad;
pub mod produce;
pub mod sequence;
pub mod tape;

pub use cleanup::{CleanupScope, ScopeGuard};
pub use collections::{SeqMap, SeqSet};
pub use monad::either::{Branch, Either};
pub use monad::maybe::Maybe;
pub use monad::trial::Trial;
pub use monad::validated::Validated;
pub use monad::Deferred;
pub use produce::{from_fn, from_iter, Producer};
pub use sequence::{SeqIter, Sequence};
pub use tape::Cursor;

/// Fault raised while pulling from an external producer. `Clone` because a
/// stored fault re-surfaces to every later reader of the same tape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeqError {
    #[error("producer fault: {0}")]
    Producer(String),
}
