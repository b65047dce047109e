//! chain-set: a single-threaded hash set with separately chained buckets
//! and load-factor driven growth.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a set of unique keys whose bucket table, growth policy and
//!   traversal can each be reasoned about on their own.
//! - Layers:
//!   - `capacity`: bucket counts, the strict 0.7 load bound and the
//!     doubling/rehash sizing rules. Bucket counts are `NonZeroUsize`, so a
//!     modulo by zero is unrepresentable rather than checked.
//!   - `ChainSet<K, S, N>`: the bucket array. Each bucket heads a singly
//!     linked chain of nodes; nodes live in a generational arena and links
//!     are arena keys, so there are no raw pointers and dropping the arena
//!     frees nodes iteratively.
//!   - `Cursor`/`Iter`/`IntoIter`: forward traversal in (bucket, chain)
//!     order. Cursors borrow the set, so a mutation cannot invalidate one
//!     that is still in use.
//!
//! Constraints
//! - Single-threaded; no interior mutability and no synchronization.
//! - Unique keys; a duplicate insert is reported, not an error.
//! - The table only grows: insertion doubles it before linking the new
//!   node, erasure never shrinks it, `clear` resets it to `N` buckets.
//!
//! Hasher and rehashing invariants
//! - Each node stores its key's `u64` hash, computed once on insert.
//!   Rehashing relinks nodes by the stored hash and never calls
//!   `K: Hash`, so no user code runs while the table is being rebuilt.
//! - New nodes are linked at the head of their chain. Chain order is not
//!   part of the contract and is not preserved by a rehash.
//!
//! Notes and non-goals
//! - No shrink-on-erase, no open addressing, no custom allocators.
//! - `dump` is a debugging aid; its text layout may change.

mod capacity;
mod chain_set;
mod chain_set_proptest;
mod cursor;

// Public surface
pub use capacity::{ReserveError, MAX_LOAD_FACTOR};
pub use chain_set::{ChainSet, Dump};
pub use cursor::{Cursor, IntoIter, Iter};
