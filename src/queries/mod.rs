//! Query modules over the symbol cache.
//!
//! Each query struct borrows a [`CacheStore`](crate::store::CacheStore) and
//! exposes methods returning `Result<T>`.

pub mod symbols;

pub use symbols::{SymbolQuery, DEFAULT_LIMIT};
