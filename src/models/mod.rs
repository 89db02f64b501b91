pub mod entry;
pub mod row;

pub use entry::*;
pub use row::*;
