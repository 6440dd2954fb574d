#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod chain;
pub mod chron_table;
pub mod error;
pub mod hash;
pub mod id;
pub mod res_table;

pub use chain::Chain;
pub use chain::ChainIter;
pub use chain::ChainNode;
pub use chain::Linked;
pub use chron_table::ChronResTable;
pub use chron_table::ChronResource;
pub use error::AllocationError;
pub use error::InsertError;
pub use hash::integer_hash;
pub use hash::string_hash;
pub use hash::TableIndex;
pub use id::ChronId;
pub use id::Identifier;
pub use id::IntId;
pub use id::StringId;
pub use id::U32Id;
pub use id::U64Id;
pub use id::UnsignedId;
pub use res_table::Iter;
pub use res_table::ResTable;
pub use res_table::Resource;

#[cfg(feature = "stats")]
pub use res_table::TableStats;
