//! A table that allocates its own integer keys.
//!
//! [`ChronResTable`] wraps a [`ResTable`] keyed by [`ChronId`] and stamps
//! each record with the next value of a monotonically increasing 32-bit
//! counter at insertion. Identifiers are therefore chronological: a later
//! insert always gets a larger id, until the counter wraps. After a wrap
//! the allocator may land on an id still held by a very long-lived record;
//! insertion just advances past it and retries, so the only cost of a
//! collision is one extra probe.

use core::ptr::NonNull;

use crate::error::{AllocationError, InsertError};
use crate::id::ChronId;
use crate::res_table::{Iter, ResTable, Resource};

/// A record storable in a [`ChronResTable`]: the table owns the
/// identifier's value and rewrites it at insertion.
pub trait ChronResource: Resource<Id = ChronId> {
    /// Stores the allocated identifier. Called exactly while the record is
    /// *not* installed.
    fn set_id(&mut self, id: ChronId);
}

/// A [`ResTable`] handing out chronological integer keys.
pub struct ChronResTable<T: ChronResource> {
    table: ResTable<T>,
    alloc_id: u32,
}

impl<T: ChronResource> ChronResTable<T> {
    /// Creates an empty table. The first allocated id is 1.
    ///
    /// # Errors
    ///
    /// [`AllocationError`] if the bucket array cannot be allocated.
    pub fn new() -> Result<Self, AllocationError> {
        Ok(ChronResTable {
            table: ResTable::new()?,
            alloc_id: 1,
        })
    }

    /// Installs `res` under the next chronological id and returns the id.
    ///
    /// Retries past ids still installed from a previous counter wrap. Does
    /// not return until an id is free, which holds as long as fewer than
    /// 2^32 records are installed at once.
    ///
    /// # Safety
    ///
    /// Same contract as [`ResTable::add`]; additionally `res` must be
    /// exclusively accessible for the duration of this call so the id can
    /// be written.
    pub unsafe fn add(&mut self, mut res: NonNull<T>) -> u32 {
        loop {
            let id = self.alloc_id;
            self.alloc_id = self.alloc_id.wrapping_add(1);
            // SAFETY: `res` is exclusively accessible per the caller
            // contract and not yet installed.
            unsafe { res.as_mut() }.set_id(ChronId::new(id));
            // SAFETY: forwarded caller contract.
            match unsafe { self.table.add(res) } {
                Ok(()) => return id,
                Err(InsertError::Duplicate) => (),
            }
        }
    }

    /// Returns the installed record with identifier `id`.
    pub fn lookup(&self, id: ChronId) -> Option<&T> {
        self.table.lookup(&id)
    }

    /// Unlinks and returns the installed record with identifier `id`.
    pub fn remove(&mut self, id: ChronId) -> Option<&T> {
        self.table.remove(&id)
    }

    /// Returns the number of records installed.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no record is installed.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current bucket count.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Iterates over the installed records in ascending bucket order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    /// Visits every installed record; see [`ResTable::traverse`].
    pub fn traverse(&mut self, op: impl FnMut(NonNull<T>)) {
        self.table.traverse(op);
    }

    /// Checks table invariants under `debug_assertions`.
    pub fn verify(&self) {
        self.table.verify();
    }

    /// Computes occupancy statistics.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::res_table::TableStats {
        self.table.stats()
    }

    /// Writes human-readable diagnostics to standard output.
    #[cfg(all(feature = "stats", feature = "std"))]
    pub fn show(&self, level: u32) {
        self.table.show(level);
    }
}
