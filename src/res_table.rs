//! An intrusive resource table growing by incremental linear hashing.
//!
//! [`ResTable<T>`] indexes caller-owned records by the identifier embedded
//! in each record. Records are borrowed, never owned: the table links them
//! into per-bucket [`Chain`]s through the record's own [`ChainNode`], so
//! installing and removing a record touches no allocator at all. The only
//! allocation the table ever performs is for the bucket-head array itself.
//!
//! ## Design
//!
//! The table is a flat array of chain heads. An identifier's unmasked hash
//! is reduced to a bucket index with the classical linear-hashing rule:
//!
//! ```text
//! b0 = h & hash_ix_mask
//! b  = if b0 >= next_split_index { b0 } else { h & hash_ix_split_mask }
//! ```
//!
//! Buckets below `next_split_index` have already been split in the current
//! doubling round and select with one extra mask bit; buckets at or above
//! it still share their pair and use the narrower mask. Growth never
//! rehashes the whole table: when the load passes one record per bucket, a
//! single split step detaches one chain, advances the split index, appends
//! the shadow bucket, and redistributes only the detached records. Each
//! record lands either back where it was or in the shadow bucket.
//!
//! When a round completes (`next_split_index` passes `hash_ix_mask`), the
//! masks widen by one bit and head room for the next round is reserved in
//! one step. That reservation is the only bulk work growth ever does, and
//! it moves chain *heads* only; because chains are intrusive, relocating a
//! head carries its whole chain without touching a record. If the
//! reservation fails the round simply does not open: the table runs above
//! its target load but stays correct, and a later insert retries. Growth
//! also stops once another doubling would push the table width past the
//! identifier's `MAX_INDEX_BIT_WIDTH`.
//!
//! The split threshold is `len() > bucket_count()`, a load factor of
//! exactly one. That is looser than the 0.75–0.9 most linear-hashing
//! deployments pick; with intrusive chains a bucket over-run costs one
//! pointer chase rather than a probe cascade, and the threshold is part of
//! the table's observable growth behavior, so it stays.
//!
//! ## Safety invariants
//!
//! The implementation relies on the following invariants, established by
//! the `# Safety` contract of [`ResTable::add`] and maintained internally:
//!
//! 1. **Liveness**: every linked record pointer refers to a live record
//!    that has not moved since it was added. The caller must remove a
//!    record before invalidating it; the table cannot detect a dangling
//!    member.
//! 2. **Residency**: a record is linked in exactly the bucket its
//!    identifier currently maps to under the split rule above. Splits
//!    relocate records eagerly to preserve this.
//! 3. **Uniqueness**: no two members compare equal, enforced by the
//!    duplicate scan in `add`.
//! 4. **Count**: `n_in_use` equals the number of linked records across all
//!    chains.
//!
//! `verify` re-checks invariants 2 and 4 under `debug_assertions`.
//!
//! Nothing here is thread-aware. The `Cell`-based links make a table
//! `!Sync` by construction; callers that share one across threads must
//! serialize access externally.

use alloc::vec::Vec;
use core::fmt;
use core::mem;
use core::ptr::NonNull;

use crate::chain::{Chain, Linked};
use crate::error::{AllocationError, InsertError};
use crate::id::Identifier;

/// A record storable in a [`ResTable`]: an intrusive link plus an embedded
/// identifier.
pub trait Resource: Linked {
    /// The identifier type the record embeds.
    type Id: Identifier;

    /// Returns the embedded identifier. Must be stable (and its key
    /// material valid) for as long as the record is installed.
    fn id(&self) -> &Self::Id;

    /// Writes per-record diagnostics to standard output; called by
    /// [`ResTable::show`] at level 3 and up.
    #[cfg(feature = "std")]
    fn show(&self, _level: u32) {}
}

/// A hash-indexed table of borrowed records.
///
/// See the [module docs](self) for the growth scheme and safety
/// invariants.
///
/// # Examples
///
/// ```rust
/// use core::ptr::NonNull;
///
/// use lin_hash::{ChainNode, Linked, ResTable, Resource, U32Id};
///
/// struct Device {
///     id: U32Id,
///     node: ChainNode<Self>,
/// }
///
/// impl Linked for Device {
///     fn link(&self) -> &ChainNode<Self> {
///         &self.node
///     }
/// }
///
/// impl Resource for Device {
///     type Id = U32Id;
///     fn id(&self) -> &U32Id {
///         &self.id
///     }
/// }
///
/// let dev = Device {
///     id: U32Id::new(7),
///     node: ChainNode::new(),
/// };
/// let mut table: ResTable<Device> = ResTable::new().unwrap();
/// // SAFETY: `dev` outlives the table and is never moved while installed.
/// unsafe { table.add(NonNull::from(&dev)) }.unwrap();
/// assert_eq!(table.lookup(&U32Id::new(7)).map(|d| d.id().value()), Some(7));
/// assert!(table.remove(&U32Id::new(7)).is_some());
/// assert!(table.is_empty());
/// ```
pub struct ResTable<T: Resource> {
    buckets: Vec<Chain<T>>,
    next_split_index: usize,
    hash_ix_mask: usize,
    hash_ix_split_mask: usize,
    n_in_use: usize,
}

impl<T: Resource> ResTable<T> {
    /// Creates an empty table with `1 << (MIN_INDEX_BIT_WIDTH + 1)` buckets
    /// and head room reserved for the first doubling round.
    ///
    /// # Errors
    ///
    /// [`AllocationError`] if the bucket array cannot be allocated; no
    /// table is constructed.
    pub fn new() -> Result<Self, AllocationError> {
        let min = T::Id::MIN_INDEX_BIT_WIDTH;
        debug_assert!(min >= 1 && min + 2 < usize::BITS);
        let hash_ix_mask = (1usize << (min + 1)) - 1;
        let hash_ix_split_mask = (hash_ix_mask << 1) | 1;
        let mut buckets: Vec<Chain<T>> = Vec::new();
        buckets
            .try_reserve_exact(hash_ix_split_mask + 1)
            .map_err(|_| AllocationError)?;
        buckets.resize_with(hash_ix_mask + 1, Chain::new);
        Ok(ResTable {
            buckets,
            next_split_index: 0,
            hash_ix_mask,
            hash_ix_split_mask,
            n_in_use: 0,
        })
    }

    /// Returns the number of records installed.
    pub fn len(&self) -> usize {
        self.n_in_use
    }

    /// Returns `true` if no record is installed.
    pub fn is_empty(&self) -> bool {
        self.n_in_use == 0
    }

    /// Returns the current bucket count.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Installs `res`.
    ///
    /// Scans the destination bucket for an equal identifier first, then
    /// performs at most one split step if the table is over its load
    /// target, and links the record at the front of its bucket.
    ///
    /// # Errors
    ///
    /// [`InsertError::Duplicate`] if a record with an equal identifier is
    /// already installed; `res` is left untouched and unlinked.
    ///
    /// # Safety
    ///
    /// - `res` must point to a record that stays valid and unmoved until it
    ///   is returned by [`remove`](ResTable::remove) (or the table is
    ///   dropped first).
    /// - `res` must not currently be a member of any table or chain.
    /// - While installed, the record must only be accessed through shared
    ///   references, and its identifier must not change.
    pub unsafe fn add(&mut self, res: NonNull<T>) -> Result<(), InsertError> {
        // SAFETY: `res` is valid per the caller contract; the reference is
        // dropped before the record is linked.
        let record = unsafe { res.as_ref() };
        let mut index = self.bucket_index(record.id());
        if self.buckets[index].iter().any(|m| *m.id() == *record.id()) {
            return Err(InsertError::Duplicate);
        }
        if self.n_in_use > self.buckets.len() {
            self.split_bucket();
            // The split may have redistributed the destination bucket.
            index = self.bucket_index(record.id());
        }
        // SAFETY: `res` is valid and unlinked per the caller contract, and
        // the scan above found no equal identifier in the table.
        unsafe { self.buckets[index].push_front(res) };
        self.n_in_use += 1;
        Ok(())
    }

    /// Returns the installed record whose identifier equals `id`.
    pub fn lookup<Q>(&self, id: &Q) -> Option<&T>
    where
        Q: Identifier,
        T::Id: PartialEq<Q>,
    {
        let index = self.bucket_index(id);
        self.buckets[index].iter().find(|m| *m.id() == *id)
    }

    /// Unlinks and returns the installed record whose identifier equals
    /// `id`. The record is the caller's again; the table keeps no pointer
    /// to it.
    pub fn remove<Q>(&mut self, id: &Q) -> Option<&T>
    where
        Q: Identifier,
        T::Id: PartialEq<Q>,
    {
        let index = self.bucket_index(id);
        let removed = self.buckets[index].find_unlink(|m| *m.id() == *id)?;
        self.n_in_use -= 1;
        // SAFETY: the record was installed via `add`, whose contract keeps
        // it valid until this return hands it back.
        Some(unsafe { &*removed.as_ptr() })
    }

    /// Visits every installed record exactly once, in ascending bucket
    /// order.
    ///
    /// The successor is captured before `op` runs, so `op` may unlink the
    /// visited record from other containers, rewrite its payload, or
    /// otherwise disturb it without derailing the walk. `op` cannot touch
    /// this table (it is exclusively borrowed), so no record can be added
    /// or removed mid-traversal.
    pub fn traverse(&mut self, mut op: impl FnMut(NonNull<T>)) {
        for bucket in &self.buckets {
            let mut cursor = bucket.head();
            while let Some(res) = cursor {
                // SAFETY: linked records are valid per the `add` contract.
                cursor = unsafe { res.as_ref() }.link().get();
                op(res);
            }
        }
    }

    /// Iterates over the installed records in ascending bucket order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            table: self,
            bucket: 1,
            cursor: self.buckets[0].head(),
        }
    }

    /// Walks every chain and checks the residency and count invariants.
    /// The checks compile to nothing without `debug_assertions`.
    pub fn verify(&self) {
        debug_assert_eq!(
            self.buckets.len(),
            self.hash_ix_mask + 1 + self.next_split_index
        );
        debug_assert_eq!(self.hash_ix_split_mask, 2 * (self.hash_ix_mask + 1) - 1);
        let mut total = 0usize;
        for (index, bucket) in self.buckets.iter().enumerate() {
            for record in bucket.iter() {
                debug_assert_eq!(self.bucket_index(record.id()), index);
                total += 1;
            }
        }
        debug_assert_eq!(total, self.n_in_use);
    }

    fn bucket_index<Q: Identifier>(&self, id: &Q) -> usize {
        debug_assert_eq!(Q::MIN_INDEX_BIT_WIDTH, T::Id::MIN_INDEX_BIT_WIDTH);
        debug_assert_eq!(Q::MAX_INDEX_BIT_WIDTH, T::Id::MAX_INDEX_BIT_WIDTH);
        let hash = id.hash();
        let narrow = hash & self.hash_ix_mask;
        if narrow >= self.next_split_index {
            narrow
        } else {
            hash & self.hash_ix_split_mask
        }
    }

    /// One split step: open the next doubling round if the current one is
    /// complete, then rehash the single chain at the split index.
    fn split_bucket(&mut self) {
        if self.next_split_index > self.hash_ix_mask {
            // Width the table would reach if the next round ran to
            // completion; a round landing exactly on the identifier's
            // maximum is still in bounds.
            let doubled_width = self.hash_ix_split_mask.count_ones() + 1;
            if doubled_width > T::Id::MAX_INDEX_BIT_WIDTH {
                return;
            }
            // Reserving the whole round up front keeps the per-split bucket
            // pushes below from ever reallocating mid-round.
            if self
                .buckets
                .try_reserve_exact(self.buckets.len())
                .is_err()
            {
                return;
            }
            self.hash_ix_mask = self.hash_ix_split_mask;
            self.hash_ix_split_mask = (self.hash_ix_split_mask << 1) | 1;
            self.next_split_index = 0;
        }

        let mut detached = mem::take(&mut self.buckets[self.next_split_index]);
        self.next_split_index += 1;
        self.buckets.push(Chain::new());
        while let Some(res) = detached.pop_front() {
            // SAFETY: linked records are valid per the `add` contract.
            let index = self.bucket_index(unsafe { res.as_ref() }.id());
            // SAFETY: `res` was just unlinked from the detached chain.
            unsafe { self.buckets[index].push_front(res) };
        }
    }
}

impl<T: Resource> fmt::Debug for ResTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResTable")
            .field("buckets", &self.buckets.len())
            .field("installed", &self.n_in_use)
            .field("next_split_index", &self.next_split_index)
            .field("hash_ix_mask", &self.hash_ix_mask)
            .field("hash_ix_split_mask", &self.hash_ix_split_mask)
            .finish()
    }
}

/// Restartable forward iterator over a [`ResTable`].
///
/// Yields every installed record exactly once. The table cannot be mutated
/// while an iterator borrows it.
pub struct Iter<'a, T: Resource> {
    table: &'a ResTable<T>,
    bucket: usize,
    cursor: Option<NonNull<T>>,
}

impl<'a, T: Resource> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some(res) = self.cursor {
                // SAFETY: linked records are valid per the `add` contract,
                // and the table is borrowed for 'a.
                let record = unsafe { &*res.as_ptr() };
                self.cursor = record.link().get();
                return Some(record);
            }
            if self.bucket >= self.table.buckets.len() {
                return None;
            }
            self.cursor = self.table.buckets[self.bucket].head();
            self.bucket += 1;
        }
    }
}

impl<'a, T: Resource> IntoIterator for &'a ResTable<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// Per-bucket occupancy statistics.
#[cfg(feature = "stats")]
#[derive(Debug, Clone, Copy)]
pub struct TableStats {
    /// Bucket count.
    pub buckets: usize,
    /// Records installed.
    pub entries: usize,
    /// Longest chain.
    pub max_chain: usize,
    /// Mean chain length over all buckets.
    pub mean: f64,
    /// Variance of chain length over all buckets.
    pub variance: f64,
}

#[cfg(feature = "stats")]
impl<T: Resource> ResTable<T> {
    /// Computes occupancy statistics by walking every chain.
    pub fn stats(&self) -> TableStats {
        let buckets = self.buckets.len();
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut max_chain = 0usize;
        for bucket in &self.buckets {
            let count = bucket.iter().count();
            if count > 0 {
                sum += count as f64;
                sum_sq += (count * count) as f64;
                if count > max_chain {
                    max_chain = count;
                }
            }
        }
        let mean = sum / buckets as f64;
        let variance = (sum_sq / buckets as f64 - mean * mean).max(0.0);
        TableStats {
            buckets,
            entries: self.n_in_use,
            max_chain,
            mean,
            variance,
        }
    }
}

#[cfg(all(feature = "stats", feature = "std"))]
impl TableStats {
    /// Pretty-prints the statistics to standard output.
    pub fn print(&self) {
        std::println!(
            "table with {} buckets and {} resources installed",
            self.buckets,
            self.entries
        );
        std::println!(
            "entries per bucket: mean = {:.3} std dev = {:.3} max = {}",
            self.mean,
            self.variance.sqrt(),
            self.max_chain
        );
    }
}

#[cfg(all(feature = "stats", feature = "std"))]
impl<T: Resource> ResTable<T> {
    /// Writes human-readable diagnostics to standard output. Level 0 prints
    /// the headline counts, level 1 adds occupancy statistics, level 3 and
    /// up also delegates to each record's [`Resource::show`].
    pub fn show(&self, level: u32) {
        if level >= 3 {
            for record in self.iter() {
                record.show(level);
            }
        }
        if level >= 1 {
            self.stats().print();
        } else {
            std::println!(
                "table with {} buckets and {} resources installed",
                self.buckets.len(),
                self.n_in_use
            );
        }
    }
}
