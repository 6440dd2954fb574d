//! Identifier adapters.
//!
//! A table key is any type implementing [`Identifier`]: equality, a hash,
//! and a pair of bit-width bounds. The minimum width fixes the initial
//! bucket count of a table keyed by the type; the maximum width bounds the
//! hash fold (and with it, table growth). Two families are provided:
//!
//! - [`IntId`] wraps an unsigned integer and hashes it with
//!   [`integer_hash`](crate::hash::integer_hash). The width bounds are const
//!   generics so the fold unrolls; [`U32Id`], [`U64Id`] and [`ChronId`]
//!   cover the common configurations.
//! - [`StringId`] wraps a NUL-terminated byte string, either copied into an
//!   owned buffer or borrowed from the caller, and hashes it with
//!   [`string_hash`](crate::hash::string_hash).
//!
//! Key material must outlive the record's table membership: an owned
//! [`StringId`] carries its bytes, a borrowed one encodes the obligation as
//! a lifetime parameter.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ffi::CStr;
use core::fmt;

use crate::error::AllocationError;
use crate::hash::{
    integer_hash, string_hash, TableIndex, STRING_MAX_ID_WIDTH, STRING_MIN_INDEX_WIDTH,
};

/// The contract a table key satisfies.
///
/// Implementations must keep `hash` consistent with equality: ids that
/// compare equal hash identically. When a table is probed with a type `Q`
/// other than its key type, `Q` must carry the same width bounds and the
/// same hash for values the key type considers equal (the same consistency
/// rule `std` collections place on `Hash`/`Eq` via `Borrow`).
pub trait Identifier: PartialEq {
    /// Smallest meaningful table width in bits; `1 << MIN_INDEX_BIT_WIDTH`
    /// is the bucket count floor for tables keyed by this type.
    const MIN_INDEX_BIT_WIDTH: u32;

    /// Largest meaningful table width in bits; bounds both the hash fold
    /// and table growth.
    const MAX_INDEX_BIT_WIDTH: u32;

    /// Hashes the identifier. The result is unmasked; the table masks it to
    /// its current size.
    fn hash(&self) -> TableIndex;
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for usize {}
}

/// Unsigned integer types usable as [`IntId`] payloads.
pub trait UnsignedId: sealed::Sealed + Copy + Eq {
    /// Widens the value for hashing.
    fn widen(self) -> u64;
}

macro_rules! impl_unsigned_id {
    ($($t:ty),*) => {
        $(impl UnsignedId for $t {
            #[inline]
            fn widen(self) -> u64 {
                self as u64
            }
        })*
    };
}

impl_unsigned_id!(u8, u16, u32, u64, usize);

/// An unsigned integer identifier.
///
/// `MIN_INDEX_WIDTH` and `MAX_ID_WIDTH` parameterize the hash fold at
/// compile time. `MAX_ID_WIDTH` is the number of low bits that may ever be
/// set in an id; keeping the gap to `MIN_INDEX_WIDTH` small keeps the fold
/// short.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntId<T, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32>(T);

/// A 32-bit integer identifier with the default width bounds.
pub type U32Id = IntId<u32, 4, 32>;

/// A 64-bit integer identifier with the default minimum width.
pub type U64Id = IntId<u64, 4, 64>;

/// The key type of chronological tables: 32-bit ids allocated in sequence,
/// so the table starts at 2^9 buckets rather than rehash its way up from
/// the default floor.
pub type ChronId = IntId<u32, 8, 32>;

impl<T: UnsignedId, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32>
    IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    /// Wraps `id`.
    pub const fn new(id: T) -> Self {
        IntId(id)
    }

    /// Returns the wrapped integer.
    pub fn value(self) -> T {
        self.0
    }
}

impl<T: UnsignedId, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> From<T>
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    fn from(id: T) -> Self {
        IntId(id)
    }
}

impl<T: UnsignedId, const MIN_INDEX_WIDTH: u32, const MAX_ID_WIDTH: u32> Identifier
    for IntId<T, MIN_INDEX_WIDTH, MAX_ID_WIDTH>
{
    const MIN_INDEX_BIT_WIDTH: u32 = MIN_INDEX_WIDTH;
    const MAX_INDEX_BIT_WIDTH: u32 = MAX_ID_WIDTH;

    #[inline]
    fn hash(&self) -> TableIndex {
        integer_hash(MIN_INDEX_WIDTH, MAX_ID_WIDTH, self.0.widen())
    }
}

enum Repr<'a> {
    Owned(Box<[u8]>),
    Borrowed(&'a CStr),
    Null,
}

/// A NUL-terminated string identifier.
///
/// Constructed in one of two allocation modes: [`copied`](StringId::copied)
/// duplicates the bytes into an owned buffer released on drop;
/// [`borrowed`](StringId::borrowed) keeps a reference and leaves the bytes'
/// lifetime to the caller, tracked by the `'a` parameter.
///
/// A [`null`](StringId::null) id has no backing bytes. It hashes to bucket
/// zero and compares unequal to everything, itself included, so a record
/// whose key material was withdrawn can never be matched by a probe. This
/// also means `StringId` is `PartialEq` but deliberately not `Eq`.
pub struct StringId<'a> {
    repr: Repr<'a>,
}

impl StringId<'static> {
    /// Copies `id` into an owned buffer.
    ///
    /// The buffer is exactly the string plus its terminator and is freed
    /// when the identifier is dropped.
    pub fn copied(id: &CStr) -> Result<Self, AllocationError> {
        let src = id.to_bytes_with_nul();
        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(src.len())
            .map_err(|_| AllocationError)?;
        buf.extend_from_slice(src);
        Ok(StringId {
            repr: Repr::Owned(buf.into_boxed_slice()),
        })
    }

    /// Creates an identifier with no backing bytes.
    pub const fn null() -> Self {
        StringId { repr: Repr::Null }
    }
}

impl<'a> StringId<'a> {
    /// Borrows `id`. The caller keeps the bytes alive for `'a`, which must
    /// cover every table membership of records keyed by this identifier.
    pub const fn borrowed(id: &'a CStr) -> Self {
        StringId {
            repr: Repr::Borrowed(id),
        }
    }

    /// Returns the backing string, or `None` for a null identifier.
    pub fn as_c_str(&self) -> Option<&CStr> {
        match &self.repr {
            // SAFETY: the buffer was copied verbatim from a valid C string,
            // terminator included, and is never mutated afterwards.
            Repr::Owned(bytes) => Some(unsafe { CStr::from_bytes_with_nul_unchecked(bytes) }),
            Repr::Borrowed(id) => Some(id),
            Repr::Null => None,
        }
    }

    /// Writes the identifier to standard output at diagnostic `level` > 2.
    #[cfg(feature = "std")]
    pub fn show(&self, level: u32) {
        if level > 2 {
            match self.as_c_str() {
                Some(id) => std::println!("resource id = {}", id.to_bytes().escape_ascii()),
                None => std::println!("resource id = <null>"),
            }
        }
    }
}

impl<'a, 'b> PartialEq<StringId<'b>> for StringId<'a> {
    fn eq(&self, other: &StringId<'b>) -> bool {
        match (self.as_c_str(), other.as_c_str()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Identifier for StringId<'_> {
    const MIN_INDEX_BIT_WIDTH: u32 = STRING_MIN_INDEX_WIDTH;
    const MAX_INDEX_BIT_WIDTH: u32 = STRING_MAX_ID_WIDTH;

    fn hash(&self) -> TableIndex {
        match self.as_c_str() {
            Some(id) => string_hash(id),
            None => 0,
        }
    }
}

impl fmt::Debug for StringId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.repr {
            Repr::Owned(_) => "owned",
            Repr::Borrowed(_) => "borrowed",
            Repr::Null => "null",
        };
        let mut s = f.debug_struct("StringId");
        s.field("mode", &mode);
        if let Some(id) = self.as_c_str() {
            s.field("id", &id);
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_id_equality_and_hash() {
        let a = U32Id::new(0x1234_5678);
        let b = U32Id::new(0x1234_5678);
        let c = U32Id::new(0x1234_5679);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.hash(), integer_hash(4, 32, 0x1234_5678));
        assert_eq!(a.value(), 0x1234_5678);
    }

    #[test]
    fn narrow_int_id_folds_to_its_own_width() {
        type NarrowId = IntId<u8, 4, 8>;
        let id = NarrowId::new(0x37);
        assert_eq!(id.hash(), 0x34);
        assert_eq!(NarrowId::MIN_INDEX_BIT_WIDTH, 4);
        assert_eq!(NarrowId::MAX_INDEX_BIT_WIDTH, 8);
    }

    #[test]
    fn string_id_modes_compare_equal() {
        let owned = StringId::copied(c"pv:alpha").unwrap();
        let backing = c"pv:alpha";
        let borrowed = StringId::borrowed(backing);
        assert_eq!(owned, borrowed);
        assert_eq!(owned.hash(), borrowed.hash());
        assert_eq!(owned.as_c_str(), Some(&*backing));

        let other = StringId::borrowed(c"pv:beta");
        assert_ne!(owned, other);
    }

    #[test]
    fn null_string_id_matches_nothing() {
        let null = StringId::null();
        assert_eq!(null.hash(), 0);
        assert!(null.as_c_str().is_none());
        assert_ne!(null, StringId::null());
        assert_ne!(null, StringId::borrowed(c""));
        // An empty string is still a real key.
        assert_eq!(StringId::borrowed(c""), StringId::borrowed(c""));
    }

    #[cfg(feature = "std")]
    #[test]
    fn show_is_silent_below_detail_levels() {
        let id = StringId::borrowed(c"pv:alpha");
        id.show(0);
        id.show(2);
        // Detail levels print the backing string, or a placeholder for a
        // null id.
        id.show(3);
        StringId::null().show(3);
    }

    #[test]
    fn owned_copy_is_independent_of_the_source() {
        let owned;
        {
            let source = alloc::ffi::CString::new("transient").unwrap();
            owned = StringId::copied(&source).unwrap();
        }
        // Source freed; the copy still matches a fresh probe.
        assert_eq!(owned, StringId::borrowed(c"transient"));
        drop(owned);
    }
}
