//! Hash routines for table identifiers.
//!
//! Two hash functions live here, and both feed the same table indexing
//! scheme:
//!
//! - [`integer_hash`] folds a wide unsigned value down by repeatedly XORing
//!   the top half of a shrinking window into the bottom half. The fold stops
//!   once the window reaches the minimum index width, so every input bit
//!   still contributes even when the table masks the result down to a small
//!   bucket count. The result is deliberately *not* masked here; the table
//!   masks it to its current size, which lets one hash value serve a table
//!   at any point in its growth.
//!
//! - [`string_hash`] is a four-lane permuted-byte hash in the style of
//!   "Fast Hashing of Variable Length Text Strings" (Peter K. Pearson,
//!   CACM, June 1990), with the lanes and permutation arranged for short
//!   identifier strings. Each input byte updates one 8-bit lane through a
//!   fixed 256-byte permutation; the four lanes are packed into a 32-bit
//!   composite which then goes through [`integer_hash`].
//!
//! The permutation table is part of the compatibility surface: hashes
//! computed by this module must match values computed by other
//! implementations byte for byte, so the table must never change.

use core::ffi::CStr;

/// The unsigned type used for bucket indices and unmasked hash values.
pub type TableIndex = usize;

/// Minimum index width applied when hashing string identifiers.
pub(crate) const STRING_MIN_INDEX_WIDTH: u32 = 8;

/// Fold bound applied when hashing string identifiers; the composite built
/// from the four lanes is 32 bits wide.
pub(crate) const STRING_MAX_ID_WIDTH: u32 = 32;

/// Folds an unsigned integer into a table index.
///
/// `max_id_width` is the number of low bits of `id` that may ever be set;
/// `min_index_width` is the smallest table width (in bits) the result must
/// cover. The fold halves the window each step, XORing the upper half into
/// the lower, and stops once the window is no wider than `min_index_width`.
/// With `min_index_width >= max_id_width` the value passes through
/// untouched.
///
/// The loop runs at most `log2(max_id_width / min_index_width)` times and
/// unrolls completely when both widths are compile-time constants, which is
/// why the identifier adapters carry them as const generics.
#[inline]
pub fn integer_hash(min_index_width: u32, max_id_width: u32, id: u64) -> TableIndex {
    let mut hash = id;
    let mut width = max_id_width;
    while width > min_index_width {
        width >>= 1;
        hash ^= hash >> width;
    }
    hash as TableIndex
}

/// Hashes a NUL-terminated string into a table index.
///
/// Input bytes are dealt round-robin to four 8-bit lanes; each byte replaces
/// its lane with `P[lane ^ byte]` where `P` is the fixed permutation below.
/// The lanes decorrelate rotations of the input, which matters for
/// identifier vocabularies full of shared prefixes. The packed 32-bit
/// composite is folded by [`integer_hash`] so the result can index tables
/// from 2^8 buckets up.
pub fn string_hash(id: &CStr) -> TableIndex {
    let mut lanes = [0u8; 4];
    for (i, &byte) in id.to_bytes().iter().enumerate() {
        let lane = &mut lanes[i & 3];
        *lane = PERMUTED_INDEX_SPACE[usize::from(*lane ^ byte)];
    }
    let composite = u32::from(lanes[3]) << 24
        | u32::from(lanes[2]) << 16
        | u32::from(lanes[1]) << 8
        | u32::from(lanes[0]);
    integer_hash(
        STRING_MIN_INDEX_WIDTH,
        STRING_MAX_ID_WIDTH,
        u64::from(composite),
    )
}

// A single permutation of 0..=255. Part of the compatibility surface; do
// not regenerate.
#[rustfmt::skip]
const PERMUTED_INDEX_SPACE: [u8; 256] = [
     39, 159, 180, 252,  71,   6,  13, 164, 232,  35, 226, 155,  98, 120, 154,  69,
    157,  24, 137,  29, 147,  78, 121,  85, 112,   8, 248, 130,  55, 117, 190, 160,
    176, 131, 228,  64, 211, 106,  38,  27, 140,  30,  88, 210, 227, 104,  84,  77,
     75, 107, 169, 138, 195, 184,  70,  90,  61, 166,   7, 244, 165, 108, 219,  51,
      9, 139, 209,  40,  31, 202,  58, 179, 116,  33, 207, 146,  76,  60, 242, 124,
    254, 197,  80, 167, 153, 145, 129, 233, 132,  48, 246,  86, 156, 177,  36, 187,
     45,   1,  96,  18,  19,  62, 185, 234,  99,  16, 218,  95, 128, 224, 123, 253,
     42, 109,   4, 247,  72,   5, 151, 136,   0, 152, 148, 127, 204, 133,  17,  14,
    182, 217,  54, 199, 119, 174,  82,  57, 215,  41, 114, 208, 206, 110, 239,  23,
    189,  15,   3,  22, 188,  79, 113, 172,  28,   2, 222,  21, 251, 225, 237, 105,
    102,  32,  56, 181, 126,  83, 230,  53, 158,  52,  59, 213, 118, 100,  67, 142,
    220, 170, 144, 115, 205,  26, 125, 168, 249,  66, 175,  97, 255,  92, 229,  91,
    214, 236, 178, 243,  46,  44, 201, 250, 135, 186, 150, 221, 163, 216, 162,  43,
     11, 101,  34,  37, 194,  25,  50,  12,  87, 198, 173, 240, 193, 171, 143, 231,
    111, 141, 191, 103,  74, 245, 223,  20, 161, 235, 122,  63,  89, 149,  73, 238,
    134,  68,  93, 183, 241,  81, 196,  49, 192,  65, 212,  94, 203,  10, 200,  47,
];
