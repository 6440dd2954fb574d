//! Failure types.
//!
//! Environmental failure (allocation) and the expected domain outcome of a
//! colliding insert are two different channels and stay two different types;
//! collapsing them would force callers to branch on a variant they can never
//! usefully retry.

use core::{error, fmt};

/// Backing storage could not be allocated.
///
/// Returned when constructing a table's bucket array or copying an owned
/// string identifier. The object under construction is not created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocationError;

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dynamic memory allocation failed")
    }
}

impl error::Error for AllocationError {}

/// Errors returned by table insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertError {
    /// A record with an equal identifier is already installed. The caller's
    /// record is left untouched.
    Duplicate,
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::Duplicate => f.write_str("identifier already installed"),
        }
    }
}

impl error::Error for InsertError {}
