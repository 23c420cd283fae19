//! Assertions over discussion core results
//!
//! Panics carry the full debug value so a failing scenario shows what came back.

use crate::core_discussion::{DiscussionError, DiscussionResult, ErrorKind};
use std::fmt::Debug;

/// Assert that a Result is Ok and return the value
pub fn assert_ok<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a Result is Err and return the error
pub fn assert_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
        Err(e) => e,
    }
}

/// Assert the single denial class, whatever its internal cause
pub fn assert_permission_denied<T: Debug>(result: DiscussionResult<T>) {
    match result {
        Err(DiscussionError::PermissionDenied) => {}
        other => panic!("Expected PermissionDenied, got {:?}", other),
    }
}

/// Assert a missing or expired record
pub fn assert_not_found<T: Debug>(result: DiscussionResult<T>) -> DiscussionError {
    let err = assert_err(result);
    if !err.is_not_found() {
        panic!("Expected a not-found class error, got {:?}", err);
    }
    err
}

/// Assert the coarse kind of an error
pub fn assert_kind<T: Debug>(result: DiscussionResult<T>, kind: ErrorKind) -> DiscussionError {
    let err = assert_err(result);
    if err.kind() != kind {
        panic!("Expected {:?} error, got {:?}", kind, err);
    }
    err
}

/// Assert that two collections have the same elements (order doesn't matter)
pub fn assert_same_elements<T: PartialEq + Debug>(a: &[T], b: &[T]) {
    if a.len() != b.len() || a.iter().any(|item| !b.contains(item)) {
        panic!("Collections differ. a: {:?}, b: {:?}", a, b);
    }
}
