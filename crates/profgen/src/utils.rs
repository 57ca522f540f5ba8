//! Utility macros shared by the parsers and generators.

/// Returns early with an error if a condition is not met.
///
/// Works like `assert!`, except the failure is returned as `Err($error)` instead of
/// panicking.
///
/// ```ignore
/// ensure!(!input.is_empty(), FormatError::Empty);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
