//! Utility macros shared by the transport crate.

/// Returns early with an error if a condition is not met.
///
/// This works like `assert!`, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(committed <= acquired, TransportError::commit_overflow(committed, acquired));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
