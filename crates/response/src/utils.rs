//! Small helpers shared by the decoders.

/// Returns early with `$error` unless `$predicate` holds.
///
/// Reads like an assertion on untrusted backend input, but fails the parse
/// instead of panicking:
///
/// ```ignore
/// ensure!(line.len() <= max_line_size, ParseError::line_too_long(line.len(), max_line_size));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
