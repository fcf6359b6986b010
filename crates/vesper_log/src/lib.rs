//! Logging for the Vesper renderer.
//!
//! Downstream crates log through this facade so the backing implementation
//! can be swapped without touching call sites.

pub use log::{Level, LevelFilter, debug, error, info, log, trace, warn};

/// Evaluates the given expression while logging its wall-clock duration at
/// trace level, returning the expression's value.
#[macro_export]
macro_rules! with_timing_trace {
    ($message:expr $(,$arg:expr)*; $expression:expr) => {{
        $crate::trace!(concat!("Begin: ", $message)$(,$arg)*);
        let _start_time = ::std::time::Instant::now();
        let _result = $expression;
        $crate::trace!(
            concat!("({:.2} ms) Done: ", $message),
            _start_time.elapsed().as_secs_f64() * 1e3
            $(,$arg)*
        );
        _result
    }};
}
