//! Asynchronous timer abstraction providing the timing primitives required
//! by operation timeouts and reconnect backoff.

use futures_util::Future;

/// Timer trait abstraction.
///
/// Takes `&self` so several delays (an operation timeout and a reconnect
/// backoff, say) can be pending on the same timer at once.
pub trait LinkTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms(&self, millis: u64) -> impl Future<Output = ()> + '_;
}

/// Production timer backed by `embassy-time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTimer;

impl LinkTimer for EmbassyTimer {
    fn delay_ms(&self, millis: u64) -> impl Future<Output = ()> + '_ {
        embassy_time::Timer::after_millis(millis)
    }
}
