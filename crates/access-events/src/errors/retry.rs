/// Classification for the fetch retry loop.
///
/// | Class | Behavior |
/// |-------|----------|
/// | `Never` | Give up immediately, degrade to "no data" |
/// | `WithBackoff` | Retry after an exponential backoff delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal failure. Another attempt would send the same doomed request,
    /// so the fetcher degrades straight to an empty result.
    Never,

    /// Transient failure: timeout, rate limiting, server-side error.
    /// The fetcher sleeps an exponentially growing delay and tries again,
    /// up to its attempt budget.
    WithBackoff,
}
