/// Classification for fallback policy.
///
/// Every adapter failure moves the resolver on to the next source in the
/// chain. The class only decides whether the failure also counts against
/// the source's circuit breaker.
///
/// # Behavior Summary
///
/// | Class | Try Next Source? | Record Circuit Breaker Failure? |
/// |-------|------------------|---------------------------------|
/// | `FailoverWithPenalty` | Yes | Yes (affects future requests) |
/// | `NextProvider` | Yes | No |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Move on and record a circuit breaker penalty.
    ///
    /// Used for transport trouble (connection refused, timeout, HTTP
    /// errors). Enough of these open the source's circuit and it is
    /// skipped until the cooldown elapses.
    FailoverWithPenalty,

    /// Move on without any penalty.
    ///
    /// The source answered but had nothing usable for this instrument
    /// (unexpected layout, empty field, non-positive number).
    NextProvider,
}
