//! Transient fault classification.
//!
//! A transient fault is a server error that is likely to succeed if the same
//! call is retried. The classifier only answers yes or no; backoff and retry
//! counts belong to the caller.

/// Retryable server error codes and what they mean.
const TRANSIENT_CODES: &[(i32, &str)] = &[
    (20, "instance does not support encryption"),
    (64, "connection dropped during login"),
    (121, "semaphore timeout on the transport"),
    (233, "no process on the other end of the pipe"),
    (701, "insufficient system memory"),
    (1205, "deadlock victim"),
    (1222, "lock request timeout"),
    (4060, "cannot open database requested by the login"),
    (4221, "login to read-secondary failed during replica reconfiguration"),
    (8645, "timeout waiting for memory resources"),
    (8651, "low memory condition"),
    (10053, "connection aborted by the host"),
    (10054, "connection reset by peer"),
    (10060, "connection attempt timed out"),
    (10928, "resource limit reached"),
    (10929, "minimum guarantee not available"),
    (10936, "request limit reached for elastic pool"),
    (18401, "server is in script upgrade mode"),
    (40143, "service encountered an error processing the request"),
    (40197, "service is reconfiguring"),
    (40501, "service is busy"),
    (40540, "service encountered an error processing the request"),
    (40613, "database is not currently available"),
    (41301, "dependency failure on commit"),
    (41302, "row updated by a concurrent transaction"),
    (41305, "repeatable read validation failure"),
    (41325, "serializable validation failure"),
    (41839, "transaction exceeded maximum commit dependencies"),
    (42108, "cannot connect to the SQL pool"),
    (42109, "SQL pool is paused"),
    (49918, "not enough resources to process the request"),
    (49919, "too many create or update operations in progress"),
    (49920, "too many operations in progress"),
];

/// Returns `true` if `code` names a retryable condition.
///
/// # Examples
///
/// ```
/// use tabmap_core::is_transient;
///
/// assert!(is_transient(1205));
/// assert!(!is_transient(2627));
/// ```
pub fn is_transient(code: i32) -> bool {
    transient_reason(code).is_some()
}

/// Short description of a retryable condition, or `None` if `code` is not
/// transient.
pub fn transient_reason(code: i32) -> Option<&'static str> {
    TRANSIENT_CODES
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| TRANSIENT_CODES[i].1)
}
