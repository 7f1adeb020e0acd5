//! Mapping of HTTP transport failures onto the application error taxonomy.

use abunda_core::AppError;

/// Classify a `reqwest` error.
///
/// Connection failures become `AppError::Unavailable` and deadline overruns
/// become `AppError::Timeout`. Anything else (bad body, redirect loop,
/// decode failure) is handed to `fallback`, which picks the caller's
/// domain-specific variant.
pub fn transport_error(
    service: &str,
    err: reqwest::Error,
    fallback: fn(String) -> AppError,
) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(format!("{} did not respond in time: {}", service, err))
    } else if err.is_connect() {
        AppError::Unavailable(format!("{} is unreachable: {}", service, err))
    } else {
        fallback(format!("{} request failed: {}", service, err))
    }
}
