//! Loopback origin policy for browser callers.

use crate::json;

const LOOPBACK_ORIGINS: [&str; 2] = ["http://localhost", "http://127.0.0.1"];

/// Reports whether a browser `Origin` header may reach the endpoint.
///
/// An absent (empty) origin is accepted, as are origins whose
/// lower-cased text starts with a loopback HTTP origin.
#[must_use]
pub fn is_origin_allowed(origin: &str) -> bool {
    if origin.is_empty() {
        return true;
    }
    let normalised = json::trim(origin).to_ascii_lowercase();
    LOOPBACK_ORIGINS
        .iter()
        .any(|prefix| normalised.starts_with(prefix))
}
