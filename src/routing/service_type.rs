//! Service type derivation from request paths.
//!
//! # Responsibilities
//! - Extract the service type segment from an inbound path
//! - Stay pure: no config, no I/O, no allocation
//!
//! # Design Decisions
//! - The service type is the second non-empty path segment
//!   (`/v1/employees/list` → `employees`)
//! - Paths with fewer than two non-empty segments have no service type
//! - Case-sensitive: service types are lowercase by convention

/// Derive the service type from a request path.
pub fn from_path(path: &str) -> Option<&str> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.next()?;
    segments.next()
}
