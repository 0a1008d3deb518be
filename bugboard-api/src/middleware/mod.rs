/// Middleware modules for the API server
///
/// - `security`: Security response headers
///
/// Authentication runs as a `from_fn_with_state` layer defined next to the
/// router in [`crate::app`].

pub mod security;
