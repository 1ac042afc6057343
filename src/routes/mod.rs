/// Router Module Index
///
/// Route tables grouped by the gate in front of them. A path lives in exactly one table;
/// paths whose methods need different permissions sit in `authenticated` and their
/// handlers evaluate the stricter `Permission` themselves.

/// No token required.
pub mod public;

/// Behind `auth_middleware`: any valid, unrevoked token.
pub mod authenticated;

/// Behind `auth_middleware` and `admin_middleware`.
pub mod admin;
