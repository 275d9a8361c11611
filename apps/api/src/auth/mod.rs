// Authentication mechanics: password hashing, opaque bearer tokens, and the
// per-request `AuthUser` context handed explicitly to every service call.

pub mod context;
pub mod password;
pub mod tokens;

pub use context::{AuthUser, MaybeAuthUser};
