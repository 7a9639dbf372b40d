// Service token caching and session-based page gating.
pub mod gate;
pub mod token;

pub use gate::{redirect_if_authenticated, require_authenticated};
pub use token::{TokenBundle, TokenCache, TokenError};
