use std::fmt;

use secrecy::SecretString;

/// Opaque credential capability attached to a device.
///
/// The engine stores this and hands it back out, but never calls into it:
/// tokens are consumed by the command-issuing RPC layer, which lives
/// outside this crate. Keeping the capability here lets a device be
/// self-sufficient when such an extension arrives without the engine
/// ever inspecting secret material.
pub trait Authenticator: Send + Sync {
    /// A bearer token valid for API calls on behalf of the owning user.
    fn access_token(&self) -> SecretString;
}

/// Static token holder, sufficient for tests and for callers that refresh
/// tokens externally and rebuild the authenticator.
#[derive(Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl Authenticator for StaticToken {
    fn access_token(&self) -> SecretString {
        self.0.clone()
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SecretString already redacts, but don't even echo the wrapper.
        f.write_str("StaticToken(..)")
    }
}
