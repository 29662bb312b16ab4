//! Access to the provider API token.

/// Read access to the provider API token.
///
/// Secret storage is out of scope here; the orchestrator only needs to know
/// whether a token exists and what it is.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Check whether a token is available.
    fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// The token, if one is available.
    fn credential(&self) -> Option<String>;
}

/// A token fixed at construction, typically taken from configuration.
#[derive(Clone, Default)]
pub struct StaticCredentialStore {
    token: Option<String>,
}

impl StaticCredentialStore {
    /// Create a store. Blank tokens count as absent.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { token }
    }

    /// A store with no token.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StaticCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialStore")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn credential(&self) -> Option<String> {
        self.token.clone()
    }
}
