use std::fmt;

/// Bearer credential for the generation service. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Source of the credential checked once per `start`.
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn ensure_credential(&self) -> Option<Credential>;
}

/// Provider backed by a fixed, possibly absent key.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    credential: Option<Credential>,
}

impl StaticCredentialProvider {
    pub fn new(secret: Option<String>) -> Self {
        let credential = secret
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Credential);
        Self { credential }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn ensure_credential(&self) -> Option<Credential> {
        self.credential.clone()
    }
}
