use std::fmt;

/// Bearer credential presented to the remote store. Opaque; never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0)
    }

    fn from_candidate(candidate: Option<&str>) -> Option<Self> {
        candidate
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Picks the credential for a request: the process-wide token first, then
/// the request body, then the query string.
#[derive(Debug, Clone, Default)]
pub struct TokenResolver {
    process_token: Option<Credential>,
}

impl TokenResolver {
    pub fn new(process_token: Option<String>) -> Self {
        Self {
            process_token: Credential::from_candidate(process_token.as_deref()),
        }
    }

    pub fn has_process_token(&self) -> bool {
        self.process_token.is_some()
    }

    pub fn resolve(&self, body_token: Option<&str>, query_token: Option<&str>) -> Option<Credential> {
        self.process_token
            .clone()
            .or_else(|| Credential::from_candidate(body_token))
            .or_else(|| Credential::from_candidate(query_token))
    }
}
