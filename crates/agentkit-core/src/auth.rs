// SPDX-License-Identifier: MIT OR Apache-2.0
//! Credentials attached to outbound vendor requests.

use std::fmt;
use std::sync::Arc;

use agentkit_error::{AgentkitError, ErrorCode, Result};
use async_trait::async_trait;

use crate::cancel::CancelToken;

/// Source of short-lived bearer tokens.
///
/// Implementations talk to whatever identity system issues the tokens; a
/// token is requested for every outbound call.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for the next request.
    async fn token(&self, cancel: &CancelToken) -> Result<String>;
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wrap a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self, cancel: &CancelToken) -> Result<String> {
        cancel.check()?;
        Ok(self.token.clone())
    }
}

/// How a client authenticates.
#[derive(Clone)]
pub enum Credential {
    /// Long-lived API key.
    ApiKey(String),
    /// Bearer token fetched per request.
    Token(Arc<dyn TokenProvider>),
}

impl Credential {
    /// API key credential.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(key.into())
    }

    /// Token-provider credential.
    pub fn token_provider(provider: impl TokenProvider + 'static) -> Self {
        Self::Token(Arc::new(provider))
    }

    /// Resolve the secret sent with the next request.
    pub async fn secret(&self, cancel: &CancelToken) -> Result<String> {
        let secret = match self {
            Self::ApiKey(key) => key.clone(),
            Self::Token(provider) => provider.token(cancel).await?,
        };
        if secret.trim().is_empty() {
            return Err(AgentkitError::new(
                ErrorCode::ArgumentInvalid,
                "credential resolved to an empty secret",
            ));
        }
        Ok(secret)
    }

    /// Attach `Authorization: Bearer <secret>` to `request`.
    pub async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancelToken,
    ) -> Result<reqwest::RequestBuilder> {
        let secret = self.secret(cancel).await?;
        Ok(request.bearer_auth(secret))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("Credential::ApiKey(<redacted>)"),
            Self::Token(_) => f.write_str("Credential::Token(<provider>)"),
        }
    }
}
