//! Token Acquisition Orchestrator
//!
//! Silent-first acquisition with a single interactive fallback.
//!
//! ```text
//! account? ──no──────────────────────────────┐
//!    │yes                                    ▼
//! SILENT_ATTEMPT ──InteractionRequired──► INTERACTIVE_FALLBACK
//!    │ok            other error ─► Err        │ok / Err
//!    ▼                                        ▼
//!  token                                    token
//! ```

use std::sync::Arc;
use tracing::instrument;

use crate::error::{AuthError, SilentAuthError};
use crate::flows::{InteractiveAuthenticator, SilentAuthenticator};
use crate::types::{AccessToken, Account, ExtraConsentSet, ScopeSet};

/// How a token was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionPath {
    /// From cached material, no user interaction.
    Silent,
    /// Through the interactive sign-in.
    Interactive,
}

/// Token together with the path that produced it.
#[derive(Debug)]
pub struct AcquiredToken {
    pub token: AccessToken,
    pub path: AcquisitionPath,
}

/// Acquires tokens silently when possible and interactively otherwise.
///
/// Holds no mutable state; one orchestrator may serve concurrent callers.
pub struct TokenAcquisitionOrchestrator<S: SilentAuthenticator, I: InteractiveAuthenticator> {
    silent: Arc<S>,
    interactive: Arc<I>,
}

impl<S: SilentAuthenticator, I: InteractiveAuthenticator> Clone
    for TokenAcquisitionOrchestrator<S, I>
{
    fn clone(&self) -> Self {
        Self {
            silent: self.silent.clone(),
            interactive: self.interactive.clone(),
        }
    }
}

impl<S: SilentAuthenticator, I: InteractiveAuthenticator> TokenAcquisitionOrchestrator<S, I> {
    /// Create new orchestrator.
    pub fn new(silent: Arc<S>, interactive: Arc<I>) -> Self {
        Self {
            silent,
            interactive,
        }
    }

    /// Acquire a token for `target`.
    ///
    /// `extra` is only requested if the interactive fallback runs. Without an
    /// `account` the silent attempt is skipped.
    pub async fn acquire(
        &self,
        target: &ScopeSet,
        extra: &ExtraConsentSet,
        account: Option<&Account>,
    ) -> Result<AccessToken, AuthError> {
        self.acquire_detailed(target, extra, account)
            .await
            .map(|acquired| acquired.token)
    }

    /// Like [`acquire`](Self::acquire), also reporting the path taken.
    #[instrument(
        name = "acquire_token",
        skip_all,
        fields(scopes = %target, has_account = account.is_some())
    )]
    pub async fn acquire_detailed(
        &self,
        target: &ScopeSet,
        extra: &ExtraConsentSet,
        account: Option<&Account>,
    ) -> Result<AcquiredToken, AuthError> {
        if let Some(account) = account {
            match self.silent.acquire_silent(target, account).await {
                Ok(token) => {
                    return Ok(AcquiredToken {
                        token,
                        path: AcquisitionPath::Silent,
                    })
                }
                Err(SilentAuthError::InteractionRequired { reason }) => {
                    tracing::debug!(%reason, "Silent acquisition needs interaction, falling back");
                }
                Err(SilentAuthError::Failed(error)) => {
                    tracing::error!(error = %error, "Silent acquisition failed");
                    return Err(error);
                }
            }
        }

        let token = self
            .interactive
            .acquire_interactive(target, extra, account)
            .await?;

        Ok(AcquiredToken {
            token,
            path: AcquisitionPath::Interactive,
        })
    }
}
