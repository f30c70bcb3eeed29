//! Orchestrator state machine tests with expectation-based mocks.

use async_trait::async_trait;
use consolidated_consent::{
    AccessToken, Account, AcquisitionPath, AuthError, ExtraConsentSet, HttpError,
    InteractionReason, InteractiveAuthenticator, ScopeSet, SilentAuthError, SilentAuthenticator,
    TokenAcquisitionOrchestrator,
};
use mockall::mock;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

mock! {
    pub Silent {}

    #[async_trait]
    impl SilentAuthenticator for Silent {
        async fn acquire_silent(
            &self,
            scopes: &ScopeSet,
            account: &Account,
        ) -> Result<AccessToken, SilentAuthError>;
    }
}

mock! {
    pub Interactive {}

    #[async_trait]
    impl InteractiveAuthenticator for Interactive {
        async fn acquire_interactive<'a, 'b, 'c, 'd>(
            &'a self,
            scopes: &'b ScopeSet,
            extra: &'c ExtraConsentSet,
            account_hint: Option<&'d Account>,
        ) -> Result<AccessToken, AuthError>;
    }
}

fn read_scope() -> ScopeSet {
    ScopeSet::single("A/read").unwrap()
}

fn manage_consent() -> ExtraConsentSet {
    ExtraConsentSet::new(["B/manage"])
}

fn orchestrator(
    silent: MockSilent,
    interactive: MockInteractive,
) -> TokenAcquisitionOrchestrator<MockSilent, MockInteractive> {
    TokenAcquisitionOrchestrator::new(Arc::new(silent), Arc::new(interactive))
}

#[tokio::test]
async fn no_account_prompts_once_with_consolidated_scopes() {
    let mut silent = MockSilent::new();
    silent.expect_acquire_silent().never();

    let mut interactive = MockInteractive::new();
    interactive
        .expect_acquire_interactive()
        .times(1)
        .withf(|scopes, extra, hint| {
            *scopes == read_scope() && *extra == manage_consent() && hint.is_none()
        })
        .returning(|scopes, _, _| Ok(AccessToken::bearer("T1", scopes.clone())));

    let acquired = assert_ok!(
        orchestrator(silent, interactive)
            .acquire_detailed(&read_scope(), &manage_consent(), None)
            .await
    );
    assert_eq!(acquired.token.secret(), "T1");
    assert_eq!(acquired.path, AcquisitionPath::Interactive);
}

#[tokio::test]
async fn silent_success_never_prompts() {
    let mut silent = MockSilent::new();
    silent
        .expect_acquire_silent()
        .times(1)
        .withf(|scopes, account| *scopes == read_scope() && account.home_account_id == "acct1")
        .returning(|scopes, _| Ok(AccessToken::bearer("T", scopes.clone())));

    let mut interactive = MockInteractive::new();
    interactive.expect_acquire_interactive().never();

    let token = assert_ok!(
        orchestrator(silent, interactive)
            .acquire(&read_scope(), &manage_consent(), Some(&Account::new("acct1")))
            .await
    );
    assert_eq!(token.secret(), "T");
}

#[tokio::test]
async fn interaction_required_falls_back_with_same_account() {
    let mut silent = MockSilent::new();
    silent.expect_acquire_silent().times(1).returning(|_, _| {
        Err(SilentAuthError::interaction_required(
            InteractionReason::ConsentRequired,
        ))
    });

    let mut interactive = MockInteractive::new();
    interactive
        .expect_acquire_interactive()
        .times(1)
        .withf(|scopes, extra, hint| {
            *scopes == read_scope()
                && *extra == manage_consent()
                && hint.map(|a| a.home_account_id.as_str()) == Some("acct1")
        })
        .returning(|scopes, _, _| Ok(AccessToken::bearer("T2", scopes.clone())));

    let acquired = assert_ok!(
        orchestrator(silent, interactive)
            .acquire_detailed(&read_scope(), &manage_consent(), Some(&Account::new("acct1")))
            .await
    );
    assert_eq!(acquired.token.secret(), "T2");
    assert_eq!(acquired.path, AcquisitionPath::Interactive);
}

#[tokio::test]
async fn every_interaction_reason_is_recoverable() {
    for reason in [
        InteractionReason::NoCachedMaterial,
        InteractionReason::ConsentRequired,
        InteractionReason::LoginRequired,
        InteractionReason::InvalidGrant,
    ] {
        let mut silent = MockSilent::new();
        silent
            .expect_acquire_silent()
            .times(1)
            .returning(move |_, _| Err(SilentAuthError::interaction_required(reason)));
        let mut interactive = MockInteractive::new();
        interactive
            .expect_acquire_interactive()
            .times(1)
            .returning(|scopes, _, _| Ok(AccessToken::bearer("T", scopes.clone())));

        assert_ok!(
            orchestrator(silent, interactive)
                .acquire(&read_scope(), &ExtraConsentSet::none(), Some(&Account::new("a")))
                .await
        );
    }
}

#[tokio::test]
async fn other_silent_failure_is_surfaced_without_prompt() {
    let mut silent = MockSilent::new();
    silent.expect_acquire_silent().times(1).returning(|_, _| {
        Err(SilentAuthError::Failed(AuthError::Transport(
            HttpError::ConnectionFailed {
                message: "network down".to_string(),
            },
        )))
    });

    let mut interactive = MockInteractive::new();
    interactive.expect_acquire_interactive().never();

    let error = assert_err!(
        orchestrator(silent, interactive)
            .acquire(&read_scope(), &manage_consent(), Some(&Account::new("acct1")))
            .await
    );
    assert!(matches!(
        error,
        AuthError::Transport(HttpError::ConnectionFailed { .. })
    ));
}

#[tokio::test]
async fn interactive_failure_is_surfaced_verbatim() {
    let silent = MockSilent::new();
    let mut interactive = MockInteractive::new();
    interactive
        .expect_acquire_interactive()
        .times(1)
        .returning(|_, _, _| {
            Err(AuthError::AccessDenied {
                error_description: Some("user declined".to_string()),
            })
        });

    let error = assert_err!(
        orchestrator(silent, interactive)
            .acquire(&read_scope(), &manage_consent(), None)
            .await
    );
    match error {
        AuthError::AccessDenied { error_description } => {
            assert_eq!(error_description.as_deref(), Some("user declined"))
        }
        other => panic!("unexpected {other:?}"),
    }
}
