//! Provider capability contract tests over an in-memory vault.

use std::collections::BTreeMap;
use std::sync::Arc;

use crossfeed::credentials::{CredentialVault, ProviderCredentials};
use crossfeed::providers::bluesky::BlueskyProvider;
use crossfeed::providers::linkedin::LinkedinProvider;
use crossfeed::providers::mastodon::MastodonProvider;
use crossfeed::providers::threads::ThreadsProvider;
use crossfeed::providers::{ProviderError, ProviderId, PublishContent, SocialProvider};
use crossfeed::settings::MemorySettings;

fn empty_vault() -> Arc<CredentialVault> {
    Arc::new(CredentialVault::empty(Arc::new(MemorySettings::new())))
}

fn creds(pairs: &[(&str, &str)]) -> ProviderCredentials {
    ProviderCredentials::from_map(
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn all_adapters(vault: &Arc<CredentialVault>) -> Vec<Arc<dyn SocialProvider>> {
    vec![
        Arc::new(MastodonProvider::new(Arc::clone(vault))),
        Arc::new(BlueskyProvider::new(Arc::clone(vault))),
        Arc::new(LinkedinProvider::new(Arc::clone(vault))),
        Arc::new(ThreadsProvider::new(Arc::clone(vault))),
    ]
}

#[test]
fn adapters_report_their_provider_ids() {
    let vault = empty_vault();
    let ids: Vec<ProviderId> = all_adapters(&vault).iter().map(|a| a.id()).collect();
    assert_eq!(ids, ProviderId::ALL);
}

#[test]
fn unconfigured_adapters_report_unconfigured_without_io() {
    let vault = empty_vault();
    for adapter in all_adapters(&vault) {
        // Pure check, and stable across repeated calls.
        assert!(!adapter.is_configured(), "{} should be unconfigured", adapter.id());
        assert!(!adapter.is_configured());
    }
}

#[tokio::test]
async fn unconfigured_search_fails_before_any_network_call() {
    let vault = empty_vault();
    for adapter in all_adapters(&vault) {
        match adapter.search("anything").await {
            Err(ProviderError::Unconfigured { provider }) => assert_eq!(provider, adapter.id()),
            other => panic!("expected Unconfigured for {}, got {other:?}", adapter.id()),
        }
    }
}

#[tokio::test]
async fn unconfigured_publish_reports_failure_inside_outcome() {
    let vault = empty_vault();
    for adapter in all_adapters(&vault) {
        let outcome = adapter
            .publish(&PublishContent {
                text: "hello".to_owned(),
                attachment_url: None,
                reply_context: None,
            })
            .await;
        assert!(!outcome.ok);
        let error = outcome.error.expect("error message");
        assert!(error.contains("not configured"), "unexpected error: {error}");
    }
}

#[test]
fn configuring_credentials_flips_is_configured() {
    let vault = empty_vault();
    let mastodon = MastodonProvider::new(Arc::clone(&vault));
    assert!(!mastodon.is_configured());

    vault.store(
        ProviderId::Mastodon,
        creds(&[("access_token", "token-123")]),
    );
    assert!(mastodon.is_configured());

    let bluesky = BlueskyProvider::new(Arc::clone(&vault));
    vault.store(ProviderId::Bluesky, creds(&[("identifier", "alice.bsky.social")]));
    // Partial credentials are still unconfigured.
    assert!(!bluesky.is_configured());
    vault.store(
        ProviderId::Bluesky,
        creds(&[
            ("identifier", "alice.bsky.social"),
            ("app_password", "app-pass"),
        ]),
    );
    assert!(bluesky.is_configured());
}

#[test]
fn blank_credential_values_do_not_configure() {
    let vault = empty_vault();
    vault.store(ProviderId::Threads, creds(&[("access_token", "  "), ("user_id", "1")]));
    let threads = ThreadsProvider::new(Arc::clone(&vault));
    assert!(!threads.is_configured());
}

#[test]
fn provider_error_display_carries_status() {
    let err = ProviderError::Transport {
        provider: ProviderId::Threads,
        status: Some(403),
        reason: "permission denied".to_owned(),
    };
    let rendered = err.to_string();
    assert!(rendered.contains("403"), "missing status in: {rendered}");
    assert!(rendered.contains("threads"));
}
