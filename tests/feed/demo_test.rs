//! Demo fallback catalog tests.

use chrono::{DateTime, Utc};
use crossfeed::feed::demo::demo_posts;
use crossfeed::providers::ProviderId;

fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-01T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

#[test]
fn every_demo_post_is_tagged_and_context_free() {
    for provider in ProviderId::ALL {
        let posts = demo_posts(provider, "rust", fixed_now());
        assert!(!posts.is_empty());
        for post in posts {
            assert!(post.is_demo);
            assert_eq!(post.provider, provider);
            // Demo posts never carry threading data usable for posting.
            assert!(post.reply_context.is_null());
            assert_eq!(post.source_url, "#");
        }
    }
}

#[test]
fn catalog_weaves_the_query_into_every_entry() {
    let posts = demo_posts(ProviderId::Mastodon, "WebAssembly", fixed_now());
    assert!(!posts.is_empty());
    for post in posts {
        assert!(
            post.text.contains("WebAssembly"),
            "query missing from: {}",
            post.text
        );
    }
}

#[test]
fn empty_query_serves_the_full_catalog() {
    let posts = demo_posts(ProviderId::Bluesky, "", fixed_now());
    assert_eq!(posts.len(), 3);
}

#[test]
fn flavor_suffix_differs_per_provider() {
    let texts: Vec<String> = ProviderId::ALL
        .into_iter()
        .map(|p| demo_posts(p, "rust", fixed_now())[0].text.clone())
        .collect();
    for (i, a) in texts.iter().enumerate() {
        for b in texts.iter().skip(i.saturating_add(1)) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn ids_are_deterministic_and_snapshot_unique() {
    let first = demo_posts(ProviderId::Threads, "rust", fixed_now());
    let second = demo_posts(ProviderId::Threads, "rust", fixed_now());
    let ids: Vec<&str> = first.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        second.iter().map(|p| p.id.as_str()).collect::<Vec<_>>()
    );
    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[test]
fn ages_render_relative_to_the_supplied_now() {
    let posts = demo_posts(ProviderId::Mastodon, "rust", fixed_now());
    let ages: Vec<&str> = posts.iter().map(|p| p.relative_time.as_str()).collect();
    assert_eq!(ages, vec!["8m", "3h", "2d"]);
}
