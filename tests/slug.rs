use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use marketplace_api::slug::{
    MAX_SLUG_ATTEMPTS, ensure_unique_slug, ensure_unique_slug_except, generate_excerpt,
    generate_slug,
};

fn taken(slugs: &[&str]) -> Arc<HashSet<String>> {
    Arc::new(slugs.iter().map(|s| s.to_string()).collect())
}

#[test]
fn generate_slug_is_never_empty() {
    for name in ["", "   ", "***", "你好", "Batik"] {
        assert!(!generate_slug(name, "product").is_empty(), "empty slug for {name:?}");
    }
}

#[test]
fn generate_slug_is_url_safe() {
    let slug = generate_slug("Kain Tenun & Songket (Premium) 100%", "product");
    assert_eq!(slug, "kain-tenun-and-songket-premium-100");
    assert!(
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    );
}

#[tokio::test]
async fn free_base_is_returned_as_is() -> anyhow::Result<()> {
    let existing = taken(&["other"]);
    let slug = ensure_unique_slug("batik-parang", |c| {
        let existing = existing.clone();
        async move { Ok(existing.contains(&c)) }
    })
    .await?;
    assert_eq!(slug, "batik-parang");
    Ok(())
}

#[tokio::test]
async fn first_free_counter_is_used() -> anyhow::Result<()> {
    let existing = taken(&["batik", "batik-1", "batik-2"]);
    let slug = ensure_unique_slug("batik", |c| {
        let existing = existing.clone();
        async move { Ok(existing.contains(&c)) }
    })
    .await?;
    assert_eq!(slug, "batik-3");
    Ok(())
}

#[tokio::test]
async fn exhausted_counters_fall_back_to_timestamp() -> anyhow::Result<()> {
    let calls = Arc::new(Mutex::new(0u32));
    let slug = ensure_unique_slug("batik", |_| {
        let calls = calls.clone();
        async move {
            *calls.lock().unwrap() += 1;
            Ok(true)
        }
    })
    .await?;

    assert_eq!(*calls.lock().unwrap(), MAX_SLUG_ATTEMPTS + 1);
    let suffix = slug.strip_prefix("batik-").expect("base prefix");
    assert!(suffix.len() > 3, "expected timestamp suffix, got {slug}");
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    Ok(())
}

#[tokio::test]
async fn editing_without_rename_keeps_the_slug() -> anyhow::Result<()> {
    let existing = taken(&["batik-parang", "batik-parang-1"]);
    let slug = ensure_unique_slug_except("batik-parang", "batik-parang", |c| {
        let existing = existing.clone();
        async move { Ok(existing.contains(&c)) }
    })
    .await?;
    assert_eq!(slug, "batik-parang");
    Ok(())
}

#[tokio::test]
async fn lookup_errors_propagate() {
    let result = ensure_unique_slug("batik", |_| async {
        Err(marketplace_api::error::AppError::internal("db down"))
    })
    .await;
    assert!(result.is_err());
}

#[test]
fn excerpt_cuts_on_word_boundary() {
    let text = "Batik tulis is drawn by hand with a canting";
    assert_eq!(generate_excerpt(text, 100), text);
    assert_eq!(generate_excerpt(text, 14), "Batik tulis...");
}
