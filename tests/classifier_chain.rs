// tests/classifier_chain.rs
//
// The layered classifier through the public engine surface: keyword-only
// degraded mode, the accepted AI path, and the confidence gate falling
// through to keywords.

use std::sync::Arc;
use std::time::Duration;

use mindscroll::classify::{DisabledProvider, MockProvider, ZeroShotResult};
use mindscroll::engine::{EngineConfig, EngineHandle};
use mindscroll::settings::Settings;
use mindscroll::RawItem;

fn item(link: &str, text: &str) -> RawItem {
    RawItem {
        link_token: Some(link.to_string()),
        text: Some(text.to_string()),
        media_ref: Some("img://1".to_string()),
        ..RawItem::default()
    }
}

async fn category_count(handle: &EngineHandle, name: &str) -> usize {
    handle
        .counts()
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.count)
        .unwrap_or(0)
}

async fn wait_for_count(handle: &EngineHandle, name: &str, want: usize) -> bool {
    for _ in 0..200 {
        if category_count(handle, name).await == want {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(start_paused = true)]
async fn no_credential_falls_back_to_keywords_deterministically() {
    // No api token: the chain must resolve locally every time.
    let handle = EngineHandle::with_provider(
        Settings::default(),
        EngineConfig::default(),
        Arc::new(DisabledProvider),
    );

    handle.observe(&[item("p1", "perfect outfit today, love this dress")]);
    assert!(wait_for_count(&handle, "fashion", 1).await);

    handle.observe(&[item("p2", "perfect outfit today, love this dress")]);
    assert!(wait_for_count(&handle, "fashion", 2).await);
}

#[tokio::test(start_paused = true)]
async fn confident_ai_result_wins_over_keywords() {
    let mut settings = Settings::default();
    settings.api_token = Some("token".into());

    // Caption + zero-shot say travel even though the caption text says
    // nothing matchable.
    let provider = MockProvider {
        caption: Some("a beach at sunset".into()),
        result: Some(ZeroShotResult {
            labels: vec!["travel".into(), "food".into()],
            scores: vec![0.91, 0.04],
        }),
    };
    let handle =
        EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(provider));

    handle.observe(&[item("p1", "what a day")]);
    assert!(wait_for_count(&handle, "travel", 1).await);
    assert_eq!(category_count(&handle, "other").await, 0);
}

#[tokio::test(start_paused = true)]
async fn sub_threshold_confidence_falls_through_to_keywords() {
    let mut settings = Settings::default();
    settings.api_token = Some("token".into());

    let provider = MockProvider {
        caption: None,
        result: Some(ZeroShotResult {
            labels: vec!["travel".into()],
            scores: vec![0.12],
        }),
    };
    let handle =
        EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(provider));

    handle.observe(&[item("p1", "leg day at the gym")]);
    assert!(wait_for_count(&handle, "fitness", 1).await);
    assert_eq!(category_count(&handle, "travel").await, 0);
}

#[tokio::test(start_paused = true)]
async fn text_analysis_flag_disables_the_ai_path() {
    let mut settings = Settings::default();
    settings.api_token = Some("token".into());
    settings.advanced_features.text_analysis = false;

    // Provider would say travel, but the flag keeps it out of the chain.
    let provider = MockProvider {
        caption: None,
        result: Some(ZeroShotResult {
            labels: vec!["travel".into()],
            scores: vec![0.99],
        }),
    };
    let handle =
        EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(provider));

    handle.observe(&[item("p1", "brunch with the girls")]);
    assert!(wait_for_count(&handle, "food", 1).await);
    assert_eq!(category_count(&handle, "travel").await, 0);
}
