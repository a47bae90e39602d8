// tests/thresholds.rs
//
// Threshold state machine end to end: simple-mode triggering, exclusivity
// of the weighted rule, and the one-intervention-per-session guarantee.

use std::sync::Arc;
use std::time::Duration;

use mindscroll::classify::DisabledProvider;
use mindscroll::engine::{EngineConfig, EngineHandle, EngineMessage};
use mindscroll::settings::Settings;
use mindscroll::thresholds::EvaluatorState;
use mindscroll::RawItem;

fn post(link: &str, text: &str) -> RawItem {
    RawItem {
        link_token: Some(link.to_string()),
        text: Some(text.to_string()),
        ..RawItem::default()
    }
}

fn handle_with(settings: Settings) -> EngineHandle {
    EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(DisabledProvider))
}

async fn settle(handle: &EngineHandle, want: EvaluatorState) -> bool {
    for _ in 0..200 {
        if handle.state() == want {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(start_paused = true)]
async fn three_posts_trigger_exactly_one_intervention() {
    let mut settings = Settings::default();
    settings.content_thresholds.posts_viewed = 3;
    settings.content_thresholds.time_spent = 9999;
    settings.advanced_features.weighted_scoring = false;

    let handle = handle_with(settings);
    let mut rx = handle.subscribe();

    handle.observe(&[post("p1", "one"), post("p2", "two")]);
    assert_eq!(handle.state(), EvaluatorState::Monitoring);

    handle.observe(&[post("p3", "three")]);
    assert_eq!(handle.state(), EvaluatorState::Triggered);

    // Re-observing and re-checking must not re-trigger or re-show.
    handle.observe(&[post("p4", "four")]);
    handle.check_reminder();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut shown = 0;
    while let Ok(msg) = rx.try_recv() {
        if matches!(msg, EngineMessage::ShowIntervention { .. }) {
            shown += 1;
        }
    }
    assert_eq!(shown, 1, "intervention must surface exactly once per session");
}

#[tokio::test(start_paused = true)]
async fn weighted_mode_does_not_trigger_on_simple_counts() {
    let mut settings = Settings::default();
    settings.content_thresholds.posts_viewed = 3;
    settings.advanced_features.weighted_scoring = true;
    settings.advanced_features.weighted_threshold = 1000.0;

    let handle = handle_with(settings);
    let items: Vec<RawItem> = (0..10).map(|i| post(&format!("p{i}"), "plain")).collect();
    handle.observe(&items);

    // Give the classification worker time to resolve every item.
    tokio::time::sleep(Duration::from_secs(30)).await;
    handle.check_reminder();
    assert_eq!(
        handle.state(),
        EvaluatorState::Monitoring,
        "10 posts over a 3-post threshold must not trigger while weighted scoring is on"
    );
}

#[tokio::test(start_paused = true)]
async fn weighted_mode_triggers_on_score() {
    let mut settings = Settings::default();
    settings.advanced_features.weighted_scoring = true;
    settings.advanced_features.weighted_threshold = 5.0;

    let handle = handle_with(settings);
    // "goals" lands in comparison (risk 2.0); post base 1.0 → 2.0 per item.
    let items: Vec<RawItem> = (0..3)
        .map(|i| post(&format!("c{i}"), "body goals honestly"))
        .collect();
    handle.observe(&items);

    assert!(
        settle(&handle, EvaluatorState::Triggered).await,
        "6.0 accumulated over a 5.0 threshold should trigger"
    );
}

#[tokio::test(start_paused = true)]
async fn scroll_depth_threshold_triggers_in_simple_mode() {
    let mut settings = Settings::default();
    settings.content_thresholds.scroll_depth = 500.0;

    let handle = handle_with(settings);
    handle.scroll(200.0);
    handle.scroll(-100.0); // upward, ignored
    handle.scroll(350.0);
    handle.check_reminder();
    assert_eq!(handle.state(), EvaluatorState::Triggered);
}
