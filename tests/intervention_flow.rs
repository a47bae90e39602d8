// tests/intervention_flow.rs
//
// Pause and leave workflows: the countdown resets the whole session on
// natural expiry, the leave path emits closeTab and leaves state alone.

use std::sync::Arc;
use std::time::Duration;

use mindscroll::classify::DisabledProvider;
use mindscroll::engine::{EngineConfig, EngineHandle, EngineMessage};
use mindscroll::intervention::{CountdownConfig, InterventionChoice};
use mindscroll::settings::Settings;
use mindscroll::thresholds::EvaluatorState;
use mindscroll::RawItem;

fn post(link: &str) -> RawItem {
    RawItem {
        link_token: Some(link.to_string()),
        text: Some("caption".to_string()),
        ..RawItem::default()
    }
}

fn triggered_handle() -> EngineHandle {
    let mut settings = Settings::default();
    settings.content_thresholds.posts_viewed = 2;

    let config = EngineConfig {
        countdown: CountdownConfig {
            ticks: 3,
            tick: Duration::from_millis(100),
        },
        ..EngineConfig::default()
    };
    let handle =
        EngineHandle::with_provider(settings, config, Arc::new(DisabledProvider));
    handle.observe(&[post("a"), post("b")]);
    assert_eq!(handle.state(), EvaluatorState::Triggered);
    handle
}

#[tokio::test(start_paused = true)]
async fn pause_countdown_expiry_resets_the_session() {
    let handle = triggered_handle();

    handle.choose(InterventionChoice::Pause);
    assert_eq!(handle.state(), EvaluatorState::Resolved);
    assert!(handle.countdown_active());

    // Let the 3 x 100ms countdown run out.
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(handle.state(), EvaluatorState::Idle);
    let metrics = handle.session_metrics();
    assert_eq!(metrics.posts, 0);
    assert_eq!(metrics.weighted_score, 0.0);
    assert!(!metrics.reminder_triggered);

    // A previously seen item counts as new again.
    let fresh = handle.observe(&[post("a")]);
    assert_eq!(fresh, 1);
    assert_eq!(handle.session_metrics().posts, 1);
}

#[tokio::test(start_paused = true)]
async fn leave_emits_close_tab_and_keeps_state() {
    let handle = triggered_handle();
    let mut rx = handle.subscribe();

    handle.choose(InterventionChoice::Leave);
    assert_eq!(handle.state(), EvaluatorState::Resolved);
    assert!(!handle.countdown_active());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let mut closed = false;
    while let Ok(msg) = rx.try_recv() {
        if matches!(msg, EngineMessage::CloseTab) {
            closed = true;
        }
    }
    assert!(closed, "leave path must signal closeTab");

    // No reset on the leave path; the page is abandoned, not resumed.
    assert_eq!(handle.session_metrics().posts, 2);
}

#[tokio::test(start_paused = true)]
async fn choice_outside_triggered_state_is_ignored() {
    let mut settings = Settings::default();
    settings.content_thresholds.posts_viewed = 50;
    let handle =
        EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(DisabledProvider));
    handle.observe(&[post("a")]);

    handle.choose(InterventionChoice::Pause);
    assert_eq!(handle.state(), EvaluatorState::Monitoring);
    assert!(!handle.countdown_active());
}

#[tokio::test(start_paused = true)]
async fn disabled_domain_suppresses_the_dialog_but_not_evaluation() {
    let mut settings = Settings::default();
    settings.content_thresholds.posts_viewed = 2;
    settings.sites.push(mindscroll::settings::SiteRule {
        domain: "instagram.com".into(),
        enabled: false,
    });

    let handle =
        EngineHandle::with_provider(settings, EngineConfig::default(), Arc::new(DisabledProvider));
    let mut rx = handle.subscribe();

    handle.observe(&[post("a"), post("b")]);
    assert_eq!(handle.state(), EvaluatorState::Triggered);

    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(msg) = rx.try_recv() {
        assert!(
            !matches!(msg, EngineMessage::ShowIntervention { .. }),
            "disabled domain must not surface an intervention"
        );
    }
}
