use storage::{InMemoryStore, KeyValueStore, PROGRESS_KEY};

use super::test_harness::setup_view_harness;

#[tokio::test(flavor = "current_thread")]
async fn fresh_game_renders_start_screen() {
    let mut harness = setup_view_harness(InMemoryStore::new());
    harness.rebuild();
    let html = harness.render();

    assert!(html.contains("Start the game"), "missing start button in {html}");
    assert!(html.contains(r#"role="button""#), "missing button role in {html}");
    assert!(html.contains(r#"tabindex="0""#), "missing tabindex in {html}");
    assert!(html.contains("task-item--8"), "missing task items in {html}");
    assert!(!html.contains("is yours!"), "no panel rendered yet in {html}");
}

#[tokio::test(flavor = "current_thread")]
async fn persisted_progress_renders_reward_panel() {
    let store = InMemoryStore::new();
    store
        .set(
            PROGRESS_KEY,
            r#"{"currentScreen":"task","currentTaskId":"biohacking","completed":{"ai":true,"antifragility":true}}"#,
        )
        .unwrap();

    let mut harness = setup_view_harness(store);
    harness.rebuild();
    harness.drive_async().await;
    let html = harness.render();

    assert!(html.contains("Superpower 2/8 is yours!"), "missing title in {html}");
    assert!(html.contains("Biohacking"), "missing task label in {html}");
    assert!(html.contains("Collected: 2"), "missing map counter in {html}");
    assert!(html.contains("is-collected"), "missing collected marker in {html}");
    assert_eq!(harness.store.len(), 1);
}
