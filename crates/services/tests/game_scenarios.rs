use std::sync::Arc;
use std::time::Duration;

use quest_core::MotionMode;
use quest_core::model::{GameLayout, PanelMarkup, ScreenId, TaskId};
use services::{ElementKey, Game, GameConfig, NavigationError, PanelId, Target};
use storage::{InMemoryStore, KeyValueStore, PROGRESS_KEY};

fn task(id: &str) -> TaskId {
    TaskId::new(id).unwrap()
}

fn boot(backend: &InMemoryStore, mode: MotionMode) -> Game {
    let mut game = Game::new(
        &GameConfig::new(mode),
        GameLayout::standard(),
        Arc::new(backend.clone()),
    );
    game.boot();
    game
}

fn boot_shared(backend: &InMemoryStore, mode: MotionMode) -> Game {
    let mut draft = GameLayout::standard().to_draft();
    for task in &mut draft.tasks {
        task.result = None;
    }
    draft.shared_result = Some(PanelMarkup::complete());
    let mut game = Game::new(
        &GameConfig::new(mode),
        draft.validate().unwrap(),
        Arc::new(backend.clone()),
    );
    game.boot();
    game
}

fn run_until_idle(game: &mut Game) {
    for _ in 0..200 {
        if !game.is_animating() {
            return;
        }
        game.tick(Duration::from_millis(50));
    }
    panic!("game never settled");
}

fn opacity(game: &Game, key: &ElementKey) -> f32 {
    game.stage().visual(key).unwrap().opacity
}

fn segment(game: &Game, panel: &PanelId, index: u32) -> f32 {
    opacity(game, &ElementKey::Segment(panel.clone(), index))
}

fn persisted(backend: &InMemoryStore) -> serde_json::Value {
    let raw = backend.get(PROGRESS_KEY).unwrap().expect("record saved");
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn fresh_load_renders_an_empty_indicator() {
    let backend = InMemoryStore::new();
    let mut game = boot(&backend, MotionMode::Animated);
    assert_eq!(game.completed_count(), 0);
    assert_eq!(game.active_screen(), Some(ScreenId::start()));

    game.open_task(&task("ai")).unwrap();
    let panel = PanelId::Own(task("ai"));
    assert_eq!(game.stage().title(&panel), Some("0/8"));
    for index in 1..=8 {
        assert!((segment(&game, &panel, index) - 0.2).abs() < f32::EPSILON);
    }
}

#[test]
fn first_award_persists_and_highlights_segment_one() {
    let backend = InMemoryStore::new();
    let mut game = boot(&backend, MotionMode::Animated);
    game.open_task(&task("ai")).unwrap();
    run_until_idle(&mut game);

    let panel = PanelId::Own(task("ai"));
    let collect = game.collect_target(&panel);
    assert!(game.activate(&collect));
    assert!(!game.activate(&collect), "collect fires once per rendering");

    assert_eq!(game.completed_count(), 1);
    assert_eq!(persisted(&backend)["completed"], serde_json::json!({ "ai": true }));
    // The indicator still shows the old count while the panel swaps.
    assert_eq!(game.stage().title(&panel), Some("0/8"));

    game.tick(Duration::from_millis(400));
    let ready = game.stage().visual(&ElementKey::Ready(panel.clone())).unwrap();
    assert!(!ready.hidden);
    assert!(game.stage().visual(&ElementKey::Collect(panel.clone())).unwrap().hidden);

    game.tick(Duration::from_millis(700));
    assert_eq!(game.stage().title(&panel), Some("1/8"));
    assert!(segment(&game, &panel, 1) < 1.0, "segment 1 fades in");

    run_until_idle(&mut game);
    assert!((segment(&game, &panel, 1) - 1.0).abs() < f32::EPSILON);
    assert!((segment(&game, &panel, 2) - 0.2).abs() < f32::EPSILON);
    assert!((opacity(&game, &ElementKey::Ready(panel.clone())) - 1.0).abs() < f32::EPSILON);
}

#[test]
fn reload_restores_task_screen_and_indicator() {
    let backend = InMemoryStore::new();
    backend
        .set(
            PROGRESS_KEY,
            r#"{"currentScreen":"task","currentTaskId":"biohacking","completed":{"ai":true,"antifragility":true}}"#,
        )
        .unwrap();

    for mode in [MotionMode::Instant, MotionMode::Animated] {
        let mut game = boot(&backend, mode);
        run_until_idle(&mut game);

        assert_eq!(game.active_screen(), Some(ScreenId::task()));
        assert_eq!(game.active_task(), Some(task("biohacking")));
        let panel = PanelId::Own(task("biohacking"));
        assert_eq!(game.stage().title(&panel), Some("2/8"));
        assert!((segment(&game, &panel, 1) - 1.0).abs() < f32::EPSILON);
        assert!((segment(&game, &panel, 2) - 1.0).abs() < f32::EPSILON);
        assert!((segment(&game, &panel, 3) - 0.2).abs() < f32::EPSILON);

        let item = |id: &str| game.stage().visual(&ElementKey::TaskItem(task(id))).unwrap();
        assert!(item("biohacking").active);
        assert!(item("ai").marked);
        assert!(!item("biohacking").marked);
    }
}

#[test]
fn unknown_screen_changes_nothing() {
    let backend = InMemoryStore::new();
    let mut game = boot(&backend, MotionMode::Animated);
    game.activate(&Target::StartButton);
    run_until_idle(&mut game);

    let before: Vec<_> = game
        .layout()
        .screens()
        .iter()
        .map(|id| game.stage().visual(&ElementKey::Screen(id.clone())))
        .collect();
    let record = backend.get(PROGRESS_KEY).unwrap();
    let scrolls = game.stage().scroll_resets();

    let missing = ScreenId::new("nonexistent").unwrap();
    assert_eq!(
        game.show_screen(&missing),
        Err(NavigationError::UnknownScreen(missing.clone()))
    );

    let after: Vec<_> = game
        .layout()
        .screens()
        .iter()
        .map(|id| game.stage().visual(&ElementKey::Screen(id.clone())))
        .collect();
    assert_eq!(before, after);
    assert_eq!(backend.get(PROGRESS_KEY).unwrap(), record);
    assert_eq!(game.stage().scroll_resets(), scrolls);
    assert!(!game.is_animating());
    assert_eq!(game.progress().current_screen(), &ScreenId::maps());
}

#[test]
fn second_award_is_a_no_op() {
    let backend = InMemoryStore::new();
    let mut game = boot(&backend, MotionMode::Animated);
    game.open_task(&task("ai")).unwrap();
    game.award(&task("ai")).unwrap();
    run_until_idle(&mut game);
    let record = backend.get(PROGRESS_KEY).unwrap();

    game.award(&task("ai")).unwrap();
    let panel = PanelId::Own(task("ai"));
    assert_eq!(game.stage().title(&panel), Some("1/8"));
    assert_eq!(game.completed_count(), 1);
    assert_eq!(backend.get(PROGRESS_KEY).unwrap(), record);

    // A highlight would have dimmed segment 1 again after the delay.
    game.tick(Duration::from_millis(1050));
    assert!((segment(&game, &panel, 1) - 1.0).abs() < f32::EPSILON);
    run_until_idle(&mut game);
    assert_eq!(game.stage().title(&panel), Some("1/8"));
}

#[test]
fn instant_mode_swaps_immediately_and_keeps_the_delay() {
    let backend = InMemoryStore::new();
    let mut game = boot(&backend, MotionMode::Instant);
    game.open_task(&task("growth-mindset")).unwrap();
    assert!(!game.is_animating());

    let panel = PanelId::Own(task("growth-mindset"));
    let collect = game.collect_target(&panel);
    assert!(game.activate(&collect));
    assert!(game.stage().visual(&ElementKey::Collect(panel.clone())).unwrap().hidden);
    assert!(!game.stage().visual(&ElementKey::Ready(panel.clone())).unwrap().hidden);
    assert_eq!(game.stage().title(&panel), Some("0/8"));

    game.tick(Duration::from_millis(999));
    assert_eq!(game.stage().title(&panel), Some("0/8"));
    game.tick(Duration::from_millis(1));
    assert_eq!(game.stage().title(&panel), Some("1/8"));
    assert!((segment(&game, &panel, 1) - 1.0).abs() < f32::EPSILON);
}

#[test]
fn completion_survives_navigation_and_reload() {
    let backend = InMemoryStore::new();
    {
        let mut game = boot(&backend, MotionMode::Instant);
        game.open_task(&task("ai")).unwrap();
        game.award(&task("ai")).unwrap();
        game.activate(&Target::BackButton);
        game.open_task(&task("biohacking")).unwrap();
        game.activate(&Target::ResultBack(PanelId::Own(task("biohacking"))));
        assert_eq!(game.active_screen(), Some(ScreenId::maps()));
    }

    let mut game = boot(&backend, MotionMode::Instant);
    assert_eq!(game.active_screen(), Some(ScreenId::maps()));
    assert!(game.progress().is_completed(&task("ai")));
    assert_eq!(game.completed_count(), 1);

    game.open_task(&task("ai")).unwrap();
    let panel = PanelId::Own(task("ai"));
    assert!(game.stage().visual(&ElementKey::Collect(panel.clone())).unwrap().hidden);
    assert!(!game.stage().visual(&ElementKey::Ready(panel)).unwrap().hidden);
    assert_eq!(game.completed_count(), 1);
}

#[test]
fn rejected_writes_do_not_break_the_game() {
    let backend = InMemoryStore::with_quota(8);
    let mut game = boot(&backend, MotionMode::Instant);
    game.open_task(&task("ai")).unwrap();
    game.award(&task("ai")).unwrap();

    assert_eq!(game.completed_count(), 1);
    assert_eq!(game.active_screen(), Some(ScreenId::task()));
    assert!(backend.is_empty());
}

#[test]
fn unregistered_persisted_screen_falls_back_to_start() {
    let backend = InMemoryStore::new();
    backend
        .set(PROGRESS_KEY, r#"{"currentScreen":"bonus","completed":{}}"#)
        .unwrap();
    let game = boot(&backend, MotionMode::Instant);
    assert_eq!(game.active_screen(), Some(ScreenId::start()));
}

#[test]
fn switching_tasks_mid_reward_gives_the_next_task_a_fresh_collect() {
    let backend = InMemoryStore::new();
    let mut game = boot_shared(&backend, MotionMode::Animated);
    let panel = PanelId::Shared;
    game.open_task(&task("ai")).unwrap();
    run_until_idle(&mut game);

    let collect = game.collect_target(&panel);
    assert!(game.activate(&collect));
    game.tick(Duration::from_millis(100));
    assert!(opacity(&game, &ElementKey::Collect(panel.clone())) < 1.0, "collect is fading out");

    game.open_task(&task("biohacking")).unwrap();
    game.tick(Duration::from_secs(3));

    assert_eq!(game.stage().panel_host(&panel), Some(&task("biohacking")));
    assert!(!game.progress().is_completed(&task("biohacking")));
    let shown = game.stage().visual(&ElementKey::Collect(panel.clone())).unwrap();
    assert!(!shown.hidden);
    assert!((shown.opacity - 1.0).abs() < f32::EPSILON);
    assert!((shown.scale - 1.0).abs() < f32::EPSILON);
    assert!(game.stage().visual(&ElementKey::Ready(panel.clone())).unwrap().hidden);
    assert!((opacity(&game, &ElementKey::Title(panel.clone())) - 1.0).abs() < f32::EPSILON);
    assert_eq!(game.stage().title(&panel), Some("1/8"));
    assert!((segment(&game, &panel, 1) - 1.0).abs() < f32::EPSILON);

    let fresh = game.collect_target(&panel);
    assert_ne!(fresh, collect);
    assert!(game.activation().is_live(&fresh));
    assert!(game.activate(&fresh));
    run_until_idle(&mut game);
    assert_eq!(game.completed_count(), 2);
    assert_eq!(game.stage().title(&panel), Some("2/8"));
    assert!(game.stage().visual(&ElementKey::Collect(panel.clone())).unwrap().hidden);
    assert!((opacity(&game, &ElementKey::Ready(panel)) - 1.0).abs() < f32::EPSILON);
}
