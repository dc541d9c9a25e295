//! Board store integration tests.
//!
//! Caching, persistence and transactional command execution through
//! `BoardStore`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;

use cardboard::board::{BoardState, BoardStore, FileBackend, MemoryBackend, SnapshotFormat};
use cardboard::commands::{Args, CommandContext};
use cardboard::core::{BoardConfig, ErrorClass};
use cardboard::registry::{MemoryPlayerRegistry, MemoryTaskRegistry, PlayerRegistry};

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn scratch_dir(name: &str) -> std::path::PathBuf {
    let n = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("cardboard-{name}-{}-{n}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn spawn_args(def_id: &str) -> Args {
    Args::from_json(json!({ "defId": def_id, "x": 0, "y": 0 })).unwrap()
}

// =============================================================================
// Transactions
// =============================================================================

#[test]
fn test_successful_command_is_saved() {
    let store = BoardStore::new(MemoryBackend::new());
    let tasks = MemoryTaskRegistry::new();
    let players = MemoryPlayerRegistry::new();
    let config = BoardConfig::new();
    let ctx = CommandContext::new(&tasks, &players, &config);

    let patch = store.execute("home", "card.spawn", &spawn_args("villager.basic"), &ctx).unwrap();

    let board = store.load("home").unwrap();
    assert!(board.get_stack(patch.created[0]).is_some());

    store.evict("home");
    let reloaded = store.load("home").unwrap();
    assert_eq!(*reloaded, *board);
}

#[test]
fn test_failed_command_leaves_board_untouched() {
    let store = BoardStore::new(MemoryBackend::new());
    let tasks = MemoryTaskRegistry::new();
    let players = MemoryPlayerRegistry::new();
    let config = BoardConfig::new();
    let ctx = CommandContext::new(&tasks, &players, &config);

    store.execute("home", "card.spawn", &spawn_args("villager.basic"), &ctx).unwrap();
    let before = store.load("home").unwrap();

    // unknown resource stack
    let err = store
        .execute(
            "home",
            "resource.gather",
            &Args::from_json(json!({ "villagerStackId": 1, "resourceStackId": 99 })).unwrap(),
            &ctx,
        )
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::NotFound);

    let err = store.execute("home", "no.such.command", &Args::new(), &ctx).unwrap_err();
    assert_eq!(err.class(), ErrorClass::BadArgument);

    let after = store.load("home").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_boards_are_independent() {
    let store = BoardStore::new(MemoryBackend::new());
    let tasks = MemoryTaskRegistry::new();
    let players = MemoryPlayerRegistry::new();
    let config = BoardConfig::new();
    let ctx = CommandContext::new(&tasks, &players, &config);

    store.execute("a", "board.seed_default", &Args::new(), &ctx).unwrap();

    assert_eq!(store.load("a").unwrap().stack_count(), 2);
    assert!(store.load("b").unwrap().is_empty());
}

#[test]
fn test_concurrent_commands_on_one_board() {
    let store = BoardStore::new(MemoryBackend::new());
    let tasks = MemoryTaskRegistry::new();
    let players = MemoryPlayerRegistry::new();
    let config = BoardConfig::new();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let ctx = CommandContext::new(&tasks, &players, &config);
                for _ in 0..10 {
                    store
                        .execute("shared", "task.create_blank", &Args::new().with("x", 0.0).with("y", 0.0), &ctx)
                        .unwrap();
                }
            });
        }
    });

    let board = store.load("shared").unwrap();
    assert_eq!(board.stack_count(), 80);
    assert!(board.check_invariants().is_ok());
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_file_backend_round_trip() {
    for format in [SnapshotFormat::Json, SnapshotFormat::Bincode] {
        let dir = scratch_dir("round-trip");
        let tasks = MemoryTaskRegistry::new();
        let players = MemoryPlayerRegistry::new();
        let config = BoardConfig::new();
        let ctx = CommandContext::new(&tasks, &players, &config);

        let saved = {
            let store = BoardStore::new(FileBackend::new(&dir, format));
            store.execute("home", "board.seed_default", &Args::new(), &ctx).unwrap();
            store
                .execute(
                    "home",
                    "card.spawn",
                    &Args::from_json(json!({
                        "defId": "loot.coin", "x": 5, "y": 6, "data": { "amount": 4, "note": "tip" }
                    }))
                    .unwrap(),
                    &ctx,
                )
                .unwrap();
            store.load("home").unwrap()
        };

        let store = BoardStore::new(FileBackend::new(&dir, format));
        let loaded = store.load("home").unwrap();
        assert_eq!(*loaded, *saved, "{format:?}");

        // ids keep counting after a reload
        let patch = store.execute("home", "card.spawn", &spawn_args("food.berry"), &ctx).unwrap();
        assert!(saved.get_stack(patch.created[0]).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}

#[test]
fn test_file_backend_rejects_unsafe_ids() {
    let dir = scratch_dir("unsafe");
    let backend = FileBackend::new(&dir, SnapshotFormat::Json);

    assert!(backend.path_for("board_1-a").is_ok());
    for id in ["", "../escape", "a/b", "dot.json"] {
        let err = backend.path_for(id).unwrap_err();
        assert_eq!(err.class(), ErrorClass::BadArgument, "{id:?}");
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_snapshot_shape() {
    let tasks = MemoryTaskRegistry::new();
    let players = MemoryPlayerRegistry::new().with_loot("coin", 1);
    let config = BoardConfig::new();
    let ctx = CommandContext::new(&tasks, &players, &config);
    let mut board = BoardState::new();
    cardboard::dispatch(&mut board, "board.seed_default", &Args::new(), &ctx).unwrap();

    let value = serde_json::to_value(&board).unwrap();
    assert!(value["stacks"].is_object());
    assert!(value["cards"].is_object());
    assert_eq!(value["zCounter"], 2);

    let back: BoardState = serde_json::from_value(value).unwrap();
    assert_eq!(back, board);
    assert_eq!(players.wallet().loot("coin"), 1);
}
