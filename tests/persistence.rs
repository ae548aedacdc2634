//! Snapshot files: save, load and warm-start training.

use std::fs;
use std::path::PathBuf;

use approx::assert_abs_diff_eq;

use cfr_plus::cfr::{
    hash_key, load_stats, load_store, save_stats, save_store, CfrConfig, CfrError, CfrPlus, InfoSetStore, Snapshot,
};
use cfr_plus::games::kuhn::KuhnNode;
use cfr_plus::games::tictactoe::{Board, SymmetricNode};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cfr-plus-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn trained_kuhn(iterations: u64) -> CfrPlus<KuhnNode> {
    let mut solver: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), CfrConfig::default()).unwrap();
    solver.train(iterations).unwrap();
    solver
}

fn assert_close(a: &[f64], b: &[f64], epsilon: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!(*x, *y, epsilon = epsilon);
    }
}

#[test]
fn store_survives_a_file_round_trip() {
    let dir = scratch_dir("round-trip");
    let (regret, strategy) = (dir.join("regret.json"), dir.join("strategy.json"));

    let solver = trained_kuhn(200);
    save_store(solver.store(), &regret, &strategy).unwrap();
    let loaded: InfoSetStore<String> = load_store(&regret, &strategy).unwrap();

    assert_eq!(loaded.len(), solver.store().len());
    for (key, info_set) in solver.store().iter() {
        let restored = loaded.get(key).unwrap();
        assert_close(restored.regret_sum(), info_set.regret_sum(), 1e-12);
        assert_close(restored.cumulative_strategy(), info_set.cumulative_strategy(), 1e-12);
        assert_close(restored.current_strategy(), info_set.current_strategy(), 1e-12);
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn multiline_keys_are_preserved() {
    let dir = scratch_dir("multiline");
    let (regret, strategy) = (dir.join("regret.json"), dir.join("strategy.json"));

    let mut solver: CfrPlus<SymmetricNode> = CfrPlus::new(SymmetricNode::new(), CfrConfig::default()).unwrap();
    solver.train(3).unwrap();
    save_store(solver.store(), &regret, &strategy).unwrap();

    let snapshot = Snapshot::load(&regret).unwrap();
    assert_eq!(snapshot.len(), 627);
    assert!(snapshot.get(". . .\n. . .\n. . .").is_some());

    let loaded: InfoSetStore<String> = load_store(&regret, &strategy).unwrap();
    assert_eq!(loaded.keys(), solver.store().keys());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn warm_start_continues_training() {
    let dir = scratch_dir("warm-start");
    let (regret, strategy) = (dir.join("regret.json"), dir.join("strategy.json"));

    let first = trained_kuhn(150);
    save_store(first.store(), &regret, &strategy).unwrap();

    let store: InfoSetStore<String> = load_store(&regret, &strategy).unwrap();
    let mut resumed: CfrPlus<KuhnNode> = CfrPlus::with_store(KuhnNode::root(), CfrConfig::default(), store).unwrap();
    assert_eq!(resumed.store().len(), 12);
    resumed.train(150).unwrap();

    let uninterrupted = trained_kuhn(300);
    for key in uninterrupted.store().keys() {
        assert_close(
            &uninterrupted.average_strategy(&key).unwrap(),
            &resumed.average_strategy(&key).unwrap(),
            1e-6,
        );
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn string_snapshots_load_into_hashed_store() {
    let dir = scratch_dir("hashed");
    let (regret, strategy) = (dir.join("regret.json"), dir.join("strategy.json"));

    let solver = trained_kuhn(200);
    save_store(solver.store(), &regret, &strategy).unwrap();

    let store: InfoSetStore<u64> = load_store(&regret, &strategy).unwrap();
    let hashed: CfrPlus<KuhnNode, u64> =
        CfrPlus::with_store(KuhnNode::root(), CfrConfig::default(), store).unwrap();

    // Every key was found, nothing new was discovered
    assert_eq!(hashed.store().len(), 12);
    assert_close(
        &hashed.average_strategy(&hash_key("2:b")).unwrap(),
        &solver.average_strategy(&"2:b".to_string()).unwrap(),
        1e-12,
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn board_snapshots_change_encoding_through_the_tree() {
    let dir = scratch_dir("board-keys");
    let (regret, strategy) = (dir.join("regret.json"), dir.join("strategy.json"));

    let mut solver: CfrPlus<SymmetricNode> = CfrPlus::new(SymmetricNode::new(), CfrConfig::default()).unwrap();
    solver.train(5).unwrap();
    save_store(solver.store(), &regret, &strategy).unwrap();

    // Board text does not hash to the numeric board key
    let by_text: InfoSetStore<u64> = load_store(&regret, &strategy).unwrap();
    let result = CfrPlus::<SymmetricNode, u64>::with_store(SymmetricNode::new(), CfrConfig::default(), by_text);
    assert!(matches!(result, Err(CfrError::UnreachableInfoSet(_))));

    let exact: InfoSetStore<String> = load_store(&regret, &strategy).unwrap();
    let by_tree: InfoSetStore<u64> = exact.rekey_with(&SymmetricNode::new()).unwrap();
    let hashed = CfrPlus::<SymmetricNode, u64>::with_store(SymmetricNode::new(), CfrConfig::default(), by_tree).unwrap();
    assert_eq!(hashed.store().len(), 627);
    assert_close(
        &hashed.average_strategy(&Board::new().numeric_key()).unwrap(),
        &solver.average_strategy(&". . .\n. . .\n. . .".to_string()).unwrap(),
        1e-12,
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn resumed_run_keeps_its_iteration_count() {
    let dir = scratch_dir("resume-delay");
    let (regret, strategy, stats) = (dir.join("regret.json"), dir.join("strategy.json"), dir.join("stats.json"));
    let config = CfrConfig::default().with_strategy_delay(100);

    let mut first: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), config.clone()).unwrap();
    first.train(150).unwrap();
    save_store(first.store(), &regret, &strategy).unwrap();
    save_stats(first.stats(), &stats).unwrap();

    let store: InfoSetStore<String> = load_store(&regret, &strategy).unwrap();
    let mut resumed: CfrPlus<KuhnNode> = CfrPlus::with_store(KuhnNode::root(), config.clone(), store).unwrap();
    resumed.set_iteration(load_stats(&stats).unwrap().iterations);
    resumed.train(150).unwrap();
    assert_eq!(resumed.iteration(), 300);

    // The delay was spent in the first run and is not applied again
    let mut uninterrupted: CfrPlus<KuhnNode> = CfrPlus::new(KuhnNode::root(), config).unwrap();
    uninterrupted.train(300).unwrap();
    for key in uninterrupted.store().keys() {
        assert_close(
            &uninterrupted.average_strategy(&key).unwrap(),
            &resumed.average_strategy(&key).unwrap(),
            1e-6,
        );
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_snapshot_is_an_error() {
    let dir = scratch_dir("missing");
    let result: Result<InfoSetStore<String>, _> = load_store(dir.join("nope.json"), dir.join("nope.json"));
    assert!(result.is_err());
    fs::remove_dir_all(&dir).unwrap();
}
