use anyhow::Result;
use std::fs;
use tempdir::TempDir;
use tsc::{run_idqn, run_ours, RunConfig, Task};

fn short_run(out_dir: &TempDir) -> RunConfig {
    RunConfig {
        rows: 2,
        cols: 2,
        block_num: 3,
        seconds: 50,
        episodes: 2,
        seed: vec![1, 2],
        out_dir: out_dir.path().to_path_buf(),
        ..RunConfig::default()
    }
}

#[test]
fn ours_writes_checkpoints_and_results() -> Result<()> {
    let dir = TempDir::new("run_ours")?;
    let config = RunConfig {
        writer: 1,
        ..short_run(&dir)
    };

    let summaries = run_ours(&config)?;
    assert_eq!(summaries.len(), 2);
    for summary in summaries.iter() {
        assert_eq!(summary.outcome.returns.len(), 2);
        assert_eq!(summary.outcome.env_steps, 20);
    }

    let model_dir = dir.path().join("ckpt/block_normal/Ours/seed_1");
    assert!(model_dir.join("env.yaml").is_file());
    assert!(model_dir.join("trainer.yaml").is_file());
    assert!(model_dir.join("final/J0_0/actor.bincode").is_file());
    assert!(model_dir.join("best/J1_1/critic.bincode").is_file());
    for ckpt in ["best", "final"] {
        assert!(model_dir.join(ckpt).join("representation/encoder.bincode").is_file());
        assert!(model_dir.join(ckpt).join("representation/decoder.bincode").is_file());
    }

    // Header and one row per seed, episode and agent.
    let csv = fs::read_to_string(dir.path().join("result/block_normal/Ours.csv"))?;
    assert_eq!(csv.lines().count(), 1 + 2 * 2 * 4);
    Ok(())
}

#[test]
fn writer_zero_writes_nothing() -> Result<()> {
    let dir = TempDir::new("run_idqn")?;
    let config = RunConfig {
        task: Task::Regular,
        ..short_run(&dir)
    };

    let summaries = run_idqn(&config)?;
    assert_eq!(summaries.len(), 2);
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn same_seed_same_returns() -> Result<()> {
    let dir = TempDir::new("run_ours_determinism")?;
    let config = RunConfig {
        representation: Some(true),
        seed: vec![1],
        ..short_run(&dir)
    };

    let a = run_ours(&config)?;
    let b = run_ours(&config)?;
    assert_eq!(a[0].outcome.returns, b[0].outcome.returns);
    assert_eq!(a[0].outcome.agent_returns, b[0].outcome.agent_returns);
    Ok(())
}

#[test]
fn custom_model_name_sets_paths() -> Result<()> {
    let dir = TempDir::new("run_named")?;
    let config = RunConfig {
        model_name: Some("IDQN_small".to_string()),
        writer: 1,
        seed: vec![1],
        ..short_run(&dir)
    };

    run_idqn(&config)?;
    let model_dir = dir.path().join("ckpt/block_normal/IDQN_small/seed_1");
    assert!(model_dir.join("final/J0_1/qnet.bincode").is_file());
    assert!(!model_dir.join("final/representation").exists());
    assert!(dir.path().join("result/block_normal/IDQN_small.csv").is_file());
    Ok(())
}

#[test]
fn ours_without_representation_saves_no_encoder() -> Result<()> {
    let dir = TempDir::new("run_ours_plain")?;
    let config = RunConfig {
        representation: Some(false),
        writer: 1,
        seed: vec![3],
        ..short_run(&dir)
    };

    run_ours(&config)?;
    let model_dir = dir.path().join("ckpt/block_normal/Ours/seed_3");
    assert!(model_dir.join("final/J0_0/actor.bincode").is_file());
    assert!(!model_dir.join("final/representation").exists());
    Ok(())
}
