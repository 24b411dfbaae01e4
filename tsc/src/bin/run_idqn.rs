use anyhow::Result;
use clap::Parser;
use tsc::{run_idqn, RunConfig};

/// Train independent DQN controllers on a signal grid
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    run: RunConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    for summary in run_idqn(&args.run)? {
        println!(
            "seed {:>4}  best {:>10.3}  last-10 {:>10.3}",
            summary.seed,
            summary.best_return(),
            summary.last_mean_return(10)
        );
    }

    Ok(())
}
