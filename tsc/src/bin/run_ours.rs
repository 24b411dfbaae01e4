use anyhow::Result;
use clap::Parser;
use tsc::{run_ours, RunConfig};

/// Train independent actor-critic controllers on a signal grid,
/// optionally with a shared latent representation of the grid
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[command(flatten)]
    run: RunConfig,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    for summary in run_ours(&args.run)? {
        println!(
            "seed {:>4}  best {:>10.3}  last-10 {:>10.3}",
            summary.seed,
            summary.best_return(),
            summary.last_mean_return(10)
        );
    }

    Ok(())
}
