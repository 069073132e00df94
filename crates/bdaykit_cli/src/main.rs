use anyhow::Result;
use bdaykit_cli::{Args, init_logging, run};
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args, &mut std::io::stdout().lock())
}
