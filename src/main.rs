use clap::Parser;
use investing::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
