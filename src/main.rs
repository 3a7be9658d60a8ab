use clap::Parser;
use stockwatch::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    stockwatch::logging::init(cli.verbose);
    run(cli)
}
