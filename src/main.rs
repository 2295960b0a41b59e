//! HyperCopy CLI - inspect partition plans and benchmark parallel copies

use clap::Parser;
use hypercopy::cli;
use hypercopy::config::CliArgs;
use hypercopy::logging;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    let filter = logging::filter_from_env(
        "RUST_LOG",
        logging::level_for_verbosity(args.verbose, args.quiet),
    );
    logging::init(filter, args.log_json);

    // Handle result
    if let Err(e) = cli::run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
