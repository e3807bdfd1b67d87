use clap::Parser;
use console::style;

use anicat::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();
    cli::init_tracing(cli.logging);
    let wait = cli.wait_input;

    // Failures are reported on stderr; the exit code stays 0 either way.
    if let Err(e) = cli::run(cli) {
        eprintln!("{} {e}", style("error:").red().bold());
    }

    if wait {
        cli::wait_for_enter();
    }
}
