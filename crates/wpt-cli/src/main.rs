use clap::Parser;

mod cli;

use cli::args::Cli;
use cli::commands::{dispatch, usage_error};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    // Anything but a single TEST_URL is a usage error, including --help.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => std::process::exit(usage_error(&e.to_string())),
    };

    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
