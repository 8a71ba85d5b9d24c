use clap::Parser;
use dotenvy::dotenv;
use geonames_loader::cli::{self, CliArgs};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1. Load .env file first so RUST_LOG and DB_GEONAMES_* from it apply
    dotenv().ok(); // Make it non-fatal, env vars can be set externally

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // 3. Parse arguments and run the command
    let args = CliArgs::parse();
    ExitCode::from(cli::run(args).await)
}
