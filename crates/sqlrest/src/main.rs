use clap::Parser;

use sqlrest::{adapters, cli::Args, error::AppResult, logging};

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    if let Err(e) = adapters::http::run(args).await {
        tracing::error!(code = e.code(), error = %e, "fatal");
        return Err(e);
    }
    Ok(())
}
