use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;

use epicsearch::{
    infrastructure::{catalog_client::HttpCatalogClient, cli::Cli, config::Config},
    integration::app_runner::AppRunner,
    utils::{initialize_logging, initialize_panic_handler},
};

async fn tokio_main() -> Result<()> {
    initialize_logging()?;

    initialize_panic_handler()?;

    let args = <Cli as Parser>::parse();

    // File and environment layers first, then flags on top
    let mut config = Config::load()?;
    args.apply(&mut config);
    config.validate()?;

    let api = HttpCatalogClient::new(config.api.base_url.clone(), config.api.timeout())?;
    log::info!("Using catalog at {} for user {}", api.base_url(), config.user_id);

    let mut runner = AppRunner::new(&config, Arc::new(api), args.viewport);
    runner.run().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = tokio_main().await {
        eprintln!("{} error: Something went wrong", env!("CARGO_PKG_NAME"));
        Err(e)
    } else {
        Ok(())
    }
}
