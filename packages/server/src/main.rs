#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entry point for the vacancy map dashboards.

use clap::Parser as _;
use vacancy_map_server::config::ServerArgs;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let args = ServerArgs::parse();

    if args.interactive {
        vacancy_map_server::interactive::run(args).await?;
    } else {
        vacancy_map_server::run_server(args.into_config()?).await?;
    }

    Ok(())
}
