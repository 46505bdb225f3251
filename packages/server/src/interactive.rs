//! Interactive mode for the server.
//!
//! Prompts for the dataset, image directory, dashboard and bind address
//! before starting the server. Values given on the command line or through
//! the environment become the prompt defaults.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::ServerError;
use crate::config::{AppKind, ServerArgs};

/// Runs the server in interactive mode, prompting for configuration.
///
/// # Errors
///
/// Returns [`ServerError`] if a prompt fails, the collected configuration
/// is invalid, or the server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run(args: ServerArgs) -> Result<(), ServerError> {
    println!("Chicago Vacancy Map Server");
    println!();

    let mut data_prompt = Input::<String>::new().with_prompt("Vacancy CSV path");
    if let Some(data) = &args.data {
        data_prompt = data_prompt.default(data.display().to_string());
    }
    let data: String = data_prompt.interact_text()?;

    let image_dir: String = Input::new()
        .with_prompt("Wealth map image directory")
        .default(args.image_dir.display().to_string())
        .interact_text()?;

    let labels: Vec<&str> = AppKind::ALL.iter().map(|a| a.label()).collect();
    let default_app = AppKind::ALL
        .iter()
        .position(|a| *a == args.app)
        .unwrap_or(0);
    let app_idx = Select::new()
        .with_prompt("Dashboard")
        .items(&labels)
        .default(default_app)
        .interact()?;

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(args.bind_addr.clone())
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(args.port)
        .interact_text()?;

    let config = ServerArgs {
        data: Some(PathBuf::from(data)),
        image_dir: PathBuf::from(image_dir),
        app: AppKind::ALL[app_idx],
        bind_addr,
        port,
        interactive: false,
        ..args
    }
    .into_config()?;

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.bind_addr, config.port
        ))
        .default(true)
        .interact()?
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
