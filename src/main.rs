//! Binary entry point that glues the SQLite-backed domain model to the TUI.
//! We resolve paths, start logging, make sure the database opens, and drive
//! the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use recipe_manager::{logging, run_app, App, Cli, ConnectionProvider};
use tracing::{error, info};

/// Open the store, launch the UI, and close the store on the way out.
///
/// A database that cannot be opened or migrated at startup is fatal and is
/// reported on the terminal before the UI ever takes over the screen.
fn main() -> anyhow::Result<()> {
    let config = Cli::parse().resolve()?;
    logging::init(&config.log_file)?;
    info!(database = %config.database.display(), "starting recipe manager");

    let mut db = ConnectionProvider::new(&config.database);
    db.connection()
        .with_context(|| format!("failed to open database {}", config.database.display()))?;

    let mut app = App::new(db);
    let result = run_app(&mut app);
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "ui loop failed");
    }

    let closed = app.shutdown();
    result?;
    closed?;
    info!("recipe manager stopped");
    Ok(())
}
