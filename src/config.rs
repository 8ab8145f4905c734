//! Command-line and environment configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".recipe-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "recipes.sqlite";
const LOG_FILE_NAME: &str = "recipe-manager.log";

#[derive(Debug, Parser)]
#[command(name = "recipe-manager")]
#[command(version)]
#[command(about = "Manage recipes, authors and ingredients from the terminal", long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, env = "RECIPE_MANAGER_DB")]
    pub database: Option<PathBuf>,

    /// Where to write the log (defaults to a file next to the database)
    #[arg(long, env = "RECIPE_MANAGER_LOG")]
    pub log_file: Option<PathBuf>,
}

/// Fully resolved paths the application runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub log_file: PathBuf,
}

impl Cli {
    /// Fill in defaults for anything the user did not pass.
    pub fn resolve(self) -> Result<Config> {
        let database = match self.database {
            Some(path) => path,
            None => default_db_path()?,
        };
        let log_file = self.log_file.unwrap_or_else(|| database.with_file_name(LOG_FILE_NAME));
        Ok(Config { database, log_file })
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}
