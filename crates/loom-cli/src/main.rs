//! Loom CLI
//!
//! Command-line interface for Loom - book search, favorites and a reading
//! diary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use loom_core::{Config, Library};

mod commands;
mod editor;
mod logging;
mod output;
mod search;

use output::{Output, OutputFormat};
use search::CatalogClient;

#[derive(Parser)]
#[command(name = "loom")]
#[command(about = "Loom - find books, keep favorites, write a reading diary")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the book catalog
    Search {
        /// Free-text query (title, author, keywords)
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show book details
    Book {
        #[command(subcommand)]
        command: BookCommands,
    },
    /// Manage favorite books
    #[command(alias = "fav")]
    Favorites {
        #[command(subcommand)]
        command: Option<FavoriteCommands>,
    },
    /// Manage the reading diary
    Diary {
        #[command(subcommand)]
        command: Option<DiaryCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (counts, storage location, load results)
    Status,
}

#[derive(Subcommand)]
enum BookCommands {
    /// Show a book by catalog id
    Show {
        /// Catalog volume id
        id: String,
    },
}

#[derive(Subcommand)]
enum FavoriteCommands {
    /// List favorites
    #[command(alias = "ls")]
    List,
    /// Add a book by catalog id
    Add {
        /// Catalog volume id
        id: String,
    },
    /// Remove a favorite
    #[command(alias = "rm")]
    Remove {
        /// Book ID (full or prefix)
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Add the book if absent, remove it if present
    Toggle {
        /// Catalog volume id
        id: String,
    },
}

#[derive(Subcommand)]
enum DiaryCommands {
    /// List entries, newest first
    #[command(alias = "ls")]
    List,
    /// Show one entry
    Show {
        /// Entry ID (full or prefix)
        id: String,
    },
    /// Write a new entry
    #[command(alias = "new")]
    Add {
        /// Book title
        title: String,
        /// Book author
        #[arg(short, long)]
        author: Option<String>,
        /// Your thoughts (opens editor if not provided)
        #[arg(short, long)]
        thoughts: Option<String>,
        /// Rating from 1 to 5 stars (0 for none)
        #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
        rating: u8,
    },
    /// Delete an entry
    #[command(alias = "rm")]
    Delete {
        /// Entry ID (full or prefix)
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, search_url, api_key, max_results, write_policy, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the library
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    logging::init_logging(&config);

    let catalog = CatalogClient::new(&config)?;
    let library = Library::open_with_config(config)
        .await
        .context("Failed to open library")?;

    let result = match cli.command {
        Commands::Search { query } => {
            commands::search::run(&library, &catalog, query.join(" "), &output).await
        }
        Commands::Book { command } => handle_book_command(command, &library, &catalog, &output).await,
        Commands::Favorites { command } => {
            handle_favorite_command(command, &library, &catalog, &output).await
        }
        Commands::Diary { command } => handle_diary_command(command, &library, &output).await,
        Commands::Status => commands::status::show(&library, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    };

    // Wait for pending writes even when the command failed
    library.shutdown().await;

    result
}

async fn handle_book_command(
    command: BookCommands,
    library: &Library,
    catalog: &CatalogClient,
    output: &Output,
) -> Result<()> {
    match command {
        BookCommands::Show { id } => commands::book::show(library, catalog, id, output).await,
    }
}

async fn handle_favorite_command(
    command: Option<FavoriteCommands>,
    library: &Library,
    catalog: &CatalogClient,
    output: &Output,
) -> Result<()> {
    match command {
        Some(FavoriteCommands::List) | None => commands::favorites::list(library, output),
        Some(FavoriteCommands::Add { id }) => {
            commands::favorites::add(library, catalog, id, output).await
        }
        Some(FavoriteCommands::Remove { id, yes }) => {
            commands::favorites::remove(library, id, yes, output).await
        }
        Some(FavoriteCommands::Toggle { id }) => {
            commands::favorites::toggle(library, catalog, id, output).await
        }
    }
}

async fn handle_diary_command(
    command: Option<DiaryCommands>,
    library: &Library,
    output: &Output,
) -> Result<()> {
    match command {
        Some(DiaryCommands::List) | None => commands::diary::list(library, output),
        Some(DiaryCommands::Show { id }) => commands::diary::show(library, id, output),
        Some(DiaryCommands::Add {
            title,
            author,
            thoughts,
            rating,
        }) => commands::diary::add(library, title, author, thoughts, rating, output).await,
        Some(DiaryCommands::Delete { id, yes }) => {
            commands::diary::delete(library, id, yes, output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rating_range() {
        assert!(Cli::try_parse_from(["loom", "diary", "add", "Dune", "-t", "ok", "-r", "5"]).is_ok());
        assert!(Cli::try_parse_from(["loom", "diary", "add", "Dune", "-t", "ok", "-r", "6"]).is_err());
    }

    #[test]
    fn test_multi_word_search() {
        let cli = Cli::try_parse_from(["loom", "search", "frank", "herbert"]).unwrap();
        match cli.command {
            Commands::Search { query } => assert_eq!(query.join(" "), "frank herbert"),
            _ => panic!("expected search"),
        }
    }
}
