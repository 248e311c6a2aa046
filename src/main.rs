mod config;
mod fields;
mod relay;
mod search;
mod store;
mod tiles;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use config::Config;
use store::{JsonFileStore, TileStore};

#[derive(Parser, Debug)]
#[command(name = "qtiles", about = "Reusable search-parameter tiles")]
struct Cli {
    /// Explicit configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite a search phrase with the saved tiles and open it
    Search(SearchArgs),
    /// Print the saved tiles
    Tiles,
    /// Remove every saved tile
    Clear,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Print the destination URL instead of opening the browser
    #[arg(long)]
    print: bool,

    /// The search phrase, as typed in the address bar
    query: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    match &config.config_path {
        Some(path) => log::debug!("loaded configuration from {}", path.display()),
        None => log::debug!("no configuration file, using defaults"),
    }
    let store = JsonFileStore::new(config.tiles_path.clone());

    match cli.command {
        Some(Command::Search(args)) => handle_search(args, &config, &store),
        Some(Command::Tiles) => handle_tiles(&store),
        Some(Command::Clear) => handle_clear(&store),
        None => run_editor(&config, store),
    }
}

fn handle_search(args: SearchArgs, config: &Config, store: &dyn TileStore) -> Result<()> {
    let Some(url) = search::trigger(&args.query, store)? else {
        // Blank input: no navigation
        return Ok(());
    };

    if args.print {
        println!("{url}");
    } else {
        search::navigate(&url, &config.commands.open)?;
    }
    Ok(())
}

fn handle_tiles(store: &dyn TileStore) -> Result<()> {
    let tiles = store.get()?;
    if tiles.is_empty() {
        println!("No saved tiles.");
        return Ok(());
    }

    println!("{} saved tile(s).", tiles.len());
    for tile in &tiles {
        println!("{}\t{}\t{}", tile.key, tile.label, tile.value);
    }
    Ok(())
}

fn handle_clear(store: &dyn TileStore) -> Result<()> {
    store.set(&[])?;
    println!("Saved tiles cleared.");
    Ok(())
}

fn run_editor(config: &Config, store: JsonFileStore) -> Result<()> {
    let relay = relay::spawn(Box::new(store));
    let mut app = ui::app::App::new(config, &relay);
    app.run()
}
