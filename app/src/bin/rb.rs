use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use structopt::StructOpt;

use infra::cosmos::CosmosContainer;
use infra::memory::MemoryStore;
use infra::persistence::Storage;
use recipebook::config::{Config, FileConfig, StoreKind};
use recipebook::recipes::Recipe;

#[derive(Debug, StructOpt)]
#[structopt(name = "rb", about = "Recipe book CLI")]
struct Opt {
    /// Optional TOML file with an `[env_logger]` table
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    command: Commands,
}

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "setup", about = "Create the database and container if missing")]
    Setup,
    #[structopt(name = "list", about = "List recipes")]
    List,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let file = match opt.config.as_ref() {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    file.env_logger.builder().init();

    let config = Config::from_env()?;

    match config.recipe_store {
        StoreKind::Cosmos => {
            let docs = CosmosContainer::connect(Arc::new(config.cosmos_account()?))
                .context("connect to Cosmos DB")?;
            run(&docs, &opt.command)
        }
        StoreKind::Memory => run(&MemoryStore::new(), &opt.command),
    }
}

fn run<D: Storage>(docs: &D, command: &Commands) -> Result<()> {
    match command {
        Commands::Setup => {
            docs.setup::<Recipe>().context("set up container")?;
        }
        Commands::List => {
            let list = docs.read_all::<Recipe>().context("list recipes")?;
            for recipe in list {
                println!("{}: {} ({})", recipe.id(), recipe.name, recipe.course);
            }
        }
    }

    Ok(())
}
