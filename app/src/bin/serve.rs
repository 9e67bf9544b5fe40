use std::path::PathBuf;

use actix_web::{middleware, App, HttpServer};
use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;
use structopt::StructOpt;

use infra::persistence::Storage;
use recipebook::config::{Config, FileConfig, StoreKind};
use recipebook::RecipeBook;

#[derive(Debug, StructOpt)]
#[structopt(name = "serve", about = "Serve the recipe book.")]
struct Opt {
    /// Optional TOML file with an `[env_logger]` table
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();

    let file = match opt.config.as_ref() {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    file.env_logger.builder().init();
    debug!("Options: {:?}", opt);

    let config = Config::from_env()?;
    debug!("Config: {:?}", config);

    match config.recipe_store {
        StoreKind::Cosmos => serve(&config, config.cosmos_pool()?),
        StoreKind::Memory => serve(&config, config.memory_pool()?),
    }
}

fn serve<M, D>(config: &Config, pool: Pool<M>) -> Result<()>
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let book = RecipeBook::new(pool);

    actix_web::rt::System::new().block_on(async move {
        let srv = HttpServer::new(move || {
            App::new()
                .wrap(middleware::Logger::default())
                .configure(|cfg| book.configure(cfg))
        })
        .bind(config.listen_addr())
        .context("bind")?;
        for addr in srv.addrs() {
            info!("Server is running on http://{}", addr);
        }
        srv.run().await.context("run server")
    })
}
