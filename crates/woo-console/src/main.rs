use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use woo_config::{AppConfig, Session};
use woo_dispatch::{ActionLogger, Dispatcher};
use woo_stores::{InMemoryNetwork, InMemoryStorage, StoreContext, StoresManager};

mod console;
mod fixtures;
mod input;
mod logger;

use console::{Console, ConsoleAction, TOKEN_ENV};

fn main() -> Result<()> {
    let config = AppConfig::load();
    let log_file = logger::init(config.level_filter())?;

    log::info!("Starting woo-console");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let network = match &config.fixtures_path {
        Some(path) => InMemoryNetwork::from_fixture_file(Path::new(path))?,
        None => fixtures::demo_network()?,
    };

    let dispatcher = Dispatcher::shared();
    let _action_logger = config
        .log_actions
        .then(|| ActionLogger::new().ignore::<ConsoleAction>().attach(&dispatcher));

    let context = StoreContext::new(
        dispatcher.clone(),
        Arc::new(InMemoryStorage::new()),
        Arc::new(network),
        runtime.handle().clone(),
    );
    let mut manager = StoresManager::new(context, Session::load());
    match woo_config::session_path() {
        Ok(path) => manager = manager.persist_session_to(path),
        Err(e) => log::warn!("Session will not be saved: {:#}", e),
    }

    println!("woo-console (logging to {:?}), type `help` for commands", log_file);
    let console = Console::attach(manager, config, io::stdout());
    console.restore_session(std::env::var(TOKEN_ENV).ok());

    input::spawn_reader(io::BufReader::new(io::stdin()), dispatcher.sender());

    while console.is_running() {
        dispatcher.process_next(Duration::from_millis(100));
    }

    log::info!("Exiting woo-console");
    Ok(())
}
