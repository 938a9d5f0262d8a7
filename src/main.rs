use clap::Parser;
use log::info;

use flatfile_server::config::Config;
use flatfile_server::server::listener::HTTPListener;

fn main() -> std::io::Result<()> {
    env_logger::init();
    let config = Config::parse();

    ctrlc::set_handler(|| {
        info!(target: "listener", "Received interrupt, shutting down");
        std::process::exit(0);
    })
    .map_err(std::io::Error::other)?;

    info!(target: "listener", "Starting server on {0}:{1}", config.host, config.port);
    HTTPListener::bind(config.host, config.port, config.listener_config())?.listen()
}
