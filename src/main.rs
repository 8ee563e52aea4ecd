use std::net::IpAddr;

use async_std::task;
use clap::Parser;

use rustle::config::{ServerConfig, config, set_config};
use rustle::handler::RequestDispatcher;
use rustle::handler::resource::UrlResource;
use rustle::handler::static_files::StaticRootResource;
use rustle::net::server::Server;

/// Small asynchronous HTTP/1.x server serving static files.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Directory served as the URL root
    #[arg(long)]
    root: Option<String>,

    /// Address to bind
    #[arg(long)]
    bind: Option<IpAddr>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Listen backlog
    #[arg(long)]
    backlog: Option<i32>,

    /// Log level: critical, fatal, error, warning, info or debug
    #[arg(long, default_value = "info")]
    loglevel: String,

    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<String>,
}

fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.loglevel);

    let mut cfg = match &cli.config {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::default(),
    };
    if let Some(root) = cli.root {
        cfg.root = root;
    }
    if let Some(bind) = cli.bind {
        cfg.address = bind;
    }
    if let Some(port) = cli.port {
        cfg.port = port;
    }
    if let Some(backlog) = cli.backlog {
        cfg.backlog = backlog;
    }
    set_config(cfg);

    let dispatcher = RequestDispatcher::new(|_req| {
        Box::new(StaticRootResource::new(config().root.clone())) as Box<dyn UrlResource>
    });
    let server = Server::new(dispatcher);
    task::block_on(server.run())
}

fn init_logging(level: &str) {
    let filter = match level {
        "critical" | "fatal" | "error" => log::LevelFilter::Error,
        "warning" => log::LevelFilter::Warn,
        "debug" => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::from_default_env()
        .filter_level(filter)
        .init();
}
