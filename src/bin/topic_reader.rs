use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tokio::runtime;
use tokio_util::sync::CancellationToken;
use topic_reader::{
    run_server, setup_tracing, AppResult, AppState, Converter, KafkaSource, ReaderConfig,
};
use tracing::info;

#[derive(Parser)]
#[command(version)]
pub struct CommandLine {
    /// path to config file
    #[arg(short, long)]
    pub conf: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser)]
pub enum Command {
    PrintConfig,
}

fn main() -> AppResult<()> {
    dotenv().ok();

    let commandline: CommandLine = CommandLine::parse();
    let config_path = commandline.conf.as_ref().map_or_else(
        || {
            let mut path = PathBuf::from("./");
            path.push("conf.toml");
            path
        },
        PathBuf::from,
    );
    let reader_config = ReaderConfig::set_up_config(config_path)?;

    if let Some(Command::PrintConfig) = commandline.command {
        println!("{:#?}", reader_config);
        return Ok(());
    }

    let rt = runtime::Builder::new_multi_thread().enable_all().build()?;
    let _log_guard = setup_tracing()?;

    rt.block_on(run(reader_config))
}

async fn run(config: ReaderConfig) -> AppResult<()> {
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    let source = Arc::new(KafkaSource::new(&config.kafka));
    let converter = Converter::new(config.read.preview_limit);
    let state = AppState::new(source, converter, config.read.clone(), shutdown);

    run_server(&config.network, state).await
}
