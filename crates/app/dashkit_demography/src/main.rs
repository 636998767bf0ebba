//! World demography tool server binary.

use std::path::PathBuf;

use clap::Parser;
use dashkit_api::AppState;
use dashkit_api::config::ServerConfig;
use dashkit_api::resource::DirectoryResources;
use dashkit_core::Dispatcher;
use tracing::info;

/// CLI arguments for the demography server.
#[derive(Parser, Debug)]
#[command(name = "dashkit_demography", about = "World demography tool server")]
struct Args {
    /// Hostname or IP address to bind the server to [env: DASHKIT_HOST, default: 127.0.0.1].
    #[arg(long)]
    host: Option<String>,

    /// Port number to bind the server to [env: DASHKIT_PORT, default: 8888].
    #[arg(long)]
    port: Option<u16>,

    /// Path to the JSON dataset with countries, fertility and demography rows.
    #[arg(long, env = "DASHKIT_DATASET_PATH", default_value = "./data/world.json")]
    dataset_path: PathBuf,

    /// Directory exposed through the resource endpoint.
    #[arg(long, env = "DASHKIT_RESOURCE_DIR")]
    resource_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,dashkit_core=debug,dashkit_api=debug,dashkit_demography=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();

    let env_config = ServerConfig::from_env();
    let config = ServerConfig::new(
        args.host.unwrap_or(env_config.host),
        args.port.unwrap_or(env_config.port),
    );

    info!(
        dataset = %args.dataset_path.display(),
        addr = %config.bind_addr(),
        "starting dashkit_demography"
    );

    let state = dashkit_demography::init(&args.dataset_path).await?;
    let dispatcher = Dispatcher::new(dashkit_demography::build_app(state));

    let mut app_state = AppState::new(dispatcher);
    if let Some(dir) = args.resource_dir {
        info!(dir = %dir.display(), "serving resources");
        app_state = app_state.with_resources(DirectoryResources::new(dir));
    }

    dashkit_api::serve(&config, app_state).await?;

    Ok(())
}
