use clap::Parser;
use stablecoin_scripts::{
    artifacts::ArtifactStore, cli::Cli, client::setup_client, commands::ScriptContext,
    config::DeploymentConfig, errors::ScriptError,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        priv_key,
        rpc_url,
        config,
        artifacts_dir,
        output_dir,
        confirmations,
        command,
    } = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().pretty().with_env_filter(filter).init();

    let config = match config {
        Some(path) => DeploymentConfig::load(&path)?,
        None => DeploymentConfig::default(),
    };
    let ctx = ScriptContext {
        config,
        artifacts: ArtifactStore::new(artifacts_dir),
    };

    let client = setup_client(&priv_key, &rpc_url, confirmations).await?;

    command.run(&client, &ctx, &output_dir).await?;
    Ok(())
}
