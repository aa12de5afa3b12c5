//! dashboard-storage - manage dashboard PersistentVolumeClaims from the command line.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Creates the Kubernetes client
//! - Runs the requested command and prints the result as JSON

use clap::Parser;
use kube::Client;
use tracing::debug;

use dashboard_storage::KubeResourceClient;
use dashboard_storage::cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dashboard_storage=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let client = Client::try_default().await?;
    debug!(namespace = %cli.namespace, "Connected to Kubernetes cluster");

    let resources = KubeResourceClient::new(client, cli.client_config());
    let output = cli.execute(&resources).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
