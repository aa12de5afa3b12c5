//! Command-line interface for managing dashboard storage claims.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::info;

use crate::api::pvcs;
use crate::client::{FIELD_MANAGER, K8sApiOptions, KubeClientConfig, ResourceClient};
use crate::error::Result;
use crate::resources::pvc::CreatingStorageObject;

/// Manage PersistentVolumeClaims owned by the data science dashboard
#[derive(Parser, Debug)]
#[command(name = "dashboard-storage", version, about)]
pub struct Cli {
    /// Project namespace to operate in
    #[arg(short, long, global = true, env = "DASHBOARD_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Field manager recorded on writes
    #[arg(long, global = true, env = "DASHBOARD_FIELD_MANAGER", default_value = FIELD_MANAGER)]
    pub field_manager: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a single claim
    Get {
        /// Claim name
        name: String,
    },
    /// List dashboard claims in the namespace
    List {
        /// Only claims that several workbenches can mount at once
        #[arg(long)]
        multi_use: bool,
    },
    /// Create a claim
    Create(StorageArgs),
    /// Edit the display name, description and size of an existing claim
    Update {
        /// Name of the claim to edit
        existing: String,
        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Change the requested size of a claim
    Resize {
        /// Claim name
        name: String,
        /// New size, e.g. 20Gi
        size: String,
        /// Validate on the server without persisting
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete a claim
    Delete {
        /// Claim name
        name: String,
    },
}

/// User-facing fields of a storage claim
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Display name
    #[arg(long)]
    pub display_name: String,
    /// Description
    #[arg(long, default_value = "")]
    pub description: String,
    /// Requested size, e.g. 5Gi
    #[arg(long)]
    pub size: String,
    /// Storage class (cluster default when omitted)
    #[arg(long)]
    pub storage_class: Option<String>,
    /// Validate on the server without persisting
    #[arg(long)]
    pub dry_run: bool,
}

impl StorageArgs {
    fn storage_object(&self) -> CreatingStorageObject {
        let data = CreatingStorageObject::new(&self.display_name, &self.description, &self.size);
        match &self.storage_class {
            Some(class) => data.with_storage_class(class),
            None => data,
        }
    }

    fn api_options(&self) -> K8sApiOptions {
        K8sApiOptions {
            dry_run: self.dry_run,
        }
    }
}

impl Cli {
    /// Client configuration derived from the flags
    pub fn client_config(&self) -> KubeClientConfig {
        KubeClientConfig {
            field_manager: self.field_manager.clone(),
        }
    }

    /// Run the selected command and return its result as JSON
    pub async fn execute<C>(&self, client: &C) -> Result<Value>
    where
        C: ResourceClient + ?Sized,
    {
        let ns = self.namespace.as_str();
        let output = match &self.command {
            Command::Get { name } => {
                serde_json::to_value(pvcs::get_pvc(client, ns, name).await?)?
            }
            Command::List { multi_use: true } => {
                serde_json::to_value(pvcs::get_available_multi_use_pvcs(client, ns).await?)?
            }
            Command::List { multi_use: false } => {
                serde_json::to_value(pvcs::get_dashboard_pvcs(client, ns).await?)?
            }
            Command::Create(args) => {
                let created =
                    pvcs::create_pvc(client, &args.storage_object(), ns, &args.api_options())
                        .await?;
                info!(
                    name = ?created.metadata.name,
                    namespace = %ns,
                    dry_run = args.dry_run,
                    "Created claim"
                );
                serde_json::to_value(created)?
            }
            Command::Update { existing, storage } => {
                let current = pvcs::get_pvc(client, ns, existing).await?;
                let updated = pvcs::update_pvc(
                    client,
                    &storage.storage_object(),
                    &current,
                    ns,
                    &storage.api_options(),
                )
                .await?;
                info!(
                    name = %existing,
                    namespace = %ns,
                    dry_run = storage.dry_run,
                    "Updated claim"
                );
                serde_json::to_value(updated)?
            }
            Command::Resize {
                name,
                size,
                dry_run,
            } => {
                let opts = K8sApiOptions { dry_run: *dry_run };
                let resized = pvcs::update_pvc_size(client, name, ns, size, &opts).await?;
                info!(name = %name, namespace = %ns, size = %size, dry_run, "Resized claim");
                serde_json::to_value(resized)?
            }
            Command::Delete { name } => {
                let status = pvcs::delete_pvc(client, name, ns).await?;
                info!(name = %name, namespace = %ns, status = ?status.status, "Deleted claim");
                serde_json::to_value(status)?
            }
        };
        Ok(output)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::client::{MockResourceClient, PVC_MODEL, QueryOptions};
    use crate::resources::pvc::assemble_pvc;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "dashboard-storage",
            "--namespace",
            "my-project",
            "create",
            "--display-name",
            "Training Data",
            "--size",
            "20Gi",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.namespace, "my-project");
        assert_eq!(cli.field_manager, FIELD_MANAGER);
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.display_name, "Training Data");
                assert_eq!(args.description, "");
                assert_eq!(args.size, "20Gi");
                assert!(args.dry_run);
                assert_eq!(args.api_options(), K8sApiOptions::dry_run());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_multi_use() {
        let cli = Cli::try_parse_from(["dashboard-storage", "list", "--multi-use", "-n", "p"])
            .unwrap();
        assert_eq!(cli.namespace, "p");
        assert!(matches!(cli.command, Command::List { multi_use: true }));
    }

    #[test]
    fn test_storage_args_with_class() {
        let args = StorageArgs {
            display_name: "Data".to_string(),
            description: "d".to_string(),
            size: "1Gi".to_string(),
            storage_class: Some("fast".to_string()),
            dry_run: false,
        };
        let data = args.storage_object();
        assert_eq!(data.storage_class_name.as_deref(), Some("fast"));
        assert_eq!(data.name_desc.name, "Data");
    }

    #[tokio::test]
    async fn test_execute_update_fetches_then_replaces() {
        let cli = Cli::try_parse_from([
            "dashboard-storage",
            "-n",
            "proj",
            "update",
            "data",
            "--display-name",
            "Data",
            "--size",
            "2Gi",
        ])
        .unwrap();

        let existing = assemble_pvc(
            &CreatingStorageObject::new("Data", "", "1Gi"),
            "proj",
            Some("data"),
        );
        let existing_value = serde_json::to_value(&existing).unwrap();

        let mut client = MockResourceClient::new();
        client
            .expect_get_resource()
            .withf(|call| {
                call.model == PVC_MODEL && call.query_options == QueryOptions::named("proj", "data")
            })
            .times(1)
            .returning(move |_| Ok(existing_value.clone()));
        client
            .expect_update_resource()
            .times(1)
            .returning(|call| Ok(call.resource));

        let output = cli.execute(&client).await.unwrap();
        assert_eq!(output["metadata"]["name"], "data");
        assert_eq!(output["spec"]["resources"]["requests"]["storage"], "2Gi");
    }
}
