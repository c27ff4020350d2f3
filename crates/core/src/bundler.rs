//! Bundler collaborator
//!
//! kiln never bundles anything itself. The [`Bundler`] trait is the seam to the
//! external tool: `build` is a one-shot production build and `serve` runs the
//! development server until the cancellation token fires.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bundle::BundleConfig;
use crate::configs::project::BundlerCommands;

/// File, below the output directory, that receives the serialized bundle config
pub const BUNDLE_CONFIG_FILE: &str = ".kiln-bundle.json";

#[async_trait]
pub trait Bundler: Send + Sync {
    async fn build(&self, bundle: &BundleConfig) -> anyhow::Result<()>;

    /// Serve until `cancel` fires. Returning early is only an error when the
    /// server itself failed.
    async fn serve(&self, bundle: &BundleConfig, cancel: CancellationToken) -> anyhow::Result<()>;
}

/// Runs the bundler as an external command in the project root.
///
/// The bundle configuration is written as JSON next to the build output and
/// its path is exported as `KILN_BUNDLE_CONFIG`, together with `KILN_MODE` and
/// `NODE_ENV`.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    project_root: PathBuf,
    commands: BundlerCommands,
}

impl CommandBundler {
    pub fn new(project_root: impl Into<PathBuf>, commands: BundlerCommands) -> Self {
        Self {
            project_root: project_root.into(),
            commands,
        }
    }

    async fn prepare(&self, argv: &[String], bundle: &BundleConfig) -> anyhow::Result<Command> {
        let Some((program, args)) = argv.split_first() else {
            bail!("No bundler command configured");
        };

        let config_path = self.write_bundle_config(bundle).await?;

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.project_root)
            .env("KILN_BUNDLE_CONFIG", &config_path)
            .env("KILN_MODE", bundle.mode.node_env())
            .env("NODE_ENV", bundle.mode.node_env());

        debug!(
            command = %argv.join(" "),
            config = %config_path.display(),
            "prepared bundler command"
        );
        Ok(command)
    }

    async fn write_bundle_config(&self, bundle: &BundleConfig) -> anyhow::Result<PathBuf> {
        let output_dir = self.project_root.join(&bundle.output_dir);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let config_path = output_dir.join(BUNDLE_CONFIG_FILE);
        let json = serde_json::to_vec_pretty(bundle).context("Failed to serialize bundle config")?;
        tokio::fs::write(&config_path, json)
            .await
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

fn check_status(argv: &[String], status: ExitStatus) -> anyhow::Result<()> {
    if !status.success() {
        bail!(
            "Command '{}' failed with exit code {}",
            argv.join(" "),
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}

#[async_trait]
impl Bundler for CommandBundler {
    async fn build(&self, bundle: &BundleConfig) -> anyhow::Result<()> {
        let argv = &self.commands.build;
        let mut command = self.prepare(argv, bundle).await?;

        info!(command = %argv.join(" "), "running bundler build");
        let status = command
            .status()
            .await
            .with_context(|| format!("Failed to execute command '{}'", argv.join(" ")))?;
        check_status(argv, status)
    }

    async fn serve(&self, bundle: &BundleConfig, cancel: CancellationToken) -> anyhow::Result<()> {
        let argv = &self.commands.serve;
        let mut command = self.prepare(argv, bundle).await?;
        command.kill_on_drop(true);

        info!(command = %argv.join(" "), "starting bundler dev server");
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to execute command '{}'", argv.join(" ")))?;

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.cancelled() => None,
        };

        match exited {
            Some(status) => {
                let status = status.context("Failed to wait for the dev server")?;
                check_status(argv, status)
            }
            None => {
                info!("stopping bundler dev server");
                child.kill().await.context("Failed to stop the dev server")?;
                Ok(())
            }
        }
    }
}
