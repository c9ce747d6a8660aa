//! Command handlers behind the CLI.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{debug, info};

use sessiondeck_checkpoint::{
    create_checkpoint, diff_summary, rollback_all, rollback_files, Checkpoint,
};
use sessiondeck_core::{Config, Error, SessionStatus};
use sessiondeck_session::{SessionManager, SessionManagerConfig, SystemLauncher, SystemProber};

use crate::cli::{CheckpointCommand, Cli, Command};

/// Load the configuration file (if any) and apply command-line overrides.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.paths.data_dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Manager wired to real terminals and processes.
pub fn system_manager(config: &Config) -> SessionManager {
    let launcher = SystemLauncher::new(config.run_dir(), config.launcher.pid_timeout())
        .with_terminal(config.launcher.terminal.clone());

    SessionManager::new(
        SessionManagerConfig::from_config(config),
        Arc::new(launcher),
        Arc::new(SystemProber::new()),
    )
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute the parsed command.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Command::Start {
            project,
            path,
            env,
            args,
        } => {
            let manager = system_manager(&config);
            let env: BTreeMap<String, String> = env.into_iter().collect();
            let info = manager.start(&project, &path, &args, &env)?;
            print_json(&info)
        }

        Command::List { project, running } => {
            let manager = system_manager(&config);
            let sessions = match (project, running) {
                (Some(project), true) => manager.list_running_by_project(&project),
                (Some(project), false) => manager.list_by_project(&project),
                (None, true) => manager
                    .list_all()
                    .into_iter()
                    .filter(|s| s.status == SessionStatus::Running)
                    .collect(),
                (None, false) => manager.list_all(),
            };
            print_json(&sessions)
        }

        Command::Kill { id, project } => {
            let manager = system_manager(&config);
            match (id, project) {
                (Some(id), _) => {
                    if manager.get(&id).is_none() {
                        return Err(Error::SessionNotFound(id).into());
                    }
                    manager.kill(&id)?;
                }
                (None, Some(project)) => {
                    let running = manager.list_running_by_project(&project).len();
                    manager.kill_by_project(&project)?;
                    info!("Killed {} sessions of {}", running, project);
                }
                (None, None) => bail!("either a session id or --project is required"),
            }
            Ok(())
        }

        Command::Watch { interval_ms } => {
            watch(Arc::new(system_manager(&config)), Duration::from_millis(interval_ms)).await
        }

        Command::Checkpoint { action } => checkpoint(action),
    }
}

async fn watch(manager: Arc<SessionManager>, every: Duration) -> anyhow::Result<()> {
    info!(
        "Watching {} running sessions (every {:?})",
        manager.running_count(),
        every
    );
    let mut ticker = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let manager = Arc::clone(&manager);
                let (exited, removed) = tokio::task::spawn_blocking(move || {
                    (manager.refresh_status(), manager.clean_exited())
                })
                .await?;
                if exited > 0 || removed > 0 {
                    info!("{} sessions exited, {} removed", exited, removed);
                } else {
                    debug!("No session changes");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for Ctrl-C")?;
                info!("Stopping watch");
                return Ok(());
            }
        }
    }
}

fn load_checkpoint(file: &Path) -> anyhow::Result<Checkpoint> {
    Checkpoint::load(file).with_context(|| format!("reading checkpoint {}", file.display()))
}

fn checkpoint(action: CheckpointCommand) -> anyhow::Result<()> {
    match action {
        CheckpointCommand::Create { dir, out } => {
            let checkpoint = create_checkpoint(&dir)?;
            match out {
                Some(out) => {
                    checkpoint
                        .save(&out)
                        .with_context(|| format!("writing checkpoint {}", out.display()))?;
                    info!("Checkpoint written to {}", out.display());
                    Ok(())
                }
                None => print_json(&checkpoint),
            }
        }

        CheckpointCommand::Diff { file } => {
            let checkpoint = load_checkpoint(&file)?;
            let summary = diff_summary(checkpoint.dir(), &checkpoint)?;
            print_json(&summary)
        }

        CheckpointCommand::Rollback { file, yes, paths } => {
            if !yes {
                bail!("rollback discards changes irreversibly; pass --yes to confirm");
            }
            let checkpoint = load_checkpoint(&file)?;
            if paths.is_empty() {
                rollback_all(checkpoint.dir(), &checkpoint)?;
            } else {
                rollback_files(checkpoint.dir(), &checkpoint, &paths)?;
            }
            // Whatever is left could not be reverted.
            let remaining = diff_summary(checkpoint.dir(), &checkpoint)?;
            print_json(&remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_applies_overrides() {
        let cli = Cli::parse_from([
            "sessiondeck",
            "--data-dir",
            "/data",
            "--log-level",
            "debug",
            "list",
        ]);

        let config = load_config(&cli).unwrap();

        assert_eq!(config.sessions_dir(), Path::new("/data/sessions"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_config_rejects_bad_level() {
        let cli = Cli::parse_from(["sessiondeck", "--log-level", "loud", "list"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "monitor:\n  poll_interval_ms: 250\n").unwrap();

        let cli = Cli::parse_from([
            "sessiondeck",
            "--config",
            path.to_str().unwrap(),
            "list",
        ]);
        let config = load_config(&cli).unwrap();

        assert_eq!(config.monitor.poll_interval_ms, 250);
    }

    #[tokio::test]
    async fn test_rollback_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("missing.json");
        let cli = Cli::parse_from([
            "sessiondeck",
            "checkpoint",
            "rollback",
            file.to_str().unwrap(),
        ]);

        let err = run(cli, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }

    #[tokio::test]
    async fn test_list_with_empty_data_dir() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "sessiondeck",
            "--data-dir",
            temp.path().to_str().unwrap(),
            "list",
        ]);
        let config = load_config(&cli).unwrap();

        run(cli, config).await.unwrap();
    }

    #[tokio::test]
    async fn test_kill_unknown_session() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "sessiondeck",
            "--data-dir",
            temp.path().to_str().unwrap(),
            "kill",
            "demo-1",
        ]);
        let config = load_config(&cli).unwrap();

        let err = run(cli, config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::SessionNotFound(_))
        ));
    }
}
