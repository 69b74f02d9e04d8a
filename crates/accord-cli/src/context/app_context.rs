use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use accord_config::AccordConfig;
use accord_db::service::AccordService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: AccordService,
    pub config: AccordConfig,
}

impl AppContext {
    /// Open the configured database and build the engine service.
    pub async fn init(config: AccordConfig) -> anyhow::Result<Self> {
        if !config.database.is_in_memory() {
            ensure_parent_dir(Path::new(&config.database.path))?;
        }

        let busy_timeout = Duration::from_millis(config.database.busy_timeout_ms);
        let service = AccordService::new_local_with(
            &config.database.path,
            busy_timeout,
            config.engine.trail_dir(),
        )
        .await
        .with_context(|| format!("failed to open accord database at {}", config.database.path))?;

        tracing::debug!(
            path = %config.database.path,
            trail = service.trail().is_enabled(),
            "accord context ready"
        );
        Ok(Self { service, config })
    }
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }
    Ok(())
}
