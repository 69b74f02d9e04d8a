use anyhow::Context;

use accord_config::AccordConfig;

use crate::cli::GlobalFlags;

/// Load layered configuration and apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<AccordConfig> {
    let mut config = AccordConfig::load_with_dotenv().context("failed to load accord config")?;
    apply_overrides(&mut config, flags)?;
    Ok(config)
}

fn apply_overrides(config: &mut AccordConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    if let Some(db) = &flags.db {
        config.database.path.clone_from(db);
    }
    config.validate().map_err(anyhow::Error::from)
}
