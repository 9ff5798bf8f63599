use anyhow::{Context, Result};

use crate::db::SqliteStore;
use crate::settings::Settings;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = Settings::load();
    if let Some(dir) = data_dir {
        settings.set_data_dir(&dir);
    }

    std::fs::create_dir_all(&settings.data_dir)
        .with_context(|| format!("creating data directory {}", settings.data_dir))?;
    settings.save().context("writing settings")?;

    let db_path = settings.db_path();
    SqliteStore::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?;

    println!("Settings:   {}", Settings::path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    Ok(())
}
