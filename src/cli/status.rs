use anyhow::Result;

use crate::db::SqliteStore;
use crate::records::RecordStore;
use crate::settings::Settings;

pub fn run() -> Result<()> {
    let settings = Settings::load();
    let db_path = settings.db_path();

    let settings_note = if Settings::exists() { "" } else { " (not written yet)" };
    println!("Settings:   {}{settings_note}", Settings::path().display());
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Year:       {}", settings.anchor_year());
    println!("Max file:   {} MB", settings.max_file_mb);
    println!("Shape:      {}", settings.default_shape.key());

    if db_path.exists() {
        let store = SqliteStore::open(&db_path)?;
        let total = store.scan()?.len();
        let (income, expense) = store.kind_counts()?;
        println!();
        println!("Records:    {total}");
        println!("  Income:   {income}");
        println!("  Expense:  {expense}");
        println!("Imports:    {}", store.import_count()?);
    } else {
        println!();
        println!("Database not found. Run `finsift init` to set up.");
    }
    Ok(())
}
