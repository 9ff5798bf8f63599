use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use crate::db::SqliteStore;
use crate::fmt::{clip, kind_amount};
use crate::records::RecordStore;
use crate::settings::Settings;

fn open_store() -> Result<SqliteStore> {
    let db_path = Settings::load().db_path();
    SqliteStore::open(&db_path).with_context(|| format!("opening {}", db_path.display()))
}

pub fn list(json: bool) -> Result<()> {
    let store = open_store()?;
    let records = store.scan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Kind", "Name", "Amount", "Frequency", "Category", "Date", "Source"]);
    for r in &records {
        let v = &r.values;
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(v.kind.label()),
            Cell::new(clip(&v.name, 40)),
            Cell::new(kind_amount(v.kind, v.amount)),
            Cell::new(v.frequency.key()),
            Cell::new(&v.category),
            Cell::new(v.date.as_deref().unwrap_or("")),
            Cell::new(v.source.as_deref().unwrap_or("")),
        ]);
    }
    println!("Records ({})\n{table}", records.len());
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let mut store = open_store()?;
    store.delete(id)?;
    println!("Deleted record {id}");
    Ok(())
}
