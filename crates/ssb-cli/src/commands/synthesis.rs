//! `ssb synthesis` and `ssb reset`.

use anyhow::{Context, Result};
use ssb_inventory::{load_synthesis, reset_consumption, LiveStore};
use ssb_reconcile::SynthesisRow;

use super::kv;

pub async fn print_synthesis(store: &dyn LiveStore, zone: Option<&str>) -> Result<()> {
    let rows = load_synthesis(store, zone)
        .await
        .context("synthesis read failed")?;
    for row in &rows {
        println!("{}", format_row(row));
    }
    println!("rows={}", rows.len());
    Ok(())
}

pub async fn reset(store: &dyn LiveStore, product: &str, zone: &str) -> Result<()> {
    let deleted = reset_consumption(store, product, zone).await?;
    println!("deleted={deleted}");
    Ok(())
}

fn format_row(row: &SynthesisRow) -> String {
    format!(
        "zone={} designation={} initial={} consumed={} remaining={} status={}",
        kv(&row.zone),
        kv(&row.designation),
        kv(&row.initial.label()),
        kv(&row.consumed.label()),
        kv(&row.remaining.label()),
        kv(row.status.label()),
    )
}
