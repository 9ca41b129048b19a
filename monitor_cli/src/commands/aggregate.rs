use crate::ui;
use anyhow::Result;
use monitor_store::{MetricStore, Stats};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StatsRow {
    #[tabled(rename = "Field")]
    path: String,
    #[tabled(rename = "Min")]
    min: String,
    #[tabled(rename = "Max")]
    max: String,
    #[tabled(rename = "Avg")]
    avg: String,
}

pub async fn execute(
    name: String,
    state: Option<PathBuf>,
    config: Option<PathBuf>,
    format: String,
) -> Result<()> {
    let (path, state) = super::read_state(state, config).await?;
    let store = MetricStore::with_state(state, usize::MAX);

    let stats = store
        .aggregated_query(Some(&name))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    match format.as_str() {
        "table" => print_table(&name, &path, store.state()[&name].len(), &stats),
        "json" => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => anyhow::bail!("Unknown format: {}", format),
    }

    Ok(())
}

fn print_table(name: &str, path: &Path, entries: usize, stats: &BTreeMap<String, Stats>) {
    ui::print_header(&format!("Metric: {}", name));
    println!("Source: {}", path.display());
    println!("Entries: {}", entries);

    if stats.is_empty() {
        ui::print_warning("No numeric fields to summarize");
        return;
    }

    let rows: Vec<StatsRow> = stats
        .iter()
        .map(|(path, stats)| StatsRow {
            path: path.clone(),
            min: format!("{:.4}", stats.min),
            max: format!("{:.4}", stats.max),
            avg: format!("{:.4}", stats.avg),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
}
