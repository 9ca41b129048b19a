use anyhow::Result;
use monitor_store::MetricStore;
use std::path::PathBuf;

pub async fn execute(
    name: Option<String>,
    state: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let (_, state) = super::read_state(state, config).await?;
    let store = MetricStore::with_state(state, usize::MAX);

    match store.raw_query(name.as_deref()) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", e),
    }
}
