//! `deedsearch tables`: list tables, most recently used first.

use crate::state::AppState;

pub async fn run(state: &AppState, remember: Option<&str>) -> deedsearch::Result<()> {
    let mut catalog = state.table_catalog();
    if let Some(name) = remember {
        catalog.remember(name)?;
    }

    catalog.load().await?;
    let recent = catalog.recent();
    for table in catalog.ordered() {
        if recent.as_deref() == Some(table.as_str()) {
            println!("{} (recent)", table);
        } else {
            println!("{}", table);
        }
    }
    Ok(())
}
