//! `deedsearch search`: run one faceted, paginated search.

use deedsearch::search::{FacetPanel, SearchField};

use crate::state::{flush_notifications, AppState};

/// Inputs of one search invocation.
#[derive(Debug, Default)]
pub struct SearchArgs {
    pub fields: Vec<(SearchField, String)>,
    pub facet: Option<String>,
    pub page: u32,
    pub json: bool,
}

pub async fn run(state: &AppState, args: SearchArgs) -> deedsearch::Result<()> {
    let mut notes = state.notifications();
    let controller = state.controller();
    controller.restore()?;

    for (field, value) in &args.fields {
        if *field == SearchField::TableName {
            controller.set_table(value)?;
        } else {
            controller.update_field(*field, value.as_str());
        }
    }

    let result = async {
        controller.execute_search(true).await?;
        if let Some(facet) = &args.facet {
            controller.toggle_facet(facet).await?;
        }
        if args.page > 1 {
            controller.set_page(i64::from(args.page) - 1).await?;
        }
        Ok::<_, deedsearch::ClientError>(())
    }
    .await;
    flush_notifications(&mut notes);
    result?;

    let snapshot = controller.state();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot).map_err(std::io::Error::other)?
        );
        return Ok(());
    }

    println!("Keywords: {}", controller.search_keywords());
    println!(
        "{} (page {} of {})",
        controller.status_text(),
        snapshot.page,
        snapshot.max_page()
    );

    let panel = FacetPanel::new(&snapshot);
    if !panel.is_empty() {
        let chips: Vec<String> = panel
            .chips()
            .map(|chip| {
                if chip.active {
                    format!("[{} ({})]", chip.label, chip.count)
                } else {
                    format!("{} ({})", chip.label, chip.count)
                }
            })
            .collect();
        println!("Groups: {}", chips.join(", "));
    }

    for record in &snapshot.results {
        let columns: Vec<String> = record
            .display_columns()
            .iter()
            .map(|column| {
                controller
                    .highlight(column)
                    .spans()
                    .iter()
                    .map(|span| {
                        if span.matched {
                            format!("*{}*", span.text)
                        } else {
                            span.text.to_string()
                        }
                    })
                    .collect()
            })
            .collect();
        println!("#{:<8} {}", record.id, columns.join(" | "));
    }

    if controller.has_next() {
        println!("More results: --page {}", snapshot.page + 1);
    }
    Ok(())
}
