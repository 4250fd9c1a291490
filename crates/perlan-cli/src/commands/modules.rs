//! The `perlan modules` commands.

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use perlan_core::model::CourseModule;

use crate::app::App;

#[derive(Subcommand)]
pub enum ModulesAction {
    /// List learning modules
    List,

    /// Delete a learning module by id
    Delete { id: String },
}

pub async fn execute(config_path: Option<&Path>, action: ModulesAction) -> Result<()> {
    let app = App::open_synced(config_path).await?;

    match action {
        ModulesAction::List => {
            let modules = app.cache().get::<CourseModule>()?;
            if modules.is_empty() {
                println!("No learning modules.");
            } else {
                let mut table = Table::new();
                table.set_header(vec!["ID", "Category", "Units", "Description"]);
                for m in &modules {
                    table.add_row(vec![
                        Cell::new(&m.id),
                        Cell::new(m.category),
                        Cell::new(m.units.len()),
                        Cell::new(&m.description),
                    ]);
                }
                println!("{table}");
            }
        }
        ModulesAction::Delete { id } => {
            if app.sync.delete_module(&id).await? {
                println!("Deleted module {id}");
            } else {
                println!("No local module {id}; removed from the remote if present.");
            }
        }
    }

    app.finish().await;
    Ok(())
}
