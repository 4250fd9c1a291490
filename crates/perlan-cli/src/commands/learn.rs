//! The `perlan learn` command.

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use perlan_core::model::{CourseModule, UnitBody, UserProgress};
use perlan_core::progress::{complete_unit, is_unit_unlocked, module_completion, next_unit};
use perlan_core::traits::ContentRepository;

use crate::app::App;

pub async fn execute(
    config_path: Option<&Path>,
    user: String,
    module: Option<String>,
    complete: Option<String>,
) -> Result<()> {
    let app = App::open_synced(config_path).await?;
    let modules = app.cache().list_course_modules()?;
    let mut progress = app.cache().player_progress(&user)?;

    let Some(module_id) = module else {
        list_modules(&modules, &progress);
        return Ok(());
    };
    let module = modules
        .iter()
        .find(|m| m.id == module_id)
        .ok_or_else(|| anyhow::anyhow!("no learning module '{module_id}'"))?;

    if let Some(unit_id) = complete {
        if complete_unit(module, &unit_id, &mut progress)? {
            app.recorder.record_progress(&progress)?;
            println!("Completed {unit_id}.");
        } else {
            println!("{unit_id} was already complete.");
        }
    }

    show_module(module, &progress);
    app.finish().await;
    Ok(())
}

fn list_modules(modules: &[CourseModule], progress: &UserProgress) {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "Progress", "Description"]);
    for m in modules {
        let (done, total) = module_completion(m, progress);
        table.add_row(vec![
            Cell::new(&m.id),
            Cell::new(m.category),
            Cell::new(format!("{done}/{total}")),
            Cell::new(&m.description),
        ]);
    }
    println!("{table}");
}

fn show_module(module: &CourseModule, progress: &UserProgress) {
    let (done, total) = module_completion(module, progress);
    println!("{} ({}) {done}/{total} complete", module.id, module.category);
    println!("{}", module.description);

    for (i, unit) in module.units.iter().enumerate() {
        let status = if progress.is_complete(&unit.id) {
            "done"
        } else if is_unit_unlocked(module, i, progress) {
            "open"
        } else {
            "locked"
        };
        println!(
            "  [{status:>6}] {} {} ({}, {})",
            unit.id,
            unit.title,
            unit.body.kind(),
            unit.duration
        );
    }

    let Some(next) = next_unit(module, progress).and_then(|i| module.units.get(i)) else {
        println!("Module complete.");
        return;
    };
    println!("\nNext: {}", next.title);
    match &next.body {
        UnitBody::Text { content } => println!("{content}"),
        UnitBody::Flashcards { flashcards } => {
            for card in flashcards {
                println!("  {}  ->  {}", card.front, card.back);
            }
        }
        UnitBody::Quiz { quiz } => {
            println!("{}", quiz.question);
            for (i, option) in quiz.options.iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
        }
    }
}
