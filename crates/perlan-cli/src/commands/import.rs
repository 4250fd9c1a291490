//! The `perlan import` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use perlan_core::parser::{load_content_directory, parse_content_pack, validate_content_pack};

use crate::app::App;

pub async fn execute(config_path: Option<&Path>, path: PathBuf) -> Result<()> {
    let packs = if path.is_dir() {
        load_content_directory(&path)?
    } else {
        vec![parse_content_pack(&path)?]
    };

    let app = App::open_synced(config_path).await?;
    let (mut questions, mut modules) = (0, 0);

    for pack in packs {
        let warnings = validate_content_pack(&pack);
        if !warnings.is_empty() {
            println!(
                "{}: {} warning(s); run `perlan validate` for details",
                pack.name,
                warnings.len()
            );
        }
        for question in pack.questions {
            app.sync.add_question(question).await?;
            questions += 1;
        }
        for module in pack.modules {
            app.sync.upsert_module(module).await?;
            modules += 1;
        }
    }

    println!("Imported {questions} questions and {modules} modules.");
    app.finish().await;
    Ok(())
}
