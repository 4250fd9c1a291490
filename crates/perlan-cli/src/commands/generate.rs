//! The `perlan generate` command.

use std::path::Path;

use anyhow::Result;

use perlan_core::model::{Category, Difficulty};
use perlan_core::traits::GenerateRequest;
use perlan_remote::create_generator;

use crate::app::App;

pub async fn execute(
    config_path: Option<&Path>,
    category: String,
    difficulty: String,
    count: usize,
    model: Option<String>,
    save: bool,
) -> Result<()> {
    let category: Category = category.parse().map_err(anyhow::Error::msg)?;
    let difficulty: Difficulty = difficulty.parse().map_err(anyhow::Error::msg)?;
    if count == 0 {
        anyhow::bail!("--count must be at least 1");
    }

    let app = App::open(config_path)?;
    let Some(generator_config) = &app.config.generator else {
        anyhow::bail!("no generator configured; add a [generator] section to perlan.toml");
    };
    let generator = create_generator(generator_config)?;

    let mut request = GenerateRequest::new(category, difficulty, count);
    request.model = model;
    let questions = generator.generate(&request).await?;
    tracing::info!("{} drafted {} questions", generator.name(), questions.len());

    for (i, q) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, q.text);
        for (j, option) in q.options.iter().enumerate() {
            let marker = if j == q.correct_index { "*" } else { " " };
            println!("   {marker} {option}");
        }
        if !q.fact.is_empty() {
            println!("   Fact: {}", q.fact);
        }
    }

    if save {
        app.sync.sync_all().await;
        let saved = questions.len();
        for question in questions {
            app.sync.add_question(question).await?;
        }
        println!("Saved {saved} questions.");
    } else {
        println!("Dry run; pass --save to add them to the question bank.");
    }

    app.finish().await;
    Ok(())
}
