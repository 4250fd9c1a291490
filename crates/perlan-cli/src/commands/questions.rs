//! The `perlan questions` commands.

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Table};

use perlan_core::model::{Category, Difficulty, Question};

use crate::app::App;

#[derive(Subcommand)]
pub enum QuestionsAction {
    /// List the question bank
    List {
        /// Only this category (slug or label)
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a question
    Add {
        /// Category slug
        #[arg(long)]
        category: String,

        /// Difficulty: easy, medium, hard
        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Question text
        #[arg(long)]
        text: String,

        /// Exactly three answer options, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        options: Vec<String>,

        /// Zero-based index of the correct option
        #[arg(long)]
        correct_index: usize,

        /// Fact shown after answering
        #[arg(long, default_value = "")]
        fact: String,

        /// Question id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a question by id
    Delete { id: String },
}

pub async fn execute(config_path: Option<&Path>, action: QuestionsAction) -> Result<()> {
    let app = App::open_synced(config_path).await?;

    match action {
        QuestionsAction::List { category } => {
            let filter: Option<Category> = category
                .map(|c| c.parse().map_err(anyhow::Error::msg))
                .transpose()?;
            list(&app, filter)?;
        }
        QuestionsAction::Add {
            category,
            difficulty,
            text,
            options,
            correct_index,
            fact,
            id,
        } => {
            let count = options.len();
            let options = <[String; 3]>::try_from(options)
                .map_err(|_| anyhow::anyhow!("expected 3 options, found {count}"))?;
            let question = Question {
                id: id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                category: category.parse().map_err(anyhow::Error::msg)?,
                difficulty: difficulty.parse::<Difficulty>().map_err(anyhow::Error::msg)?,
                text,
                options,
                correct_index,
                fact,
            };
            let id = question.id.clone();
            app.sync.add_question(question).await?;
            println!("Added question {id}");
        }
        QuestionsAction::Delete { id } => {
            if app.sync.delete_question(&id).await? {
                println!("Deleted question {id}");
            } else {
                println!("No local question {id}; removed from the remote if present.");
            }
        }
    }

    app.finish().await;
    Ok(())
}

fn list(app: &App, filter: Option<Category>) -> Result<()> {
    let questions: Vec<Question> = app
        .cache()
        .get::<Question>()?
        .into_iter()
        .filter(|q| filter.is_none_or(|c| q.category == c))
        .collect();

    if questions.is_empty() {
        println!("No questions.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "Difficulty", "Question", "Answer"]);
    for q in &questions {
        table.add_row(vec![
            Cell::new(&q.id),
            Cell::new(q.category),
            Cell::new(q.difficulty),
            Cell::new(&q.text),
            Cell::new(q.options.get(q.correct_index).map(String::as_str).unwrap_or("?")),
        ]);
    }
    println!("{table}");
    println!("{} questions", questions.len());
    Ok(())
}
