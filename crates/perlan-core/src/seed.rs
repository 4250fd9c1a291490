//! The bundled default dataset.
//!
//! Used to populate the local cache on first access and to seed an empty
//! remote store on first run.

use crate::entity::decode_entities;
use crate::model::{CourseModule, Question};

const BUNDLED_QUESTIONS: &str = include_str!("../seed/questions.json");
const BUNDLED_MODULES: &str = include_str!("../seed/modules.json");

/// Default content shipped with the application.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub questions: Vec<Question>,
    pub modules: Vec<CourseModule>,
}

impl SeedData {
    pub fn new(questions: Vec<Question>, modules: Vec<CourseModule>) -> Self {
        Self { questions, modules }
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Self {
        Self {
            questions: decode_bundled(BUNDLED_QUESTIONS),
            modules: decode_bundled(BUNDLED_MODULES),
        }
    }
}

fn decode_bundled<E: crate::entity::Entity>(raw: &str) -> Vec<E> {
    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => decode_entities(values).0,
        Err(e) => {
            tracing::error!("bundled {} seed is not a JSON array: {e}", E::NAME);
            Vec::new()
        }
    }
}
