//! Gating of learning units.
//!
//! Units in a module form a strict sequence: unit 0 is always open and unit
//! `i` opens once unit `i - 1` is complete.

use crate::error::QuizError;
use crate::model::{CourseModule, UserProgress};

/// Whether the unit at `index` may be started.
pub fn is_unit_unlocked(module: &CourseModule, index: usize, progress: &UserProgress) -> bool {
    match index {
        0 => !module.units.is_empty(),
        i => module
            .units
            .get(i - 1)
            .is_some_and(|previous| i < module.units.len() && progress.is_complete(&previous.id)),
    }
}

/// Mark a unit complete.
///
/// Returns `Ok(false)` if it was already complete.
pub fn complete_unit(
    module: &CourseModule,
    unit_id: &str,
    progress: &mut UserProgress,
) -> Result<bool, QuizError> {
    let index = module
        .units
        .iter()
        .position(|u| u.id == unit_id)
        .ok_or_else(|| QuizError::UnknownUnit {
            module_id: module.id.clone(),
            unit_id: unit_id.to_string(),
        })?;

    if progress.is_complete(unit_id) {
        return Ok(false);
    }
    if !is_unit_unlocked(module, index, progress) {
        return Err(QuizError::UnitLocked {
            unit_id: unit_id.to_string(),
        });
    }
    progress.completed_unit_ids.push(unit_id.to_string());
    Ok(true)
}

/// `(completed, total)` units of a module.
pub fn module_completion(module: &CourseModule, progress: &UserProgress) -> (usize, usize) {
    let done = module
        .units
        .iter()
        .filter(|u| progress.is_complete(&u.id))
        .count();
    (done, module.units.len())
}

/// Index of the first unit not yet complete, if any.
pub fn next_unit(module: &CourseModule, progress: &UserProgress) -> Option<usize> {
    module
        .units
        .iter()
        .position(|u| !progress.is_complete(&u.id))
}
