//! Correctness, streak progression and final score.
//!
//! Pure functions: no I/O and no clock.

use crate::engine::RoundQuestion;
use crate::model::PlayerAnswer;

/// What the player did on one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The on-screen option at this position was chosen.
    Presented(usize),
    /// The challenge timer ran out.
    TimedOut,
}

/// Current and best run of consecutive correct answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub max: u32,
}

impl StreakState {
    /// Advance the streak by one answer.
    pub fn record(self, is_correct: bool) -> Self {
        if is_correct {
            let current = self.current + 1;
            Self {
                current,
                max: self.max.max(current),
            }
        } else {
            Self {
                current: 0,
                max: self.max,
            }
        }
    }
}

/// Score one selection against a round question.
///
/// The presentation index is mapped back through the question's option
/// order, so the recorded index and correctness refer to the stored option
/// ordering. A timeout is never correct.
pub fn record_answer(
    question: &RoundQuestion,
    selection: Selection,
    streak: StreakState,
    time_taken: u32,
) -> (PlayerAnswer, StreakState) {
    let original = match selection {
        Selection::Presented(index) => question.order.to_original(index),
        Selection::TimedOut => None,
    };
    let is_correct = original == Some(question.question.correct_index);

    let answer = PlayerAnswer {
        question_id: question.question.id.clone(),
        selected_option_index: original,
        is_correct,
        time_taken,
    };
    (answer, streak.record(is_correct))
}

/// Final score: the number of correct answers.
///
/// Call once, with the complete answer list, when the round completes.
pub fn finalize(answers: &[PlayerAnswer]) -> u32 {
    answers.iter().filter(|a| a.is_correct).count() as u32
}

/// Longest run of consecutive correct answers.
pub fn longest_streak(answers: &[PlayerAnswer]) -> u32 {
    answers
        .iter()
        .fold(StreakState::default(), |s, a| s.record(a.is_correct))
        .max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Difficulty, Question};
    use crate::random::OptionOrder;

    fn round_question(order: [usize; 3]) -> RoundQuestion {
        RoundQuestion {
            question: Question {
                id: "q".into(),
                category: Category::Water,
                difficulty: Difficulty::Medium,
                text: "What heats most homes?".into(),
                options: ["Coal".into(), "Geothermal water".into(), "Peat".into()],
                correct_index: 1,
                fact: "90%".into(),
            },
            order: OptionOrder::from_permutation(order).unwrap(),
        }
    }

    fn answer(is_correct: bool) -> PlayerAnswer {
        PlayerAnswer {
            question_id: "q".into(),
            selected_option_index: Some(0),
            is_correct,
            time_taken: 1,
        }
    }

    #[test]
    fn presentation_index_is_mapped_to_original() {
        // Shown as [Peat, Coal, Geothermal water].
        let q = round_question([2, 0, 1]);
        let (a, streak) = record_answer(&q, Selection::Presented(2), StreakState::default(), 4);
        assert!(a.is_correct);
        assert_eq!(a.selected_option_index, Some(1));
        assert_eq!(a.time_taken, 4);
        assert_eq!(streak, StreakState { current: 1, max: 1 });

        let (wrong, _) = record_answer(&q, Selection::Presented(0), streak, 2);
        assert!(!wrong.is_correct);
        assert_eq!(wrong.selected_option_index, Some(2));
    }

    #[test]
    fn timeout_is_never_correct_and_resets_streak() {
        let q = round_question([0, 1, 2]);
        let before = StreakState { current: 3, max: 3 };
        let (a, after) = record_answer(&q, Selection::TimedOut, before, 15);
        assert_eq!(a.selected_option_index, None);
        assert!(!a.is_correct);
        assert_eq!(after, StreakState { current: 0, max: 3 });
    }

    #[test]
    fn out_of_range_presentation_is_incorrect() {
        let q = round_question([0, 1, 2]);
        let (a, _) = record_answer(&q, Selection::Presented(5), StreakState::default(), 0);
        assert!(!a.is_correct);
        assert_eq!(a.selected_option_index, None);
    }

    #[test]
    fn scenario_eight_of_ten_with_run_of_four() {
        let pattern = [true, true, false, true, true, true, false, true, true, true];
        let answers: Vec<_> = pattern.iter().map(|&c| answer(c)).collect();
        assert_eq!(finalize(&answers), 8);
        assert_eq!(longest_streak(&answers), 3);

        let pattern = [true, true, false, true, true, true, true, false, true, true];
        let answers: Vec<_> = pattern.iter().map(|&c| answer(c)).collect();
        assert_eq!(finalize(&answers), 8);
        assert_eq!(longest_streak(&answers), 4);
    }

    #[test]
    fn max_streak_never_decreases() {
        let mut state = StreakState::default();
        let mut observed = Vec::new();
        for correct in [true, true, true, false, true, false, false, true, true] {
            let previous_max = state.max;
            state = state.record(correct);
            assert!(state.max >= previous_max);
            if !correct {
                assert_eq!(state.current, 0);
            }
            observed.push(state.current);
        }
        assert!(observed.iter().all(|&s| s <= state.max));
        assert_eq!(state.max, 3);
    }

    #[test]
    fn empty_round_scores_zero() {
        assert_eq!(finalize(&[]), 0);
        assert_eq!(longest_streak(&[]), 0);
    }
}
