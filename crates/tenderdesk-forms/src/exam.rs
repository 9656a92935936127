//! Exam mode
//!
//! Training forms double as exams: checkpoints carry a known-correct
//! answer, the schema carries a pass mark, and the elapsed time is shown
//! to the candidate. Correctness is a read-only view over the same answer
//! map and is independent of mandatory-field validation.

use std::time::{Duration, Instant};

use crate::dependent::{selection_mode, SelectionMode};
use crate::engine::FormEngine;

/// Monotonic exam clock. Runs from construction until [`ExamTimer::stop`]
/// freezes it at submission time.
#[derive(Clone, Debug)]
pub struct ExamTimer {
    started: Instant,
    frozen: Option<Duration>,
}

impl ExamTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            frozen: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.frozen.unwrap_or_else(|| self.started.elapsed())
    }

    /// Freeze the clock. Later calls keep the first frozen reading.
    pub fn stop(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.started.elapsed());
        }
    }

    pub fn is_running(&self) -> bool {
        self.frozen.is_none()
    }
}

/// Render a duration as `mm:ss`.
pub fn format_mmss(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Correct/total tally over the answerable checkpoints of a form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreCard {
    pub correct: usize,
    pub total: usize,
}

impl ScoreCard {
    /// Rounded percentage, 0 for an empty exam.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn passed(&self, pass_fraction: f64) -> bool {
        self.total > 0 && (self.correct as f64 / self.total as f64) >= pass_fraction
    }
}

impl FormEngine {
    /// Compare a checkpoint's current answer against its known-correct
    /// value: set equality for multi-select, string equality otherwise.
    /// Checkpoints without a correct value never score.
    pub fn is_correct(&self, id: u32) -> bool {
        let Some(cp) = self.schema().checkpoint(id) else {
            return false;
        };
        let Some(correct) = cp.correct.as_deref() else {
            return false;
        };
        let Some(answer) = self.answer(id) else {
            return false;
        };

        match selection_mode(cp.field_type, Some(correct)) {
            SelectionMode::Multi => {
                let expected: Vec<&str> = correct.split(',').map(str::trim).collect();
                let given = answer.as_list();
                expected.len() == given.len()
                    && expected.iter().all(|e| given.iter().any(|g| g == e))
                    && given.iter().all(|g| expected.iter().any(|e| e == g))
            }
            SelectionMode::Single => answer
                .as_text()
                .map(|text| text == correct)
                .unwrap_or(false),
        }
    }

    /// Tally correctness over every answerable checkpoint reachable from
    /// the form's pages. Completeness (mandatory validation) plays no part
    /// here.
    pub fn score(&self) -> ScoreCard {
        let mut card = ScoreCard::default();
        for id in self.schema().page_checkpoint_ids().collect::<Vec<_>>() {
            let Some(cp) = self.schema().checkpoint(id) else {
                continue;
            };
            if cp.field_type.is_static() {
                continue;
            }
            card.total += 1;
            if cp.correct.is_some() && self.is_correct(id) {
                card.correct += 1;
            }
        }
        card
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependent::DependentSpec;
    use crate::schema::{Checkpoint, FieldType, FormSchema};
    use std::collections::BTreeMap;

    fn exam_schema() -> FormSchema {
        let mut checkpoints = BTreeMap::new();
        checkpoints.insert(
            1,
            Checkpoint {
                id: 1,
                description: "Capital of France?".into(),
                field_type: FieldType::Radio,
                options: vec!["Paris".into(), "Lyon".into()],
                mandatory: true,
                editable: true,
                correct: Some("Paris".into()),
                dependent: None,
            },
        );
        checkpoints.insert(
            2,
            Checkpoint {
                id: 2,
                description: "Even numbers?".into(),
                field_type: FieldType::Checkbox,
                options: vec!["1".into(), "2".into(), "4".into()],
                mandatory: true,
                editable: true,
                correct: Some("2,4".into()),
                dependent: None,
            },
        );
        checkpoints.insert(
            3,
            Checkpoint {
                id: 3,
                description: "Instructions".into(),
                field_type: FieldType::Description,
                options: Vec::new(),
                mandatory: false,
                editable: false,
                correct: None,
                dependent: None,
            },
        );
        checkpoints.insert(
            4,
            Checkpoint {
                id: 4,
                description: "Free-text remark".into(),
                field_type: FieldType::Text,
                options: Vec::new(),
                mandatory: false,
                editable: true,
                correct: None,
                dependent: DependentSpec::parse(""),
            },
        );
        FormSchema {
            pages: vec![vec![1, 2, 3, 4]],
            checkpoints,
            types: BTreeMap::new(),
            pass_fraction: 0.6,
        }
    }

    #[test]
    fn test_single_answer_correctness() {
        let mut engine = FormEngine::new(exam_schema());
        assert!(!engine.is_correct(1));
        engine.set_answer(1, "Lyon").unwrap();
        assert!(!engine.is_correct(1));
        engine.set_answer(1, "Paris").unwrap();
        assert!(engine.is_correct(1));
    }

    #[test]
    fn test_multi_answer_set_equality() {
        let mut engine = FormEngine::new(exam_schema());
        engine.set_answer(2, vec!["4", "2"]).unwrap();
        assert!(engine.is_correct(2), "order must not matter");
        engine.set_answer(2, vec!["2"]).unwrap();
        assert!(!engine.is_correct(2), "subset is not equality");
        engine.set_answer(2, vec!["2", "4", "1"]).unwrap();
        assert!(!engine.is_correct(2), "superset is not equality");
    }

    #[test]
    fn test_score_counts_all_questions() {
        let mut engine = FormEngine::new(exam_schema());
        engine.set_answer(1, "Paris").unwrap();
        engine.set_answer(2, vec!["2", "4"]).unwrap();
        engine.set_answer(4, "anything").unwrap();
        let card = engine.score();
        // The description label is excluded; the ungraded free-text
        // question still counts toward the denominator
        assert_eq!(card, ScoreCard { correct: 2, total: 3 });
        assert_eq!(card.percent(), 67);
        assert!(card.passed(0.6));
        assert!(!card.passed(0.7));
    }

    #[test]
    fn test_timer_freezes_on_stop() {
        let mut timer = ExamTimer::start();
        assert!(timer.is_running());
        timer.stop();
        let first = timer.elapsed();
        timer.stop();
        assert_eq!(timer.elapsed(), first);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_mmss_formatting() {
        assert_eq!(format_mmss(Duration::from_secs(0)), "00:00");
        assert_eq!(format_mmss(Duration::from_secs(65)), "01:05");
        assert_eq!(format_mmss(Duration::from_secs(600)), "10:00");
    }
}
