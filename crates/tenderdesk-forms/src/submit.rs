//! Submission encoding
//!
//! Serializes the answer map into the two maps the submission endpoints
//! expect: plain values (scalar strings, lists joined with `,`, explicit
//! `null` for empty fields) and base64 data-URL attachments. Dependents
//! owned by a parent submit under the composite key `<parent>_<id>`.

use std::collections::{BTreeMap, BTreeSet};

use crate::answer::AnswerValue;
use crate::engine::FormEngine;
use crate::schema::FieldType;

/// Encoded form submission, ready for the sink. Values and attachments
/// travel as two separate requests; attachments only when non-empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubmissionPayload {
    pub values: BTreeMap<String, Option<String>>,
    pub attachments: BTreeMap<String, String>,
}

impl SubmissionPayload {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

impl FormEngine {
    /// Encode every answerable checkpoint reachable from the form's pages,
    /// plus currently visible dependents that are not page members.
    /// Header/Description labels never appear in the payload.
    pub fn build_submission(&self) -> SubmissionPayload {
        let mut payload = SubmissionPayload::default();
        let mut seen = BTreeSet::new();

        for id in self.schema().page_checkpoint_ids().collect::<Vec<_>>() {
            self.encode_checkpoint(id, &mut payload, &mut seen);
        }
        let dependents: Vec<u32> = self
            .visibility()
            .values()
            .flatten()
            .copied()
            .collect();
        for id in dependents {
            self.encode_checkpoint(id, &mut payload, &mut seen);
        }

        tracing::debug!(
            values = payload.values.len(),
            attachments = payload.attachments.len(),
            "submission encoded"
        );
        payload
    }

    fn encode_checkpoint(
        &self,
        id: u32,
        payload: &mut SubmissionPayload,
        seen: &mut BTreeSet<u32>,
    ) {
        if !seen.insert(id) {
            return;
        }
        let Some(cp) = self.schema().checkpoint(id) else {
            return;
        };
        if cp.field_type.is_static() {
            return;
        }

        let key = match self.parent_of(id) {
            Some(parent) => format!("{parent}_{id}"),
            None => id.to_string(),
        };

        match self.answer(id) {
            Some(AnswerValue::File(file)) => {
                payload.attachments.insert(key, file.to_data_url());
            }
            Some(value) if !value.is_empty() => {
                payload.values.insert(key, value.as_text());
            }
            _ => {
                // Empty or absent: files are omitted entirely, everything
                // else submits an explicit null.
                if cp.field_type != FieldType::PicCamera {
                    payload.values.insert(key, None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::FileAnswer;
    use crate::dependent::DependentSpec;
    use crate::schema::{Checkpoint, FormSchema};

    fn checkpoint(id: u32, field_type: FieldType) -> Checkpoint {
        Checkpoint {
            id,
            description: format!("Checkpoint {id}"),
            field_type,
            options: Vec::new(),
            mandatory: false,
            editable: true,
            correct: None,
            dependent: None,
        }
    }

    fn submission_schema() -> FormSchema {
        let mut checkpoints = BTreeMap::new();

        let mut parent = checkpoint(12, FieldType::Dropdown);
        parent.options = vec!["With detail".into(), "Without".into()];
        parent.dependent = DependentSpec::parse("45:0");
        checkpoints.insert(12, parent);

        checkpoints.insert(45, checkpoint(45, FieldType::Text));
        checkpoints.insert(50, checkpoint(50, FieldType::Checkbox));
        checkpoints.insert(51, checkpoint(51, FieldType::Text));
        checkpoints.insert(52, checkpoint(52, FieldType::PicCamera));
        checkpoints.insert(53, checkpoint(53, FieldType::Header));

        FormSchema {
            pages: vec![vec![12, 45, 50, 51, 52, 53]],
            checkpoints,
            types: BTreeMap::new(),
            pass_fraction: 0.7,
        }
    }

    #[test]
    fn test_composite_key_for_owned_dependent() {
        let mut engine = FormEngine::new(submission_schema());
        engine.set_answer(12, "With detail").unwrap();
        engine.set_answer(45, "detail text").unwrap();
        let payload = engine.build_submission();
        assert_eq!(
            payload.values.get("12_45"),
            Some(&Some("detail text".to_string()))
        );
        assert!(!payload.values.contains_key("45"));

        // Same checkpoint with no active parent submits under its own id
        engine.set_answer(12, "Without").unwrap();
        engine.set_answer(45, "standalone").unwrap();
        let payload = engine.build_submission();
        assert_eq!(
            payload.values.get("45"),
            Some(&Some("standalone".to_string()))
        );
        assert!(!payload.values.contains_key("12_45"));
    }

    #[test]
    fn test_empty_fields_submit_null() {
        let mut engine = FormEngine::new(submission_schema());
        engine.set_answer(51, "  ").unwrap();
        let payload = engine.build_submission();
        // Never-touched and answered-empty both serialize as explicit null
        assert_eq!(payload.values.get("50"), Some(&None));
        assert_eq!(payload.values.get("51"), Some(&None));
    }

    #[test]
    fn test_list_answers_join_with_commas() {
        let mut engine = FormEngine::new(submission_schema());
        engine.set_answer(50, vec!["A", "B"]).unwrap();
        let payload = engine.build_submission();
        assert_eq!(payload.values.get("50"), Some(&Some("A,B".to_string())));
    }

    #[test]
    fn test_file_answers_become_attachments() {
        let mut engine = FormEngine::new(submission_schema());
        engine
            .set_answer(52, AnswerValue::File(FileAnswer::new("s.png", "image/png", b"xy".to_vec())))
            .unwrap();
        let payload = engine.build_submission();
        assert!(payload.has_attachments());
        assert_eq!(
            payload.attachments.get("52"),
            Some(&"data:image/png;base64,eHk=".to_string())
        );
        assert!(!payload.values.contains_key("52"));
    }

    #[test]
    fn test_absent_file_is_omitted() {
        let engine = FormEngine::new(submission_schema());
        let payload = engine.build_submission();
        assert!(!payload.has_attachments());
        assert!(!payload.values.contains_key("52"));
    }

    #[test]
    fn test_static_labels_never_submit() {
        let engine = FormEngine::new(submission_schema());
        let payload = engine.build_submission();
        assert!(!payload.values.contains_key("53"));
        assert!(!payload.attachments.contains_key("53"));
    }

    #[test]
    fn test_dependent_only_checkpoints_submit_via_visibility() {
        let mut checkpoints = BTreeMap::new();
        let mut consent = checkpoint(3, FieldType::Radio);
        consent.options = vec!["Yes".into(), "No".into()];
        consent.dependent = DependentSpec::parse("6");
        checkpoints.insert(3, consent);
        checkpoints.insert(6, checkpoint(6, FieldType::Text));
        let schema = FormSchema {
            pages: vec![vec![3]],
            checkpoints,
            types: BTreeMap::new(),
            pass_fraction: 0.7,
        };

        let mut engine = FormEngine::new(schema);
        engine.set_answer(3, "Yes").unwrap();
        engine.set_answer(6, "remark").unwrap();
        let payload = engine.build_submission();
        // 6 is not a page member but is visible under parent 3
        assert_eq!(payload.values.get("3_6"), Some(&Some("remark".to_string())));
    }
}
