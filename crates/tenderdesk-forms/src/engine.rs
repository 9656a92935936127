//! The checkpoint form engine
//!
//! One `FormEngine` owns the state of a single form instance: the
//! immutable schema, the answer map, the dependent-visibility map and the
//! validation-error set. Schema is loaded once; answers and visibility are
//! discarded with the instance unless explicitly submitted.

use std::collections::{BTreeMap, BTreeSet};

use crate::answer::AnswerValue;
use crate::dependent::{selection_mode, DependentSpec, SelectionMode};
use crate::derived::DerivedField;
use crate::schema::{Checkpoint, FormSchema};
use crate::{FormsError, Result};

/// Outcome of a validation pass. The engine does not mutate its own error
/// state here; callers apply the failing set via [`FormEngine::mark_errors`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Checkpoint ids that failed the mandatory check, in page order.
    pub errors: Vec<u32>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One top-level field on a page together with its currently visible
/// dependents, ready for a front end to render.
#[derive(Clone, Debug)]
pub struct PageEntry<'a> {
    pub checkpoint: &'a Checkpoint,
    pub dependents: Vec<&'a Checkpoint>,
}

/// Schema-driven multi-page form state.
pub struct FormEngine {
    schema: FormSchema,
    answers: BTreeMap<u32, AnswerValue>,
    visibility: BTreeMap<u32, Vec<u32>>,
    errors: BTreeSet<u32>,
    derived: Vec<DerivedField>,
    current_page: usize,
}

impl FormEngine {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            answers: BTreeMap::new(),
            visibility: BTreeMap::new(),
            errors: BTreeSet::new(),
            derived: Vec::new(),
            current_page: 0,
        }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn answers(&self) -> &BTreeMap<u32, AnswerValue> {
        &self.answers
    }

    pub fn answer(&self, id: u32) -> Option<&AnswerValue> {
        self.answers.get(&id)
    }

    /// Register a derived-field hook. Whenever any of its inputs changes,
    /// the hook recomputes and the result is stored under its target id.
    pub fn register_derived(&mut self, field: DerivedField) {
        self.derived.push(field);
    }

    /// Store an answer, clear the field's pending error flag and recompute
    /// dependent visibility, all in one synchronous step. Static labels and
    /// read-only fields reject input; ids outside the schema are refused.
    pub fn set_answer(&mut self, id: u32, value: impl Into<AnswerValue>) -> Result<()> {
        let cp = self
            .schema
            .checkpoint(id)
            .ok_or(FormsError::UnknownCheckpoint(id))?;
        if cp.field_type.is_static() {
            return Err(FormsError::StaticField(id));
        }
        if !cp.editable {
            return Err(FormsError::ReadOnlyField(id));
        }
        self.apply_answer(id, value.into());
        self.run_derived(id);
        Ok(())
    }

    fn apply_answer(&mut self, id: u32, value: AnswerValue) {
        self.answers.insert(id, value.clone());
        self.errors.remove(&id);
        self.resolve_dependents(id, &value);
    }

    /// Recompute every derived field whose inputs include the changed id.
    /// Derived targets may be read-only in the schema; the computed value
    /// is stored through the internal path.
    fn run_derived(&mut self, changed: u32) {
        let updates: Vec<(u32, String)> = self
            .derived
            .iter()
            .filter(|field| field.inputs.contains(&changed))
            .map(|field| (field.target, field.compute(&self.answers)))
            .collect();
        for (target, value) in updates {
            if self
                .answers
                .get(&target)
                .and_then(AnswerValue::as_text)
                .as_deref()
                == Some(value.as_str())
            {
                continue;
            }
            tracing::debug!(checkpoint = target, %value, "derived field recomputed");
            self.apply_answer(target, AnswerValue::Text(value));
        }
    }

    /// Rebuild the visibility entry for `parent_id` from the given value,
    /// then discard answers of checkpoints the change just hid.
    pub fn resolve_dependents(&mut self, parent_id: u32, value: &AnswerValue) {
        let Some(cp) = self.schema.checkpoint(parent_id) else {
            return;
        };
        let Some(spec) = &cp.dependent else {
            return;
        };

        let visible = match spec {
            DependentSpec::Fixed(ids) => ids.clone(),
            DependentSpec::PerOption(_) => {
                // Only choice types drive per-option resolution.
                if !cp.field_type.is_choice() {
                    return;
                }
                let mode = selection_mode(cp.field_type, cp.correct.as_deref());
                // Single-select compares the raw scalar against the option
                // list; only multi-select normalizes CSV text to a list.
                let selected = match mode {
                    SelectionMode::Single => {
                        value.as_text().map(|text| vec![text]).unwrap_or_default()
                    }
                    SelectionMode::Multi => value.as_list(),
                };
                spec.resolve(&cp.options, &selected, mode)
            }
        };

        tracing::debug!(parent = parent_id, ?visible, "dependents resolved");
        let previous = self.visibility.insert(parent_id, visible).unwrap_or_default();
        self.discard_hidden(&previous);
    }

    /// Discard-on-hide policy: a checkpoint that is no longer visible under
    /// any parent and is not a page member has no way back onto the form,
    /// so its stale answer and error flag are dropped.
    fn discard_hidden(&mut self, candidates: &[u32]) {
        for &id in candidates {
            if self.is_visible_dependent(id) || self.schema.is_page_member(id) {
                continue;
            }
            if self.answers.remove(&id).is_some() {
                tracing::debug!(checkpoint = id, "discarded answer of hidden dependent");
            }
            self.errors.remove(&id);
        }
    }

    /// True when the checkpoint currently appears in any parent's visible
    /// dependent list.
    pub fn is_visible_dependent(&self, id: u32) -> bool {
        self.visibility.values().any(|deps| deps.contains(&id))
    }

    /// Owning parent of a visible dependent. When two parents claim the
    /// same dependent, the smallest parent id wins (deterministic map
    /// order, not insertion order).
    pub fn parent_of(&self, id: u32) -> Option<u32> {
        self.visibility
            .iter()
            .find(|(_, deps)| deps.contains(&id))
            .map(|(parent, _)| *parent)
    }

    pub fn visible_dependents(&self, parent_id: u32) -> &[u32] {
        self.visibility
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn visibility(&self) -> &BTreeMap<u32, Vec<u32>> {
        &self.visibility
    }

    /// Mandatory-field check over an explicit id set. Static labels are
    /// skipped; ids that resolve to no checkpoint render nothing and are
    /// skipped likewise.
    pub fn validate_ids<I: IntoIterator<Item = u32>>(&self, ids: I) -> ValidationReport {
        let mut errors = Vec::new();
        for id in ids {
            let Some(cp) = self.schema.checkpoint(id) else {
                continue;
            };
            if cp.field_type.is_static() || !cp.mandatory {
                continue;
            }
            let missing = self.answers.get(&id).map_or(true, AnswerValue::is_empty);
            if missing {
                errors.push(id);
            }
        }
        ValidationReport { errors }
    }

    /// Validate a single page by index.
    pub fn validate_page(&self, page_index: usize) -> ValidationReport {
        let ids = self
            .schema
            .pages
            .get(page_index)
            .cloned()
            .unwrap_or_default();
        self.validate_ids(ids)
    }

    /// Validate every page of the form.
    pub fn validate_all(&self) -> ValidationReport {
        self.validate_ids(self.schema.page_checkpoint_ids().collect::<Vec<_>>())
    }

    /// Apply a failing id set to the engine's error state.
    pub fn mark_errors(&mut self, ids: &[u32]) {
        self.errors.extend(ids.iter().copied());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn has_error(&self, id: u32) -> bool {
        self.errors.contains(&id)
    }

    pub fn errors(&self) -> &BTreeSet<u32> {
        &self.errors
    }

    // Page navigation

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.schema.pages.len()
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page + 1 >= self.page_count()
    }

    pub fn next_page(&mut self) {
        if !self.is_last_page() {
            self.current_page += 1;
        }
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1);
    }

    /// Render-ready view of a page: top-level fields in page order, each
    /// with its currently visible dependents. Fields claimed as someone's
    /// dependent are listed under their parent, not at top level; page ids
    /// that resolve to no checkpoint render nothing.
    pub fn page_view(&self, page_index: usize) -> Vec<PageEntry<'_>> {
        let Some(page) = self.schema.pages.get(page_index) else {
            return Vec::new();
        };
        page.iter()
            .filter_map(|&id| self.schema.checkpoint(id))
            .filter(|cp| !self.is_visible_dependent(cp.id))
            .map(|cp| PageEntry {
                checkpoint: cp,
                dependents: self
                    .visible_dependents(cp.id)
                    .iter()
                    .filter_map(|&dep| self.schema.checkpoint(dep))
                    .collect(),
            })
            .collect()
    }
}
