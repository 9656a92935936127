//! Dependent-field specifications and selection semantics
//!
//! A checkpoint's `Dependent` column encodes, per option index, which other
//! checkpoints become visible when that option is selected. Groups are
//! separated by `:` (one per option, in option order) and ids within a
//! group by `,`; a group of `"0"` means "no dependent".

use crate::schema::FieldType;

/// Parsed form of the `Dependent` column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DependentSpec {
    /// Legacy special case: the literal string `"6"` pins checkpoint 6 as
    /// the sole dependent regardless of the selected value.
    Fixed(Vec<u32>),
    /// One id group per option index.
    PerOption(Vec<Vec<u32>>),
}

impl DependentSpec {
    /// Parse the raw column value. Empty or whitespace-only input means the
    /// checkpoint has no dependents. Malformed id tokens are skipped.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if raw == "6" {
            return Some(DependentSpec::Fixed(vec![6]));
        }
        let groups = raw
            .split(':')
            .map(|group| {
                group
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty() && *id != "0")
                    .filter_map(|id| id.parse().ok())
                    .collect()
            })
            .collect();
        Some(DependentSpec::PerOption(groups))
    }

    /// All checkpoint ids this spec can ever make visible.
    pub fn all_ids(&self) -> Vec<u32> {
        match self {
            DependentSpec::Fixed(ids) => ids.clone(),
            DependentSpec::PerOption(groups) => {
                let mut ids: Vec<u32> = groups.iter().flatten().copied().collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
        }
    }

    /// Resolve the visible set for a selection, given the parent's options
    /// and selection mode.
    pub fn resolve(&self, options: &[String], selected: &[String], mode: SelectionMode) -> Vec<u32> {
        let groups = match self {
            DependentSpec::Fixed(ids) => return ids.clone(),
            DependentSpec::PerOption(groups) => groups,
        };
        let mut visible = Vec::new();
        let selected: Vec<&String> = match mode {
            SelectionMode::Single => selected.iter().take(1).collect(),
            SelectionMode::Multi => selected.iter().collect(),
        };
        for value in selected {
            let index = options.iter().position(|opt| opt == value);
            if let Some(index) = index {
                if let Some(group) = groups.get(index) {
                    for id in group {
                        if !visible.contains(id) {
                            visible.push(*id);
                        }
                    }
                }
            }
        }
        visible
    }
}

/// How a choice field's value maps onto its option list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Single,
    Multi,
}

/// Selection semantics for dependency resolution. Checkboxes are
/// multi-valued; dropdowns and radios become multi-valued when the
/// checkpoint carries the `"1"` multi-select marker in its correct-answer
/// column.
pub fn selection_mode(field_type: FieldType, correct: Option<&str>) -> SelectionMode {
    if field_type == FieldType::Checkbox || correct == Some("1") {
        SelectionMode::Multi
    } else {
        SelectionMode::Single
    }
}
