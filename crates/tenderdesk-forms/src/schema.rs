//! Schema wire records and the normalized in-memory form schema
//!
//! The server describes a form as three resources: a menu row carrying the
//! page layout string, a flat checkpoint list, and a type list. All three
//! are normalized exactly once at load time; the engine never touches raw
//! type names or layout strings afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dependent::DependentSpec;

/// Menu row from the page-layout resource. `CheckpointId` is the
/// two-level layout string: pages separated by `;`, checkpoint ids within
/// a page by `,`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuRecord {
    #[serde(rename = "MenuId", default)]
    pub menu_id: Option<u32>,
    #[serde(rename = "CheckpointId")]
    pub checkpoint_layout: String,
    /// Exam pass mark in percent. The column is spelled `Paas` upstream.
    #[serde(rename = "Paas", default)]
    pub pass_percent: Option<serde_json::Value>,
}

/// Checkpoint row from the checkpoint-list resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckpointRecord {
    #[serde(rename = "CheckpointId")]
    pub checkpoint_id: u32,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "TypeId")]
    pub type_id: u32,
    #[serde(rename = "Options", default)]
    pub options: Option<String>,
    #[serde(rename = "Mandatory", default)]
    pub mandatory: i64,
    #[serde(rename = "Editable", default)]
    pub editable: i64,
    #[serde(rename = "Correct", default)]
    pub correct: Option<String>,
    #[serde(rename = "Dependent", default)]
    pub dependent: Option<String>,
}

/// Type row from the type-list resource.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeRecord {
    #[serde(rename = "TypeId")]
    pub type_id: u32,
    #[serde(rename = "Type")]
    pub name: String,
}

/// Closed set of field value domains. Resolved from the type list once at
/// schema load; matching is exact on the trimmed, lowercased name so a
/// future `"Subheader"` type cannot false-positive on `"header"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    Email,
    Number,
    Digit,
    LongText,
    Date,
    Dropdown,
    Radio,
    Checkbox,
    PicCamera,
    Header,
    Description,
    /// Unrecognized type names render as a disabled placeholder instead of
    /// failing the whole form.
    Unknown,
}

impl FieldType {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => FieldType::Text,
            "email" => FieldType::Email,
            "number" => FieldType::Number,
            "digit" => FieldType::Digit,
            "long text" => FieldType::LongText,
            "date" => FieldType::Date,
            "dropdown" => FieldType::Dropdown,
            "radio" => FieldType::Radio,
            "checkbox" => FieldType::Checkbox,
            "pic/camera" => FieldType::PicCamera,
            "header" => FieldType::Header,
            "description" => FieldType::Description,
            _ => FieldType::Unknown,
        }
    }

    /// Header/Description render as static labels and are excluded from
    /// answers, validation and submission.
    pub fn is_static(&self) -> bool {
        matches!(self, FieldType::Header | FieldType::Description)
    }

    /// Choice types are the only ones that drive dependent visibility.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Dropdown | FieldType::Radio | FieldType::Checkbox
        )
    }
}

/// A single form field definition, normalized.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub id: u32,
    pub description: String,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub mandatory: bool,
    pub editable: bool,
    pub correct: Option<String>,
    pub dependent: Option<DependentSpec>,
}

/// Immutable normalized schema: ordered pages, checkpoint map, type map
/// and the exam pass fraction.
#[derive(Clone, Debug)]
pub struct FormSchema {
    pub pages: Vec<Vec<u32>>,
    pub checkpoints: BTreeMap<u32, Checkpoint>,
    pub types: BTreeMap<u32, FieldType>,
    pub pass_fraction: f64,
}

pub const DEFAULT_PASS_FRACTION: f64 = 0.7;

impl FormSchema {
    /// Normalize the three wire resources into the immutable schema used
    /// for the lifetime of a form instance.
    pub fn from_wire(
        menu: &MenuRecord,
        checkpoints: Vec<CheckpointRecord>,
        types: Vec<TypeRecord>,
    ) -> Self {
        let type_map: BTreeMap<u32, FieldType> = types
            .iter()
            .map(|t| (t.type_id, FieldType::from_name(&t.name)))
            .collect();

        let mut checkpoint_map = BTreeMap::new();
        for record in checkpoints {
            let field_type = type_map
                .get(&record.type_id)
                .copied()
                .unwrap_or(FieldType::Unknown);
            let options = record
                .options
                .as_deref()
                .map(split_options)
                .unwrap_or_default();
            let dependent = record.dependent.as_deref().and_then(DependentSpec::parse);
            let correct = record
                .correct
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            checkpoint_map.insert(
                record.checkpoint_id,
                Checkpoint {
                    id: record.checkpoint_id,
                    description: record.description,
                    field_type,
                    options,
                    mandatory: record.mandatory == 1,
                    editable: record.editable == 1,
                    correct,
                    dependent,
                },
            );
        }

        let schema = Self {
            pages: parse_page_layout(&menu.checkpoint_layout),
            checkpoints: checkpoint_map,
            types: type_map,
            pass_fraction: parse_pass_fraction(menu.pass_percent.as_ref()),
        };
        schema.warn_on_dependent_overlap();
        schema
    }

    pub fn checkpoint(&self, id: u32) -> Option<&Checkpoint> {
        self.checkpoints.get(&id)
    }

    /// Pure type lookup; unknown ids never fail.
    pub fn field_type(&self, type_id: u32) -> FieldType {
        self.types.get(&type_id).copied().unwrap_or(FieldType::Unknown)
    }

    pub fn is_page_member(&self, id: u32) -> bool {
        self.pages.iter().any(|page| page.contains(&id))
    }

    /// Checkpoint ids of every page in page order, flattened.
    pub fn page_checkpoint_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().flatten().copied()
    }

    /// Count of answerable (non-static) checkpoints reachable from pages;
    /// the exam score denominator.
    pub fn question_count(&self) -> usize {
        self.page_checkpoint_ids()
            .filter_map(|id| self.checkpoint(id))
            .filter(|cp| !cp.field_type.is_static())
            .count()
    }

    /// A dependent claimed by more than one parent's spec has ambiguous
    /// ownership at submission time; flag it for the schema author.
    fn warn_on_dependent_overlap(&self) {
        let mut owners: BTreeMap<u32, u32> = BTreeMap::new();
        for cp in self.checkpoints.values() {
            if let Some(spec) = &cp.dependent {
                for dep in spec.all_ids() {
                    if let Some(other) = owners.insert(dep, cp.id) {
                        if other != cp.id {
                            tracing::warn!(
                                dependent = dep,
                                parents = ?(other, cp.id),
                                "checkpoint is a dependent of multiple parents"
                            );
                        }
                    }
                }
            }
        }
    }
}

fn split_options(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|opt| opt.trim().to_string()).collect()
}

/// Parse the two-level page layout string. Unparseable id tokens are
/// skipped with a warning; empty pages are dropped.
pub fn parse_page_layout(layout: &str) -> Vec<Vec<u32>> {
    layout
        .split(';')
        .map(|page| {
            page.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .filter_map(|token| match token.parse() {
                    Ok(id) => Some(id),
                    Err(_) => {
                        tracing::warn!(token, "skipping unparseable checkpoint id in page layout");
                        None
                    }
                })
                .collect::<Vec<u32>>()
        })
        .filter(|page| !page.is_empty())
        .collect()
}

fn parse_pass_fraction(raw: Option<&serde_json::Value>) -> f64 {
    let percent = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    match percent {
        Some(p) if p > 0.0 => p / 100.0,
        _ => DEFAULT_PASS_FRACTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_layout_parsing() {
        assert_eq!(
            parse_page_layout("1,2,3;4,5"),
            vec![vec![1, 2, 3], vec![4, 5]]
        );
        assert_eq!(parse_page_layout("7"), vec![vec![7]]);
        // Bad tokens are skipped, empty pages dropped
        assert_eq!(parse_page_layout("1,x;;2"), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_field_type_resolution() {
        assert_eq!(FieldType::from_name("Text"), FieldType::Text);
        assert_eq!(FieldType::from_name(" long text "), FieldType::LongText);
        assert_eq!(FieldType::from_name("PIC/CAMERA"), FieldType::PicCamera);
        assert_eq!(FieldType::from_name("Header"), FieldType::Header);
        // Exact matching: no substring false positives
        assert_eq!(FieldType::from_name("Subheader"), FieldType::Unknown);
        assert_eq!(FieldType::from_name("Holographic"), FieldType::Unknown);
    }

    #[test]
    fn test_from_wire_normalization() {
        let menu = MenuRecord {
            menu_id: Some(1),
            checkpoint_layout: "10,11;12".into(),
            pass_percent: Some(serde_json::Value::String("80".into())),
        };
        let checkpoints = vec![
            CheckpointRecord {
                checkpoint_id: 10,
                description: "Name".into(),
                type_id: 1,
                options: None,
                mandatory: 1,
                editable: 1,
                correct: None,
                dependent: None,
            },
            CheckpointRecord {
                checkpoint_id: 11,
                description: "Category".into(),
                type_id: 5,
                options: Some("A, B ,C".into()),
                mandatory: 0,
                editable: 1,
                correct: Some(" ".into()),
                dependent: Some("1,2:0:3".into()),
            },
        ];
        let types = vec![
            TypeRecord { type_id: 1, name: "Text".into() },
            TypeRecord { type_id: 5, name: "Dropdown".into() },
        ];

        let schema = FormSchema::from_wire(&menu, checkpoints, types);
        assert_eq!(schema.pages, vec![vec![10, 11], vec![12]]);
        assert!((schema.pass_fraction - 0.8).abs() < f64::EPSILON);

        let name = schema.checkpoint(10).unwrap();
        assert_eq!(name.field_type, FieldType::Text);
        assert!(name.mandatory);

        let category = schema.checkpoint(11).unwrap();
        assert_eq!(category.options, vec!["A", "B", "C"]);
        // Whitespace-only correct answers normalize away
        assert_eq!(category.correct, None);
        assert!(category.dependent.is_some());

        // Checkpoint 12 is referenced by a page but undefined: lookups
        // resolve to nothing rather than erroring
        assert!(schema.checkpoint(12).is_none());
        assert_eq!(schema.field_type(99), FieldType::Unknown);
    }

    #[test]
    fn test_pass_fraction_default() {
        let menu = MenuRecord {
            menu_id: None,
            checkpoint_layout: "1".into(),
            pass_percent: None,
        };
        let schema = FormSchema::from_wire(&menu, vec![], vec![]);
        assert!((schema.pass_fraction - DEFAULT_PASS_FRACTION).abs() < f64::EPSILON);
    }
}
