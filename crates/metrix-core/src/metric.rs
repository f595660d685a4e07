//! Metric record schema and validator.
//!
//! `MetricDraft` is the loose, client-supplied shape (every field optional,
//! values kept as raw JSON). `MetricDraft::validate` turns it into
//! `ValidFields` or a `ValidationErrors` listing every failing field.
//! `Metric` is the stored shape and only ever holds validated values.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Upper bound for `description`, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 250;

/// Store-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricId(Uuid);

impl MetricId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a path segment. Returns `None` for anything that is not a
    /// well-formed id.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for MetricId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a metric's value is interpreted. Not evaluated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationType {
    Count,
    Percentage,
    Time,
}

impl CalculationType {
    pub const ALL: [CalculationType; 3] = [
        CalculationType::Count,
        CalculationType::Percentage,
        CalculationType::Time,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CalculationType::Count => "count",
            CalculationType::Percentage => "percentage",
            CalculationType::Time => "time",
        }
    }

    /// Case-sensitive lookup of the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// A stored metric definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub id: MetricId,
    pub name: String,
    pub description: String,
    pub calculation_type: CalculationType,
    pub formula: String,
    pub created_at: DateTime<Utc>,
}

impl Metric {
    /// Stamp validated fields with identity and creation time.
    pub fn from_fields(id: MetricId, created_at: DateTime<Utc>, fields: ValidFields) -> Self {
        Self {
            id,
            name: fields.name,
            description: fields.description,
            calculation_type: fields.calculation_type,
            formula: fields.formula,
            created_at,
        }
    }

    /// Overlay the present fields of `patch`, re-validate the merged record,
    /// and return it. `id` and `created_at` are carried over untouched.
    pub fn merged(&self, patch: MetricDraft) -> Result<Metric, ValidationErrors> {
        let base = MetricDraft::from(self);
        let present = |v: Option<Value>| v.filter(|v| !v.is_null());
        let merged = MetricDraft {
            name: present(patch.name).or(base.name),
            description: present(patch.description).or(base.description),
            calculation_type: present(patch.calculation_type).or(base.calculation_type),
            formula: present(patch.formula).or(base.formula),
        };
        let fields = merged.validate()?;
        Ok(Metric::from_fields(self.id, self.created_at, fields))
    }

    /// Check a record that did not come through `MetricDraft` (e.g. loaded
    /// from disk). Beyond the draft rules, the stored values must already be
    /// in normalised form: a trimmed name and a description within bounds.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let fields = MetricDraft::from(self).validate()?;
        let mut errors = ValidationErrors::default();
        if fields.name != self.name {
            errors.push(FieldError::untrimmed("name"));
        }
        if fields.description != self.description {
            errors.push(FieldError::too_long("description"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Client-supplied create body or update patch.
///
/// Values are kept as raw JSON so a wrongly typed field becomes a field error
/// instead of a body parse failure. Unknown keys (`id`, `_id`, `createdAt`,
/// ...) are ignored; `null` reads as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDraft {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub calculation_type: Option<Value>,
    #[serde(default)]
    pub formula: Option<Value>,
}

impl From<&Metric> for MetricDraft {
    fn from(m: &Metric) -> Self {
        Self {
            name: Some(m.name.as_str().into()),
            description: Some(m.description.as_str().into()),
            calculation_type: Some(m.calculation_type.as_str().into()),
            formula: Some(m.formula.as_str().into()),
        }
    }
}

/// Normalised, schema-valid field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    pub name: String,
    pub description: String,
    pub calculation_type: CalculationType,
    pub formula: String,
}

/// A draft value read as text. Scalars are cast (`5` -> `"5"`,
/// `true` -> `"true"`); arrays and objects cannot be.
enum Text<'a> {
    Absent,
    Value(Cow<'a, str>),
    Uncastable,
}

fn as_text(v: Option<&Value>) -> Text<'_> {
    match v {
        None | Some(Value::Null) => Text::Absent,
        Some(Value::String(s)) => Text::Value(Cow::Borrowed(s)),
        Some(Value::Number(n)) => Text::Value(Cow::Owned(n.to_string())),
        Some(Value::Bool(b)) => Text::Value(Cow::Owned(b.to_string())),
        Some(Value::Array(_) | Value::Object(_)) => Text::Uncastable,
    }
}

/// Required, non-blank text field. Returns the untrimmed value.
fn required_text(path: &'static str, v: Option<&Value>, errors: &mut ValidationErrors) -> String {
    match as_text(v) {
        Text::Value(s) if !s.trim().is_empty() => s.into_owned(),
        Text::Uncastable => {
            errors.push(FieldError::wrong_type(path));
            String::new()
        }
        _ => {
            errors.push(FieldError::required(path));
            String::new()
        }
    }
}

impl MetricDraft {
    /// Validate every field and collect all violations.
    pub fn validate(&self) -> Result<ValidFields, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_text("name", self.name.as_ref(), &mut errors);
        let formula = required_text("formula", self.formula.as_ref(), &mut errors);

        let calculation_type = match as_text(self.calculation_type.as_ref()) {
            Text::Absent => {
                errors.push(FieldError::required("calculationType"));
                None
            }
            Text::Value(raw) => {
                let parsed = CalculationType::parse(&raw);
                if parsed.is_none() {
                    errors.push(FieldError::not_in_enum("calculationType", &raw));
                }
                parsed
            }
            Text::Uncastable => {
                let raw = self
                    .calculation_type
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_default();
                errors.push(FieldError::not_in_enum("calculationType", &raw));
                None
            }
        };

        let description = match as_text(self.description.as_ref()) {
            Text::Absent => String::new(),
            Text::Value(s) => clip_description(&s),
            Text::Uncastable => {
                errors.push(FieldError::wrong_type("description"));
                String::new()
            }
        };

        match calculation_type {
            Some(calculation_type) if errors.is_empty() => Ok(ValidFields {
                name: name.trim().to_string(),
                description,
                calculation_type,
                formula,
            }),
            _ => Err(errors),
        }
    }
}

fn clip_description(s: &str) -> String {
    match s.char_indices().nth(DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => s[..cut].to_string(),
        None => s.to_string(),
    }
}

/// Kind of schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldErrorKind {
    Required,
    Enum,
    /// Array or object where text was expected.
    Type,
    /// Stored value longer than its bound.
    MaxLength,
    /// Stored value with surrounding whitespace.
    Untrimmed,
}

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: &'static str,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    fn new(path: &'static str, kind: FieldErrorKind, message: String) -> Self {
        Self { path, kind, message }
    }

    fn required(path: &'static str) -> Self {
        Self::new(path, FieldErrorKind::Required, format!("{path} is required"))
    }

    fn wrong_type(path: &'static str) -> Self {
        Self::new(path, FieldErrorKind::Type, format!("{path} must be a string"))
    }

    fn not_in_enum(path: &'static str, got: &str) -> Self {
        let allowed = CalculationType::ALL.map(CalculationType::as_str).join(", ");
        Self::new(
            path,
            FieldErrorKind::Enum,
            format!("{path} must be one of {allowed} (got {got:?})"),
        )
    }

    fn too_long(path: &'static str) -> Self {
        Self::new(
            path,
            FieldErrorKind::MaxLength,
            format!("{path} exceeds {DESCRIPTION_MAX_CHARS} characters"),
        )
    }

    fn untrimmed(path: &'static str) -> Self {
        Self::new(
            path,
            FieldErrorKind::Untrimmed,
            format!("{path} has surrounding whitespace"),
        )
    }
}

/// All field violations of one candidate record, keyed by field path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, e: FieldError) {
        self.fields.insert(e.path, e);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.fields.get(path)
    }

    /// Failing field paths in sorted order.
    pub fn paths(&self) -> Vec<&'static str> {
        self.fields.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.fields.values()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<&str> = self.iter().map(|e| e.message.as_str()).collect();
        f.write_str(&msgs.join("; "))
    }
}
