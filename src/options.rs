use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{Error, Result};

pub const DEFAULT_ADD_BUTTON_TEXT: &str = "Hinzufügen";
pub const DEFAULT_DELETE_BUTTON_TEXT: &str = "Feldgruppe löschen";

const DEFAULT_TRIGGER_CLASS: &str = "btn btn-blue-text";
const DEFAULT_DELETE_CLASS: &str = "btn delete-btn";

// Option names accepted for backwards compatibility, mapped to their
// current spelling.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("buttonText", "addButtonText"),
    ("buttonRemoveText", "deleteButtonText"),
];

/// Settings of one [`FieldGroupCloner`](crate::FieldGroupCloner).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClonerOptions {
    /// Visible text of the trigger that adds a group.
    pub add_button_text: String,
    /// Visible text of the control that removes a group.
    pub delete_button_text: String,
    pub classes: ControlClasses,
}

/// Class attributes given to the generated controls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlClasses {
    pub trigger: String,
    pub delete: String,
}

impl Default for ClonerOptions {
    fn default() -> Self {
        Self {
            add_button_text: DEFAULT_ADD_BUTTON_TEXT.to_string(),
            delete_button_text: DEFAULT_DELETE_BUTTON_TEXT.to_string(),
            classes: ControlClasses {
                trigger: DEFAULT_TRIGGER_CLASS.to_string(),
                delete: DEFAULT_DELETE_CLASS.to_string(),
            },
        }
    }
}

impl ClonerOptions {
    /// Merges a partial options object over the defaults.
    ///
    /// `null` means "no overrides". Anything other than an object, or a
    /// merged value of the wrong shape, is a [`Error::Config`].
    pub fn from_overrides(overrides: &Value) -> Result<Self> {
        let overrides = match overrides {
            Value::Null => Value::Object(Map::new()),
            Value::Object(map) => Value::Object(normalize_legacy_keys(map)),
            other => {
                return Err(Error::Config(format!(
                    "options must be an object, got {}",
                    json_kind(other)
                )));
            }
        };

        let merged = deep_merge(&[&default_options_value(), &overrides]);
        serde_json::from_value(merged)
            .map_err(|err| Error::Config(format!("invalid options: {err}")))
    }
}

fn default_options_value() -> Value {
    json!({
        "addButtonText": DEFAULT_ADD_BUTTON_TEXT,
        "deleteButtonText": DEFAULT_DELETE_BUTTON_TEXT,
        "classes": {
            "trigger": DEFAULT_TRIGGER_CLASS,
            "delete": DEFAULT_DELETE_CLASS,
        },
    })
}

fn normalize_legacy_keys(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = map.clone();
    for (legacy, current) in LEGACY_KEYS {
        let Some(value) = out.remove(*legacy) else {
            continue;
        };
        if !out.contains_key(*current) {
            out.insert((*current).to_string(), value);
        }
    }
    out
}

/// Merges object fragments left to right into a fresh object.
///
/// When both the accumulated value and the incoming value of a key are
/// objects they merge key by key; otherwise the later value wins. Arrays
/// are replaced, never merged. Fragments that are not objects contribute
/// nothing.
pub fn deep_merge(fragments: &[&Value]) -> Value {
    let mut target = Map::new();
    for fragment in fragments {
        if let Value::Object(source) = fragment {
            merge_into(&mut target, source);
        }
    }
    Value::Object(target)
}

fn merge_into(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
        for (key, value) in source {
            match value {
                Value::Object(nested_source) => {
                    let slot = target
                        .entry(key.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if !slot.is_object() {
                        *slot = Value::Object(Map::new());
                    }
                    if let Value::Object(nested_target) = slot {
                        merge_into(nested_target, nested_source);
                    }
                }
                other => {
                    target.insert(key.clone(), other.clone());
                }
            }
        }
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() -> Result<()> {
        assert_eq!(ClonerOptions::from_overrides(&Value::Null)?, ClonerOptions::default());
        assert_eq!(ClonerOptions::from_overrides(&json!({}))?, ClonerOptions::default());
        Ok(())
    }

    #[test]
    fn partial_overrides_keep_remaining_defaults() -> Result<()> {
        let options = ClonerOptions::from_overrides(&json!({ "addButtonText": "Add" }))?;
        assert_eq!(options.add_button_text, "Add");
        assert_eq!(options.delete_button_text, DEFAULT_DELETE_BUTTON_TEXT);
        Ok(())
    }

    #[test]
    fn nested_class_overrides_merge_key_by_key() -> Result<()> {
        let options = ClonerOptions::from_overrides(&json!({ "classes": { "delete": "remove" } }))?;
        assert_eq!(options.classes.delete, "remove");
        assert_eq!(options.classes.trigger, DEFAULT_TRIGGER_CLASS);
        Ok(())
    }

    #[test]
    fn legacy_keys_are_accepted_and_current_keys_win() -> Result<()> {
        let options = ClonerOptions::from_overrides(&json!({
            "buttonText": "Old add",
            "buttonRemoveText": "Old delete",
            "deleteButtonText": "New delete",
        }))?;
        assert_eq!(options.add_button_text, "Old add");
        assert_eq!(options.delete_button_text, "New delete");
        Ok(())
    }

    #[test]
    fn wrong_shapes_are_configuration_errors() {
        for overrides in [
            json!("text"),
            json!([1, 2]),
            json!({ "addButtonText": 5 }),
            json!({ "classes": "btn" }),
        ] {
            assert!(
                matches!(ClonerOptions::from_overrides(&overrides), Err(Error::Config(_))),
                "overrides should fail: {overrides}"
            );
        }
    }

    #[test]
    fn deep_merge_recurses_into_objects_only() {
        let base = json!({
            "a": 1,
            "nested": { "x": 1, "y": { "deep": true } },
            "list": [1, 2, 3],
        });
        let patch = json!({
            "b": 2,
            "nested": { "y": { "other": false } },
            "list": [9],
        });
        let merged = deep_merge(&[&base, &patch]);
        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": 2,
                "nested": { "x": 1, "y": { "deep": true, "other": false } },
                "list": [9],
            })
        );
    }

    #[test]
    fn deep_merge_replaces_scalars_with_objects_and_back() {
        let merged = deep_merge(&[
            &json!({ "k": "scalar", "j": { "x": 1 } }),
            &json!({ "k": { "x": 1 }, "j": 3 }),
        ]);
        assert_eq!(merged, json!({ "k": { "x": 1 }, "j": 3 }));
    }

    #[test]
    fn deep_merge_leaves_inputs_untouched_and_skips_non_objects() {
        let base = json!({ "nested": { "x": 1 } });
        let merged = deep_merge(&[&base, &json!(null), &json!({ "nested": { "y": 2 } })]);
        assert_eq!(base, json!({ "nested": { "x": 1 } }));
        assert_eq!(merged, json!({ "nested": { "x": 1, "y": 2 } }));
        assert_eq!(deep_merge(&[]), json!({}));
    }
}
