//! Example matching the README: synthesize a model, validate two instances,
//! and print the schema the model describes.

use json_schema_model::{FieldValidator, SynthesisOptions, create_model_from_str};
use serde_json::json;

const SCHEMA_JSON: &str = r#"{
  "type": "object",
  "title": "Record",
  "description": "A record with id and optional fields.",
  "required": ["id"],
  "properties": {
    "active": { "type": "boolean" },
    "count": { "type": "integer", "minimum": 0, "maximum": 255 },
    "id": { "type": "string", "format": "uuid", "description": "Unique identifier." },
    "score": { "type": "number", "minimum": 0, "maximum": 1 },
    "status": { "type": "string", "enum": ["active", "inactive"], "default": "active" },
    "nested": {
      "type": "object",
      "title": "NestedInfo",
      "required": ["value"],
      "properties": {
        "value": { "type": "string" },
        "kind": { "type": "string", "enum": ["A", "a"] }
      }
    },
    "tags": { "type": "array", "items": { "type": "string" } }
  }
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = SynthesisOptions::default().with_validator(
        "tags",
        FieldValidator::new(|tags| {
            let lowered: Vec<serde_json::Value> = tags
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(serde_json::Value::as_str)
                .map(|tag| json!(tag.to_lowercase()))
                .collect();
            Ok(json!(lowered))
        }),
    );
    let model = create_model_from_str(SCHEMA_JSON, &options)?;

    let record = model.validate(&json!({
        "id": "3dd68ce0-91af-4782-8fe0-3e5fd4ff9a57",
        "count": 3,
        "tags": ["Rust", "JSON"]
    }))?;
    println!("{record}");

    if let Err(e) = model.validate(&json!({ "count": 300, "nested": {} })) {
        println!("{e}");
    }

    println!("{}", serde_json::to_string_pretty(&model.json_schema())?);
    Ok(())
}
