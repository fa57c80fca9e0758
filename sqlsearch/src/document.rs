//! Template-driven date conversion for documents going in and out of storage

use crate::templates::TemplateMapping;
use crate::{Error, Result};
use serde_json::Value;

/// Convert templated date fields of `document` to canonical form before it
/// is stored. Fields that are absent or `null` are left alone.
pub fn write_document(mut document: Value, mapping: Option<&TemplateMapping>) -> Result<Value> {
    let Some(mapping) = mapping else {
        return Ok(document);
    };
    let fields = as_object(&mut document)?;

    for (name, format) in mapping.date_fields() {
        if let Some(value) = fields.get_mut(name).filter(|v| !v.is_null()) {
            *value = format.to_canonical(value)?;
        }
    }
    Ok(document)
}

/// Convert canonical date fields of a stored document back to the format
/// the template declares.
pub fn read_document(mut document: Value, mapping: Option<&TemplateMapping>) -> Result<Value> {
    let Some(mapping) = mapping else {
        return Ok(document);
    };
    let fields = as_object(&mut document)?;

    for (name, format) in mapping.date_fields() {
        if format.is_passthrough() {
            continue;
        }
        let Some(value) = fields.get_mut(name).filter(|v| !v.is_null()) else {
            continue;
        };
        let canonical = value.as_str().ok_or_else(|| {
            Error::Format(format!(
                "stored date field '{}' is not canonical text: {}",
                name, value
            ))
        })?;
        let converted = format.from_canonical(canonical)?;
        *value = converted;
    }
    Ok(document)
}

fn as_object(document: &mut Value) -> Result<&mut serde_json::Map<String, Value>> {
    document
        .as_object_mut()
        .ok_or_else(|| Error::Decode("document must be a JSON object".to_string()))
}
