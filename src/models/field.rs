//! Field objects returned inside fact groups.
//!
//! A field object is shaped like
//! `{ "field": { "field_name": "Tier", "value": "Tier1" } }`.

use serde_json::Value;

/// Returns the first field object whose nested `field.field_name` equals `name`.
///
/// Entries that do not have that shape are skipped. Returns `None` when no
/// entry matches.
///
/// # Example
///
/// ```ignore
/// let facts = envelope.pointer("/data/fact_group/facts").and_then(Value::as_array);
/// let tier = facts.and_then(|f| get_field_by_name("Tier", f));
/// ```
pub fn get_field_by_name<'a>(name: &str, fields: &'a [Value]) -> Option<&'a Value> {
    fields.iter().find(|entry| {
        entry
            .get("field")
            .and_then(|field| field.get("field_name"))
            .and_then(Value::as_str)
            == Some(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finds_matching_field() {
        let facts = vec![
            json!({"field": {"field_name": "Risk", "value": 3}}),
            json!({"field": {"field_name": "Tier", "value": "Tier1"}}),
        ];
        let found = get_field_by_name("Tier", &facts).unwrap();
        assert_eq!(found, &facts[1]);
    }

    #[test]
    fn test_returns_first_match() {
        let facts = vec![
            json!({"field": {"field_name": "Tier", "value": "first"}}),
            json!({"field": {"field_name": "Tier", "value": "second"}}),
        ];
        assert_eq!(get_field_by_name("Tier", &facts).unwrap()["field"]["value"], "first");
    }

    #[test]
    fn test_no_match() {
        let facts = vec![json!({"field": {"field_name": "Risk", "value": 3}})];
        assert!(get_field_by_name("Tier", &facts).is_none());
        assert!(get_field_by_name("Tier", &[]).is_none());
    }

    #[test]
    fn test_skips_malformed_entries() {
        let facts = vec![
            json!("Tier"),
            json!({"field_name": "Tier"}),
            json!({"field": {"field_name": 7}}),
            json!({"field": {"field_name": "Tier", "value": "ok"}}),
        ];
        assert_eq!(get_field_by_name("Tier", &facts), Some(&facts[3]));
    }
}
