//! Mungers: post-construction, per-field derivations with sibling access (§4.8).

use std::sync::Arc;

use blueprint_types::ConcreteValue;

/// A 2-argument derivation `(field_value, partially_built_record) -> new_field_value`.
///
/// Mungers run after the thunk graph has evaluated for a record, in field
/// declaration order, so `partially_built_record` reflects earlier fields in
/// their final (already-munged) form and later fields in their raw evaluated
/// form.
pub type Munger = Arc<dyn Fn(&ConcreteValue, &ConcreteValue) -> ConcreteValue + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_munger_sees_sibling_state() {
        let double_if_flagged: Munger = Arc::new(|field, record| {
            let flagged = record.field("flag").and_then(ConcreteValue::as_bool).unwrap_or(false);
            match (flagged, field) {
                (true, ConcreteValue::Integer(n)) => ConcreteValue::Integer(n * 2),
                _ => field.clone(),
            }
        });
        let record = ConcreteValue::Record(vec![
            ("flag".to_string(), ConcreteValue::Boolean(true)),
            ("count".to_string(), ConcreteValue::Integer(3)),
        ]);
        let result = double_if_flagged(&ConcreteValue::Integer(3), &record);
        assert_eq!(result, ConcreteValue::Integer(6));
    }
}
