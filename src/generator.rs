use crate::resolver::DereferencedDocument;
use crate::schema::{Items, NodeId, NumericBounds, Reference, SchemaNode, SchemaType};
use log::debug;
use serde_json::{json, Map, Number, Value};
use std::collections::HashSet;

/// Hard ceiling on synthesised string lengths and array sizes, whatever the schema asks for
const MAX_SYNTHETIC_SIZE: u64 = 4096;

/// Text used for strings without a recognised format
const STRING_PLACEHOLDER: &str = "string";

/// Options controlling example generation
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Elements produced for arrays that do not demand more
    pub min_array_items: usize,
    /// Upper bound on elements produced for arrays that do not demand more
    pub max_array_items: usize,
    /// Whether optional object properties are included
    pub include_optional: bool,
    /// Longest expansion path before branches are cut with a placeholder
    pub max_depth: usize,
    /// Whether `examples` and `default` values are preferred over synthesis
    pub use_examples: bool,
    /// Total values one example may hold; once spent, remaining branches get placeholders
    pub max_values: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            min_array_items: 1,
            max_array_items: 3,
            include_optional: true,
            max_depth: 32,
            use_examples: true,
            max_values: 10_000,
        }
    }
}

/// Example generator - turns dereferenced schemas into concrete JSON values.
///
/// Generation never fails. Contradictory constraints and keywords it cannot satisfy
/// (such as `pattern`) degrade to the most permissive value of the declared type, and a
/// schema with no type at all produces `null`.
#[derive(Debug, Clone, Default)]
pub struct ExampleGenerator {
    options: GeneratorOptions,
}

impl ExampleGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        debug!("Initializing ExampleGenerator with {:?}", options);
        Self { options }
    }

    /// Generate an example for the root of a document
    pub fn generate(&self, document: &DereferencedDocument) -> Value {
        let mut visiting = HashSet::new();
        self.generate_node(document, document.root(), &mut visiting)
    }

    /// Generate an example for one node.
    ///
    /// `visiting` holds the nodes being expanded on the current path. Re-entering one of
    /// them ends the branch with an empty container for its type (or `null`), which is
    /// what keeps generation finite on cyclic schemas. The whole example is also limited
    /// to `max_values` values, so nested arrays cannot multiply without bound.
    pub fn generate_node(
        &self,
        document: &DereferencedDocument,
        id: NodeId,
        visiting: &mut HashSet<NodeId>,
    ) -> Value {
        let mut budget = self.options.max_values;
        self.walk(document, id, visiting, &mut budget)
    }

    fn walk(
        &self,
        document: &DereferencedDocument,
        id: NodeId,
        visiting: &mut HashSet<NodeId>,
        budget: &mut usize,
    ) -> Value {
        if visiting.contains(&id) {
            debug!("Cycle at {}, emitting placeholder", document.node(id).pointer);
            return placeholder(document, id);
        }
        if visiting.len() >= self.options.max_depth {
            debug!("Depth limit reached at {}", document.node(id).pointer);
            return placeholder(document, id);
        }
        if *budget == 0 {
            debug!("Value budget spent at {}", document.node(id).pointer);
            return placeholder(document, id);
        }
        *budget -= 1;

        visiting.insert(id);
        let value = self.expand(document, id, visiting, budget);
        visiting.remove(&id);
        value
    }

    fn expand(
        &self,
        document: &DereferencedDocument,
        id: NodeId,
        visiting: &mut HashSet<NodeId>,
        budget: &mut usize,
    ) -> Value {
        let node = document.node(id);

        match &node.reference {
            Some(Reference::Link(target)) => return self.walk(document, *target, visiting, budget),
            Some(Reference::Pointer(pointer)) => {
                debug!("Unresolved pointer {} at {}", pointer, node.pointer);
                return Value::Null;
            }
            None => {}
        }

        if node.unsatisfiable {
            return Value::Null;
        }
        if let Some(value) = &node.const_value {
            return value.clone();
        }
        if let Some(values) = &node.enum_values {
            match values.first() {
                Some(first) => return first.clone(),
                None => debug!("Empty enum at {}", node.pointer),
            }
        }
        if self.options.use_examples {
            let mut supplied = node.examples.iter().chain(node.default.as_ref()).peekable();
            if supplied.peek().is_some() {
                match supplied.find(|value| fits(node, value)) {
                    Some(example) => return example.clone(),
                    None => debug!("Supplied examples at {} do not fit the schema", node.pointer),
                }
            }
        }

        let mut value = match node.primary_type().or_else(|| infer_type(node)) {
            Some(SchemaType::Object) => self.object_value(document, node, visiting, budget),
            Some(SchemaType::Array) => self.array_value(document, node, visiting, budget),
            Some(SchemaType::String) => Value::String(string_value(node)),
            Some(SchemaType::Number) => number_value(&node.numeric, false),
            Some(SchemaType::Integer) => number_value(&node.numeric, true),
            Some(SchemaType::Boolean) => Value::Bool(true),
            Some(SchemaType::Null) | None => Value::Null,
        };

        for branch in &node.all_of {
            let part = self.walk(document, *branch, visiting, budget);
            value = combine(value, part);
        }
        if let Some(branch) = node.any_of.first().or_else(|| node.one_of.first()) {
            let part = self.walk(document, *branch, visiting, budget);
            value = combine(value, part);
        }

        value
    }

    fn object_value(
        &self,
        document: &DereferencedDocument,
        node: &SchemaNode,
        visiting: &mut HashSet<NodeId>,
        budget: &mut usize,
    ) -> Value {
        let mut object = Map::new();

        for (name, child) in &node.properties {
            let required = node.is_required(name);
            if !required && !self.options.include_optional {
                continue;
            }
            // An optional property that would only expand into a placeholder is left out.
            if !required && would_cycle(document, *child, visiting) {
                debug!("Skipping recursive optional property {} at {}", name, node.pointer);
                continue;
            }
            let value = self.walk(document, *child, visiting, budget);
            object.insert(name.clone(), value);
        }

        for name in &node.required {
            if object.contains_key(name) {
                continue;
            }
            let value = match node.additional_properties {
                Some(schema) => self.walk(document, schema, visiting, budget),
                None => Value::Null,
            };
            object.insert(name.clone(), value);
        }

        Value::Object(object)
    }

    fn array_value(
        &self,
        document: &DereferencedDocument,
        node: &SchemaNode,
        visiting: &mut HashSet<NodeId>,
        budget: &mut usize,
    ) -> Value {
        match &node.items {
            Items::Tuple(positions) => Value::Array(
                positions
                    .iter()
                    .map(|item| self.walk(document, *item, visiting, budget))
                    .collect(),
            ),
            Items::Single(item) => {
                let mut count = self.array_len(node);
                if node.min_items.unwrap_or(0) == 0 && would_cycle(document, *item, visiting) {
                    count = 0;
                }
                let mut values = Vec::with_capacity(count.min(*budget));
                for _ in 0..count {
                    if *budget == 0 {
                        debug!("Value budget spent, truncating array at {}", node.pointer);
                        break;
                    }
                    values.push(self.walk(document, *item, visiting, budget));
                }
                Value::Array(values)
            }
            Items::None => {
                let demanded = node.min_items.unwrap_or(0).min(MAX_SYNTHETIC_SIZE) as usize;
                let count = demanded.min(*budget);
                *budget -= count;
                Value::Array(vec![Value::Null; count])
            }
        }
    }

    fn array_len(&self, node: &SchemaNode) -> usize {
        let demanded = node.min_items.unwrap_or(0).min(MAX_SYNTHETIC_SIZE) as usize;
        let ceiling = self.options.max_array_items.max(demanded);
        let mut count = self.options.min_array_items.max(demanded).min(ceiling);
        if let Some(max_items) = node.max_items {
            count = count.min(max_items as usize);
        }
        count
    }
}

/// Whether a supplied example or default has a declared type and every required property
fn fits(node: &SchemaNode, value: &Value) -> bool {
    let typed = node.types.is_empty() || node.types.iter().any(|t| is_instance(*t, value));
    let complete = match value {
        Value::Object(map) => node.required.iter().all(|name| map.contains_key(name)),
        _ => node.required.is_empty() || !node.types.is_empty(),
    };
    typed && complete
}

fn is_instance(kind: SchemaType, value: &Value) -> bool {
    match kind {
        SchemaType::Object => value.is_object(),
        SchemaType::Array => value.is_array(),
        SchemaType::String => value.is_string(),
        SchemaType::Number => value.is_number(),
        SchemaType::Integer => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|n| n.fract() == 0.0)
        }
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Null => value.is_null(),
    }
}

/// Whether generating `id` right now would immediately hit the cycle guard
fn would_cycle(document: &DereferencedDocument, id: NodeId, visiting: &HashSet<NodeId>) -> bool {
    if visiting.contains(&id) {
        return true;
    }
    matches!(document.link_target(id), Some(target) if visiting.contains(&target))
}

/// The terminal value for a branch cut by the cycle guard
fn placeholder(document: &DereferencedDocument, id: NodeId) -> Value {
    let node = document.node(id);
    let kind = node.primary_type().or_else(|| infer_type(node)).or_else(|| {
        document.link_target(id).and_then(|target| {
            let target = document.node(target);
            target.primary_type().or_else(|| infer_type(target))
        })
    });
    match kind {
        Some(SchemaType::Object) => json!({}),
        Some(SchemaType::Array) => json!([]),
        _ => Value::Null,
    }
}

/// Type implied by the keywords of a node that declares none
fn infer_type(node: &SchemaNode) -> Option<SchemaType> {
    if !node.properties.is_empty() || !node.required.is_empty() || node.additional_properties.is_some()
    {
        Some(SchemaType::Object)
    } else if node.items != Items::None || node.min_items.is_some() || node.max_items.is_some() {
        Some(SchemaType::Array)
    } else if !node.numeric.is_empty() {
        Some(SchemaType::Number)
    } else if node.min_length.is_some()
        || node.max_length.is_some()
        || node.pattern.is_some()
        || node.format.is_some()
    {
        Some(SchemaType::String)
    } else {
        None
    }
}

/// Merge the value of a combinator branch into the value built so far
fn combine(base: Value, part: Value) -> Value {
    match (base, part) {
        (Value::Null, part) => part,
        (Value::Object(mut base), Value::Object(part)) => {
            for (key, value) in part {
                let missing = base.get(&key).map_or(true, Value::is_null);
                if missing {
                    base.insert(key, value);
                }
            }
            Value::Object(base)
        }
        (base, _) => base,
    }
}

fn string_value(node: &SchemaNode) -> String {
    if node.pattern.is_some() {
        debug!("Pattern at {} is not synthesised", node.pointer);
    }
    let base = match node.format.as_deref() {
        Some(format) => format_placeholder(format).unwrap_or_else(|| {
            debug!("Unknown string format {} at {}", format, node.pointer);
            STRING_PLACEHOLDER
        }),
        None => STRING_PLACEHOLDER,
    };
    fit_length(base, node.min_length, node.max_length)
}

fn format_placeholder(format: &str) -> Option<&'static str> {
    match format {
        "date-time" => Some("2024-01-01T00:00:00Z"),
        "date" => Some("2024-01-01"),
        "time" => Some("00:00:00Z"),
        "email" | "idn-email" => Some("user@example.com"),
        "uuid" => Some("3fa85f64-5717-4562-b3fc-2c963f66afa6"),
        "uri" | "url" | "uri-reference" | "iri" => Some("https://example.com"),
        "hostname" | "idn-hostname" => Some("example.com"),
        "ipv4" => Some("192.0.2.1"),
        "ipv6" => Some("2001:db8::1"),
        "byte" => Some("c3RyaW5n"),
        _ => None,
    }
}

/// Pad (by repetition) or truncate `base` to satisfy the length bounds.
/// When the bounds contradict each other the maximum wins.
fn fit_length(base: &str, min_length: Option<u64>, max_length: Option<u64>) -> String {
    let min = min_length.unwrap_or(0).min(MAX_SYNTHETIC_SIZE) as usize;
    let mut text: String = base.chars().cycle().take(base.chars().count().max(min)).collect();
    if let Some(max) = max_length {
        text = text.chars().take(max as usize).collect();
    }
    text
}

fn number_value(bounds: &NumericBounds, integer: bool) -> Value {
    let lower = tighter(bounds.minimum, bounds.exclusive_minimum, f64::max);
    let upper = tighter(bounds.maximum, bounds.exclusive_maximum, f64::min);

    let low = lower.map(|(bound, exclusive)| match (integer, exclusive) {
        (true, true) => bound.floor() + 1.0,
        (true, false) => bound.ceil(),
        (false, true) => match upper {
            Some((high, _)) if high > bound => (bound + high) / 2.0,
            _ => bound + 1.0,
        },
        (false, false) => bound,
    });
    let high = upper.map(|(bound, exclusive)| match (integer, exclusive) {
        (true, true) => bound.ceil() - 1.0,
        (true, false) => bound.floor(),
        (false, _) => bound,
    });
    // Integer bounds are already inclusive; a number bound may still be open.
    let open_high = !integer && upper.is_some_and(|(_, exclusive)| exclusive);
    let below_high = |value: f64| {
        high.map_or(true, |high| if open_high { value < high } else { value <= high })
    };

    let mut candidate = match (low, high) {
        (Some(low), _) => low,
        (None, Some(high)) if !below_high(0.0) => {
            if open_high {
                high - 1.0
            } else {
                high
            }
        }
        _ => 0.0,
    };

    if let Some(step) = bounds.multiple_of {
        let aligned = (candidate / step).ceil() * step;
        if below_high(aligned) {
            candidate = aligned;
        } else {
            debug!("multipleOf {} cannot be met within bounds", step);
        }
    }

    if let (Some(low), Some(high)) = (low, high) {
        if low > high {
            debug!("Contradictory numeric bounds {} > {}", low, high);
        }
    }

    if integer {
        json!(candidate.round() as i64)
    } else {
        Number::from_f64(candidate)
            .map(Value::Number)
            .unwrap_or_else(|| json!(0))
    }
}

/// The stricter of an inclusive and an exclusive bound, flagged when exclusive
fn tighter(
    inclusive: Option<f64>,
    exclusive: Option<f64>,
    pick: fn(f64, f64) -> f64,
) -> Option<(f64, bool)> {
    match (inclusive, exclusive) {
        (Some(i), Some(e)) => {
            let chosen = pick(i, e);
            Some((chosen, chosen == e))
        }
        (Some(i), None) => Some((i, false)),
        (None, Some(e)) => Some((e, true)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::dereference;
    use pretty_assertions::assert_eq;

    fn example(schema: Value) -> Value {
        ExampleGenerator::default().generate(&dereference(&schema).unwrap())
    }

    fn example_with(schema: Value, options: GeneratorOptions) -> Value {
        ExampleGenerator::new(options).generate(&dereference(&schema).unwrap())
    }

    #[test]
    fn test_scenario_required_integer_and_enum_note() {
        let value = example(json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": {"type": "integer"},
                "note": {"type": "string", "enum": ["x"]}
            }
        }));

        assert!(value["id"].is_i64());
        if let Some(note) = value.get("note") {
            assert_eq!(note, &json!("x"));
        }
    }

    #[test]
    fn test_declared_types_are_respected() {
        assert!(example(json!({"type": "string"})).is_string());
        assert!(example(json!({"type": "number"})).is_number());
        assert!(example(json!({"type": "integer"})).is_i64());
        assert!(example(json!({"type": "boolean"})).is_boolean());
        assert!(example(json!({"type": "null"})).is_null());
        assert!(example(json!({"type": "object"})).is_object());
        assert!(example(json!({"type": "array", "items": {"type": "string"}})).is_array());
    }

    #[test]
    fn test_untyped_schema_is_null() {
        assert_eq!(example(json!({})), Value::Null);
        assert_eq!(example(json!({"description": "anything"})), Value::Null);
    }

    #[test]
    fn test_false_schema_is_null() {
        assert_eq!(example(json!(false)), Value::Null);
    }

    #[test]
    fn test_enum_takes_precedence_over_type() {
        let value = example(json!({"type": "integer", "enum": [7, 9]}));
        assert_eq!(value, json!(7));
        assert_eq!(example(json!({"const": "fixed"})), json!("fixed"));
    }

    #[test]
    fn test_examples_and_default_are_used() {
        assert_eq!(example(json!({"type": "string", "examples": ["alice"]})), json!("alice"));
        assert_eq!(example(json!({"type": "integer", "default": 42})), json!(42));

        let options = GeneratorOptions {
            use_examples: false,
            ..GeneratorOptions::default()
        };
        assert_eq!(
            example_with(json!({"type": "integer", "default": 42}), options),
            json!(0)
        );
    }

    #[test]
    fn test_supplied_values_must_fit_the_schema() {
        assert_eq!(example(json!({"type": "integer", "default": "abc"})), json!(0));
        assert_eq!(
            example(json!({"type": "integer", "examples": ["x", 7], "default": 1})),
            json!(7)
        );

        let value = example(json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}},
            "examples": [{}]
        }));
        assert!(value["id"].is_i64());

        let value = example(json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}},
            "examples": [{"id": 9, "extra": true}]
        }));
        assert_eq!(value, json!({"id": 9, "extra": true}));
    }

    #[test]
    fn test_required_properties_without_optional() {
        let options = GeneratorOptions {
            include_optional: false,
            ..GeneratorOptions::default()
        };
        let value = example_with(
            json!({
                "type": "object",
                "required": ["id", "extra"],
                "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
            }),
            options,
        );

        let object = value.as_object().unwrap();
        assert!(object.contains_key("id"));
        assert!(object.contains_key("extra"));
        assert!(!object.contains_key("name"));
    }

    #[test]
    fn test_array_item_count_and_bounds() {
        let value = example(json!({"type": "array", "items": {"type": "integer"}}));
        assert_eq!(value.as_array().unwrap().len(), 1);

        let value = example(json!({"type": "array", "items": {"type": "integer"}, "minItems": 5}));
        assert_eq!(value.as_array().unwrap().len(), 5);

        let value = example(json!({"type": "array", "items": {"type": "integer"}, "maxItems": 0}));
        assert_eq!(value, json!([]));

        let options = GeneratorOptions {
            min_array_items: 3,
            ..GeneratorOptions::default()
        };
        let value = example_with(json!({"type": "array", "items": {"type": "boolean"}}), options);
        assert_eq!(value, json!([true, true, true]));
    }

    #[test]
    fn test_adversarial_min_items_is_capped() {
        let value = example(json!({
            "type": "array",
            "items": {"type": "integer"},
            "minItems": 1_000_000_000u64
        }));
        assert_eq!(value.as_array().unwrap().len(), MAX_SYNTHETIC_SIZE as usize);
    }

    fn count_values(value: &Value) -> usize {
        1 + match value {
            Value::Array(items) => items.iter().map(count_values).sum(),
            Value::Object(map) => map.values().map(count_values).sum(),
            _ => 0,
        }
    }

    #[test]
    fn test_nested_min_items_stay_within_value_budget() {
        let schema = json!({
            "type": "array",
            "minItems": 4096,
            "items": {
                "type": "array",
                "minItems": 4096,
                "items": {"type": "array", "minItems": 4096, "items": {"type": "integer"}}
            }
        });
        let options = GeneratorOptions {
            max_values: 500,
            ..GeneratorOptions::default()
        };

        let value = example_with(schema.clone(), options);
        assert!(count_values(&value) <= 500);
        assert!(value.is_array());

        let value = example(schema);
        assert!(count_values(&value) <= GeneratorOptions::default().max_values);
        // The first branch is filled before the budget runs out.
        assert!(value[0][0].as_array().unwrap().len() > 1);
    }

    #[test]
    fn test_value_budget_keeps_required_keys() {
        let options = GeneratorOptions {
            max_values: 2,
            ..GeneratorOptions::default()
        };
        let value = example_with(
            json!({
                "type": "object",
                "required": ["a", "b", "c"],
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "object"},
                    "c": {"type": "array"}
                }
            }),
            options,
        );
        assert_eq!(value, json!({"a": 0, "b": {}, "c": []}));
    }

    #[test]
    fn test_tuple_items() {
        let value = example(json!({
            "type": "array",
            "prefixItems": [{"type": "string"}, {"type": "integer"}]
        }));
        assert_eq!(value, json!(["string", 0]));
    }

    #[test]
    fn test_string_length_bounds() {
        assert_eq!(example(json!({"type": "string", "maxLength": 3})), json!("str"));
        assert_eq!(
            example(json!({"type": "string", "minLength": 10})),
            json!("stringstri")
        );
        // Contradictory bounds degrade to the maximum
        assert_eq!(
            example(json!({"type": "string", "minLength": 5, "maxLength": 2})),
            json!("st")
        );
    }

    #[test]
    fn test_string_formats() {
        assert_eq!(
            example(json!({"type": "string", "format": "email"})),
            json!("user@example.com")
        );
        assert_eq!(
            example(json!({"type": "string", "format": "date-time"})),
            json!("2024-01-01T00:00:00Z")
        );
        assert_eq!(
            example(json!({"type": "string", "format": "unheard-of"})),
            json!("string")
        );
    }

    #[test]
    fn test_pattern_degrades_to_placeholder() {
        assert_eq!(
            example(json!({"type": "string", "pattern": "^[0-9]+$"})),
            json!("string")
        );
    }

    #[test]
    fn test_numeric_bounds() {
        assert_eq!(example(json!({"type": "integer", "minimum": 5})), json!(5));
        assert_eq!(example(json!({"type": "integer", "exclusiveMinimum": 5})), json!(6));
        assert_eq!(example(json!({"type": "integer", "maximum": -3})), json!(-3));
        assert_eq!(
            example(json!({"type": "integer", "minimum": 3, "multipleOf": 4})),
            json!(4)
        );

        let value = example(json!({"type": "number", "exclusiveMinimum": 0, "exclusiveMaximum": 1}));
        let number = value.as_f64().unwrap();
        assert!(number > 0.0 && number < 1.0);
    }

    #[test]
    fn test_number_stays_below_exclusive_maximum() {
        let value = example(json!({"type": "number", "exclusiveMaximum": -3}));
        assert!(value.as_f64().unwrap() < -3.0);

        let value = example(json!({"type": "number", "exclusiveMaximum": 0}));
        assert!(value.as_f64().unwrap() < 0.0);

        assert_eq!(example(json!({"type": "number", "maximum": -3})), json!(-3.0));
        assert_eq!(example(json!({"type": "integer", "exclusiveMaximum": -3})), json!(-4));
    }

    #[test]
    fn test_multiple_of_respects_exclusive_maximum() {
        let value = example(json!({
            "type": "number",
            "minimum": 1,
            "exclusiveMaximum": 4,
            "multipleOf": 4
        }));
        let number = value.as_f64().unwrap();
        assert!((1.0..4.0).contains(&number), "{} out of bounds", number);

        let value = example(json!({"type": "number", "exclusiveMaximum": -3, "multipleOf": 2}));
        assert_eq!(value, json!(-4.0));
    }

    #[test]
    fn test_type_array_prefers_non_null() {
        assert!(example(json!({"type": ["null", "string"]})).is_string());
    }

    #[test]
    fn test_inferred_types() {
        assert!(example(json!({"properties": {"a": {"type": "string"}}})).is_object());
        assert!(example(json!({"items": {"type": "string"}})).is_array());
        assert!(example(json!({"minimum": 2})).is_number());
        assert!(example(json!({"format": "uuid"})).is_string());
    }

    #[test]
    fn test_all_of_merges_objects() {
        let value = example(json!({
            "allOf": [
                {"type": "object", "properties": {"id": {"type": "integer"}}},
                {"type": "object", "properties": {"name": {"type": "string"}}}
            ]
        }));
        assert_eq!(value, json!({"id": 0, "name": "string"}));
    }

    #[test]
    fn test_any_of_uses_first_branch() {
        let value = example(json!({"anyOf": [{"type": "boolean"}, {"type": "string"}]}));
        assert_eq!(value, json!(true));
        let value = example(json!({"oneOf": [{"type": "integer"}, {"type": "string"}]}));
        assert_eq!(value, json!(0));
    }

    #[test]
    fn test_self_referencing_root_terminates() {
        assert_eq!(example(json!({"$ref": "#"})), Value::Null);
    }

    #[test]
    fn test_recursive_object_terminates() {
        let value = example(json!({
            "type": "object",
            "required": ["value", "next"],
            "properties": {
                "value": {"type": "integer"},
                "next": {"$ref": "#"}
            }
        }));
        assert_eq!(value, json!({"value": 0, "next": {}}));
    }

    #[test]
    fn test_optional_recursive_property_is_omitted() {
        let value = example(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "children": {"type": "array", "items": {"$ref": "#"}},
                "parent": {"$ref": "#"}
            }
        }));
        assert_eq!(value, json!({"name": "string", "children": []}));
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let value = example(json!({
            "$ref": "#/$defs/Person",
            "$defs": {
                "Person": {
                    "type": "object",
                    "required": ["employer"],
                    "properties": {"employer": {"$ref": "#/$defs/Company"}}
                },
                "Company": {
                    "type": "object",
                    "required": ["owner"],
                    "properties": {"owner": {"$ref": "#/$defs/Person"}}
                }
            }
        }));
        assert_eq!(value, json!({"employer": {"owner": {}}}));
    }

    #[test]
    fn test_depth_limit_cuts_deep_acyclic_schemas() {
        let mut schema = json!({"type": "integer"});
        for _ in 0..10 {
            schema = json!({"type": "object", "required": ["inner"], "properties": {"inner": schema}});
        }
        let options = GeneratorOptions {
            max_depth: 3,
            ..GeneratorOptions::default()
        };
        let value = example_with(schema, options);
        assert_eq!(value, json!({"inner": {"inner": {"inner": {}}}}));
    }

    #[test]
    fn test_visiting_set_is_restored() {
        let document = dereference(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}}
        }))
        .unwrap();
        let generator = ExampleGenerator::default();
        let mut visiting = HashSet::new();
        generator.generate_node(&document, document.root(), &mut visiting);
        assert!(visiting.is_empty());
    }
}
