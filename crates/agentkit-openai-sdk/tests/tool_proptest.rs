// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests for tool conversion and the strict-mode sanitizer.

use agentkit_core::{AITool, FunctionDeclaration};
use agentkit_openai_sdk::{
    UNSUPPORTED_KEYWORDS, from_response_tool, sanitize_schema, to_response_tool,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

// ── Helpers ─────────────────────────────────────────────────────────

fn arb_keyword_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..1000).prop_map(Value::from),
        "[a-z]{1,8}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// A string property carrying a random subset of rejected keywords.
fn arb_property() -> impl Strategy<Value = (Value, Vec<String>)> {
    proptest::sample::subsequence(UNSUPPORTED_KEYWORDS.to_vec(), 0..6)
        .prop_flat_map(|keywords| {
            let n = keywords.len();
            (Just(keywords), proptest::collection::vec(arb_keyword_value(), n))
        })
        .prop_map(|(keywords, values)| {
            let mut map = Map::new();
            map.insert("type".into(), json!("string"));
            for (k, v) in keywords.iter().zip(values) {
                map.insert((*k).to_owned(), v);
            }
            (
                Value::Object(map),
                keywords.into_iter().map(str::to_owned).collect(),
            )
        })
}

proptest! {
    #[test]
    fn function_name_and_description_survive_round_trip(
        name in "[a-zA-Z_][a-zA-Z0-9_]{0,40}",
        description in "[ -~]{0,60}",
        strict in any::<Option<bool>>(),
    ) {
        let schema = json!({"type": "object", "properties": {}});
        let mut decl = FunctionDeclaration::new(&name, &description, schema);
        decl.strict = strict;
        let back = from_response_tool(&to_response_tool(&AITool::Declaration(decl)).unwrap());
        let back = back.declaration().unwrap();
        prop_assert_eq!(&back.name, &name);
        prop_assert_eq!(&back.description, &description);
        prop_assert_eq!(back.strict, strict);
    }

    #[test]
    fn rejected_keywords_are_removed_and_noted_once((prop, keywords) in arb_property()) {
        let schema = json!({"type": "object", "properties": {"p": prop}});
        let out = sanitize_schema(&schema, true);
        let p = &out["properties"]["p"];
        let description = p.get("description").and_then(Value::as_str).unwrap_or("");
        for kw in UNSUPPORTED_KEYWORDS {
            prop_assert!(p.get(*kw).is_none());
        }
        let lines: Vec<&str> = description.lines().collect();
        prop_assert_eq!(lines.len(), keywords.len());
        for kw in &keywords {
            let prefix = format!("{kw}: ");
            prop_assert_eq!(lines.iter().filter(|l| l.starts_with(&prefix)).count(), 1);
        }
        prop_assert_eq!(&out["required"], &json!(["p"]));
        prop_assert_eq!(&out["additionalProperties"], &json!(false));
    }

    #[test]
    fn non_strict_schemas_are_untouched((prop, _keywords) in arb_property()) {
        let schema = json!({"type": "object", "properties": {"p": prop}});
        prop_assert_eq!(sanitize_schema(&schema, false), schema);
    }
}
