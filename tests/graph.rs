//! Graph loading and normalization tests
//!
//! Covers the JSON boundary: kind aliases, defaults, and malformed input
//! reporting every broken block.
mod common;
use common::*;
use survey_flow::error::GraphError;
use survey_flow::prelude::*;

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_full_survey_normalizes_every_kind() {
        let graph = load(FULL_SURVEY_JSON);

        assert_eq!(graph.len(), 12);
        assert_eq!(graph.start_block_id(), "welcome");
        assert_eq!(graph.title(), Some("Customer profile"));
        assert_eq!(graph.expected_minutes(), Some(5.0));

        let kinds: Vec<&str> = graph.blocks().iter().map(|b| b.kind.name()).collect();
        assert_eq!(
            kinds,
            vec![
                "message",
                "text-input",
                "number-input",
                "multi-choice",
                "single-choice",
                "scale",
                "video",
                "contact-form",
                "demographics",
                "yes-no",
                "final",
                "final"
            ]
        );
    }

    #[test]
    fn test_kind_specific_attributes() {
        let graph = load(FULL_SURVEY_JSON);

        match &graph.block("name").unwrap().kind {
            BlockKind::TextInput { max_length } => assert_eq!(*max_length, Some(40)),
            other => panic!("unexpected kind {}", other),
        }
        match &graph.block("age").unwrap().kind {
            BlockKind::NumberInput { min, max } => {
                assert_eq!(*min, Some(0.0));
                assert_eq!(*max, Some(120.0));
            }
            other => panic!("unexpected kind {}", other),
        }
        match &graph.block("colors").unwrap().kind {
            BlockKind::MultiChoice {
                options,
                max_selections,
            } => {
                assert_eq!(options.len(), 3);
                assert_eq!(*max_selections, Some(2));
            }
            other => panic!("unexpected kind {}", other),
        }
        match &graph.block("demo").unwrap().kind {
            BlockKind::Demographics { fields } => {
                assert_eq!(fields.len(), 1);
                assert!(fields[0].required);
            }
            other => panic!("unexpected kind {}", other),
        }
        match &graph.block("contact").unwrap().kind {
            BlockKind::ContactForm { fields } => {
                assert!(fields[0].required);
                assert!(!fields[1].required);
            }
            other => panic!("unexpected kind {}", other),
        }
        let rating = graph.block("rating").unwrap();
        assert_eq!(rating.kind.options().unwrap()[3].value, Value::Number(4.0));
    }

    #[test]
    fn test_conditional_transition_shape() {
        let graph = load(ART_SURVEY_JSON);
        let q1 = graph.block("q1").unwrap();

        match q1.next.as_ref().unwrap() {
            Transition::Conditional { rules, otherwise } => {
                assert_eq!(rules.len(), 1);
                assert_eq!(rules[0].when, Condition::equals("likes_art", "yes"));
                assert_eq!(rules[0].goto, "b1");
                assert_eq!(otherwise, "b2");
            }
            other => panic!("expected a conditional transition, got {:?}", other),
        }
        assert_eq!(q1.targets(), vec!["b1", "b2"]);
    }

    #[test]
    fn test_condition_without_variable_uses_block_variable() {
        let graph = load(FULL_SURVEY_JSON);
        let pet = graph.block("pet").unwrap();
        let condition = pet.next.as_ref().unwrap().conditions().next().unwrap();
        assert_eq!(condition.variable, "pet");
        assert_eq!(condition.predicate, Predicate::Equals(Value::from("none")));
    }

    #[test]
    fn test_missing_start_defaults_to_first_block() {
        let graph = load(
            r#"{"blocks": [
                {"id": "first", "kind": "message", "next": "end"},
                {"id": "end", "kind": "final"}
            ]}"#,
        );
        assert_eq!(graph.start_block_id(), "first");
    }

    #[test]
    fn test_bare_block_array_is_accepted() {
        let graph = load(r#"[{"id": "only", "kind": "final"}]"#);
        assert_eq!(graph.start_block_id(), "only");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_kind_aliases_are_folded() {
        let graph = load(
            r#"{"blocks": [
                {"id": "a", "type": "singleChoice", "variable": "x", "options": ["p", "q"], "next": "b"},
                {"id": "b", "kind": "multiple_choice", "variable": "y", "options": ["p"], "next": "c"},
                {"id": "c", "kind": "Rating", "variable": "z", "options": ["1"], "next": "d"},
                {"id": "d", "kind": "yesno", "variable": "w", "next": "e"},
                {"id": "e", "kind": "end"}
            ]}"#,
        );
        let kinds: Vec<&str> = graph.blocks().iter().map(|b| b.kind.name()).collect();
        assert_eq!(
            kinds,
            vec!["single-choice", "multi-choice", "scale", "yes-no", "final"]
        );
    }

    #[test]
    fn test_custom_kind_alias_via_builder() {
        let normalizer = Normalizer::builder()
            .with_kind_alias("open_question", "text-input")
            .with_kind_alias("ignored", "no-such-kind")
            .build();
        let graph = normalizer
            .normalize_str(
                r#"{"blocks": [
                    {"id": "a", "kind": "openQuestion", "variable": "x", "next": "b"},
                    {"id": "b", "kind": "ignored"}
                ]}"#,
            )
            .unwrap();

        assert_eq!(graph.block("a").unwrap().kind.name(), "text-input");
        assert_eq!(
            graph.block("b").unwrap().kind,
            BlockKind::Unrecognized {
                name: "ignored".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_kind_survives_normalization() {
        let graph = load(
            r#"{"blocks": [
                {"id": "a", "kind": "hologram", "next": "b"},
                {"id": "b", "kind": "final"}
            ]}"#,
        );
        assert!(matches!(
            graph.block("a").unwrap().kind,
            BlockKind::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_malformed_graph_lists_every_broken_block() {
        let err = Graph::from_json(
            r#"{"blocks": [
                {"kind": "message"},
                {"id": "b", "kind": "message", "next": {"if": []}},
                {"id": "c", "kind": "message", "next": {"if": [{"when": {"variable": "v", "gt": "ten"}, "goto": "d"}], "else": "d"}},
                {"id": "d", "kind": "single-choice", "variable": "v", "options": [{"label": "no id"}], "next": "e"},
                42,
                {"id": "e", "kind": "final"},
                {"id": "e", "kind": "final"}
            ]}"#,
        )
        .unwrap_err();

        let issues = err.issues();
        assert_eq!(issues.len(), 6, "issues: {:?}", issues);
        assert_eq!(issues[0].index, Some(0));
        assert_eq!(issues[0].block_id, None);
        assert_eq!(issues[1].block_id.as_deref(), Some("b"));
        assert!(issues[1].message.contains("else"));
        assert_eq!(issues[2].block_id.as_deref(), Some("c"));
        assert!(issues[2].message.contains("expects a number"));
        assert_eq!(issues[3].block_id.as_deref(), Some("d"));
        assert_eq!(issues[4].index, Some(4));
        assert_eq!(issues[5].block_id.as_deref(), Some("e"));
        assert!(issues[5].message.contains("duplicate"));
    }

    #[test]
    fn test_condition_operator_count_is_enforced() {
        for condition in [
            r#"{"variable": "v"}"#,
            r#"{"variable": "v", "equals": 1, "gt": 0}"#,
            r#"{"variable": "v", "in": "abc"}"#,
        ] {
            let json = format!(
                r#"{{"blocks": [
                    {{"id": "a", "kind": "text-input", "variable": "v",
                      "next": {{"if": [{{"when": {}, "goto": "b"}}], "else": "b"}}}},
                    {{"id": "b", "kind": "final"}}
                ]}}"#,
                condition
            );
            let err = Graph::from_json(&json).unwrap_err();
            assert!(
                matches!(err, GraphError::MalformedGraph { .. }),
                "{} should be rejected",
                condition
            );
        }
    }

    #[test]
    fn test_condition_without_any_variable_is_malformed() {
        let err = Graph::from_json(
            r#"{"blocks": [
                {"id": "a", "kind": "message", "next": {"if": [{"when": {"equals": 1}, "goto": "b"}], "else": "b"}},
                {"id": "b", "kind": "final"}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert!(err.issues()[0].message.contains("no variable"));
    }

    #[test]
    fn test_empty_and_non_object_documents_are_rejected() {
        assert!(matches!(
            Graph::from_json(r#"{"blocks": []}"#),
            Err(GraphError::MalformedGraph { .. })
        ));
        assert!(matches!(
            Graph::from_json("\"just a string\""),
            Err(GraphError::MalformedGraph { .. })
        ));
        assert!(matches!(
            Graph::from_json("{not json"),
            Err(GraphError::JsonParseError(_))
        ));
    }

    #[test]
    fn test_graph_new_rejects_duplicate_ids() {
        let err = Graph::new(
            "a",
            vec![
                block("a", BlockKind::Final, None, None),
                block("a", BlockKind::Final, None, None),
            ],
        )
        .unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues()[0].index, Some(1));
    }

    #[test]
    fn test_into_graph_for_json_value() {
        let json: serde_json::Value = serde_json::from_str(ART_SURVEY_JSON).unwrap();
        let graph = json.into_graph().unwrap();
        assert_eq!(graph, load(ART_SURVEY_JSON));
    }

    #[test]
    fn test_graph_serializes_to_plain_json() {
        let graph = load(ART_SURVEY_JSON);
        let json = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["startBlockId"], "q1");
        assert_eq!(json["blocks"][0]["kind"], "single-choice");
        assert_eq!(json["blocks"][0]["options"][0]["value"], "yes");
        assert_eq!(
            json["blocks"][0]["next"]["if"][0]["when"],
            serde_json::json!({"variable": "likes_art", "equals": "yes"})
        );
        assert_eq!(json["blocks"][3]["kind"], "final");
    }
}
