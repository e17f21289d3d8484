use proptest::prelude::*;
use serde_json::Value;
use studio_render::render_document;

/// Arbitrary JSON values, bounded in depth/size so the strategy terminates.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::hash_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Rendering never panics, on any JSON shape, recognised or not.
    #[test]
    fn render_never_panics(value in arb_json()) {
        let _ = render_document(&value);
    }

    /// A rich-text node whose `type` isn't one this renderer knows still
    /// renders (falls back to concatenating children) rather than failing.
    #[test]
    fn unknown_type_falls_back_to_children_text(text in "[a-zA-Z ]{0,16}") {
        let doc = serde_json::json!({
            "type": "someFutureBlockType",
            "content": [{"type": "text", "text": text.clone()}],
        });
        prop_assert_eq!(render_document(&doc), text.trim().to_string());
    }
}
