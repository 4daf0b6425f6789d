//! End-to-end properties of the form description language.

use filetalk_common_config::{keys, ConfigStore, MemoryConfigStore};
use filetalk_form::{parse, resolve_route, FieldType, FormSpec};
use proptest::prelude::*;

const BUG_REPORT: &str = r#"
# title: Bug report
# channel: bugs
summary  -- str<60>          # short description
details  -- text<60,8>
severity -- choice<low,medium,high>
steps    -- json<40,6>
count    -- int<4>
ratio    -- float<8>
seen_on  -- date
seen_at  -- time
urgent   -- bool
reporter -- "qa-bot"
"#;

#[test]
fn full_form_parses_every_type() {
    let spec = FormSpec::parse(BUG_REPORT).unwrap();
    let keywords: Vec<_> = spec.fields().iter().map(|f| f.field_type.keyword()).collect();
    assert_eq!(
        keywords,
        vec!["str", "text", "choice", "json", "int", "float", "date", "time", "bool", "fixed"]
    );
    assert_eq!(spec.directives().title.as_deref(), Some("Bug report"));
}

#[test]
fn canonical_lines_reparse_to_same_form() {
    let spec = parse(BUG_REPORT).unwrap();
    let canonical: String = spec
        .fields()
        .iter()
        .map(|f| format!("{} -- {}\n", f.name, f.field_type))
        .collect();
    let reparsed = parse(&canonical).unwrap();
    assert_eq!(reparsed.fields(), spec.fields());
}

#[test]
fn route_uses_directive_then_store() {
    let spec = parse(BUG_REPORT).unwrap();
    let mut store = MemoryConfigStore::new();
    store.set(keys::CHANNEL, "fallback").unwrap();
    store.set(keys::OUTBOX, "/srv/out").unwrap();

    let route = resolve_route(spec.directives(), &store).unwrap();
    assert_eq!(route.channel, "bugs");
    assert_eq!(route.outbox.to_str(), Some("/srv/out"));
}

fn line() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("# a comment".to_string())),
        Just(Some("# channel: somewhere".to_string())),
        Just(Some("   ".to_string())),
    ]
}

proptest! {
    #[test]
    fn order_matches_source_regardless_of_interleaving(
        fillers in proptest::collection::vec(line(), 1..20),
    ) {
        let mut text = String::new();
        let mut expected = Vec::new();
        for (i, filler) in fillers.iter().enumerate() {
            match filler {
                None => {
                    let name = format!("f{i}");
                    text.push_str(&format!("{name} -- bool\n"));
                    expected.push(name);
                }
                Some(other) => {
                    text.push_str(other);
                    text.push('\n');
                }
            }
        }

        let spec = parse(&text).unwrap();
        let names: Vec<_> = spec.fields().iter().map(|f| f.name.clone()).collect();
        prop_assert_eq!(&names, &expected);
        for (i, field) in spec.fields().iter().enumerate() {
            prop_assert_eq!(field.order, i);
            prop_assert_eq!(&field.field_type, &FieldType::Boolean);
        }
    }
}
