use super::*;

fn line(text: &str) -> BlockLine {
    BlockLine {
        number: 4,
        text: text.to_owned(),
    }
}

fn block(kind: &str, lines: &[&str]) -> Block {
    Block {
        kind: kind.to_owned(),
        line: 1,
        lines: lines
            .iter()
            .enumerate()
            .map(|(i, t)| BlockLine {
                number: i + 2,
                text: (*t).to_owned(),
            })
            .collect(),
        terminated: true,
    }
}

#[test]
fn parses_key_value_with_optional_whitespace() {
    assert_eq!(
        parse_line(&line("name=a")).unwrap(),
        ("name".to_owned(), AttrValue::Text("a".to_owned()))
    );
    assert_eq!(
        parse_line(&line("  source =   /media/in put.png  ")).unwrap(),
        (
            "source".to_owned(),
            AttrValue::Text("/media/in put.png".to_owned())
        )
    );
}

#[test]
fn line_without_equals_is_a_parse_error() {
    let err = parse_line(&line("bogus-no-equals")).unwrap_err();
    assert!(matches!(err, VidmasterError::Parse { line: 4, .. }));
}

#[test]
fn trailing_garbage_is_rejected() {
    for text in ["name = a-b", "name = a;", "source = /tmp/x.png!", "name ="] {
        let err = parse_line(&line(text)).unwrap_err();
        assert!(matches!(err, VidmasterError::Parse { .. }), "{text}");
    }
}

#[test]
fn boolean_coercion_is_total_only_over_zero_and_one() {
    assert_eq!(coerce("hasaudio", "1"), Ok(AttrValue::Bool(true)));
    assert_eq!(coerce("hasaudio", "0"), Ok(AttrValue::Bool(false)));
    for raw in ["true", "yes", "2", "01", "no"] {
        assert!(coerce("hasaudio", raw).is_err(), "{raw}");
    }
}

#[test]
fn integer_coercion_round_trips() {
    for v in [0u64, 5, 30, 1080, 4_294_967_296] {
        let AttrValue::Int(parsed) = coerce("width", &v.to_string()).unwrap() else {
            panic!("expected integer");
        };
        assert_eq!(parsed, v);
        assert_eq!(
            coerce("width", &parsed.to_string()).unwrap(),
            AttrValue::Int(v)
        );
    }
}

#[test]
fn integer_coercion_rejects_non_numeric() {
    for raw in ["abc", "1.5", "12a", "1 2"] {
        assert!(coerce("fps", raw).is_err(), "{raw}");
    }
}

#[test]
fn type_depends_on_key_not_shape() {
    assert_eq!(coerce("name", "123"), Ok(AttrValue::Text("123".to_owned())));
    assert_eq!(coerce("codec", "1"), Ok(AttrValue::Text("1".to_owned())));
}

#[test]
fn timestamp_is_a_triple_without_bounds_check() {
    assert_eq!(
        coerce("start", "01:03:05"),
        Ok(AttrValue::Timestamp(Timestamp::new(1, 3, 5)))
    );
    assert_eq!(
        coerce("end", "0:99:99"),
        Ok(AttrValue::Timestamp(Timestamp::new(0, 99, 99)))
    );
    for raw in ["10", "1:2", "1:2:3:4", "a:b:c", "1::3"] {
        assert!(coerce("start", raw).is_err(), "{raw}");
    }
}

#[test]
fn repeated_keys_last_one_wins() {
    let mut attrs = AttrMap::from_block(&block("define", &["name = a", "name = b"])).unwrap();
    assert_eq!(attrs.require_text("name").unwrap(), "b");
    assert!(attrs.is_empty());
}

#[test]
fn missing_required_field_names_block_and_field() {
    let mut attrs = AttrMap::from_block(&block("export", &["clip = b"])).unwrap();
    let err = attrs.require_u32("fps").unwrap_err();
    match err {
        VidmasterError::MissingField { kind, field, line } => {
            assert_eq!(kind, "export");
            assert_eq!(field, "fps");
            assert_eq!(line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn narrowing_reports_out_of_range_values() {
    let mut attrs = AttrMap::from_block(&block("margin", &["red = 256"])).unwrap();
    let err = attrs.u8("red").unwrap_err();
    assert!(matches!(err, VidmasterError::Parse { line: 2, .. }));
}

#[test]
fn lists_split_on_whitespace() {
    let mut attrs =
        AttrMap::from_block(&block("concatenate", &["clips = intro  main   outro"])).unwrap();
    assert_eq!(
        attrs.require_list("clips").unwrap(),
        vec!["intro", "main", "outro"]
    );
}

#[test]
fn parse_error_reports_the_offending_line() {
    let err = AttrMap::from_block(&block("define", &["name = a", "type image"])).unwrap_err();
    assert!(matches!(err, VidmasterError::Parse { line: 3, .. }));
}
