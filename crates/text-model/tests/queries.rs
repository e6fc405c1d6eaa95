use std::sync::Arc;
use text_model::{
    LanguageRegistry, Position, Range, TextModel, TextModelCreationOptions, TextModelOptions,
};
use text_model_lang::LanguageConfiguration;

fn model_with_language(text: &str, off_side: bool) -> TextModel {
    let mut registry = LanguageRegistry::new();
    let language = registry.register(
        "demo",
        LanguageConfiguration::with_default_brackets().off_side(off_side),
    );
    TextModel::new(
        text,
        Some(language),
        Arc::new(registry),
        TextModelCreationOptions {
            options: TextModelOptions {
                tab_size: 4,
                ..Default::default()
            },
            ..Default::default()
        },
    )
}

#[test]
fn test_match_bracket_scenario() {
    let m = model_with_language("fn(a, b)", false);
    let ranges = m.match_bracket(Position::new(1, 3)).unwrap().unwrap();
    assert_eq!(ranges[0], Range::new(1, 3, 1, 4));
    assert_eq!(ranges[1], Range::new(1, 8, 1, 9));
}

#[test]
fn test_match_bracket_without_configuration() {
    let registry = Arc::new(LanguageRegistry::new());
    let m = TextModel::new("(x)", None, registry, TextModelCreationOptions::default());
    assert_eq!(m.match_bracket(Position::new(1, 1)).unwrap(), None);
}

#[test]
fn test_find_prev_and_next_bracket() {
    let m = model_with_language("if (a) { b }", false);
    let next = m.find_next_bracket(Position::new(1, 1)).unwrap();
    assert_eq!(next.range, Range::new(1, 4, 1, 5));
    assert_eq!(next.open, "(");
    assert!(next.is_open);

    let prev = m.find_prev_bracket(Position::new(1, 13)).unwrap();
    assert_eq!(prev.range, Range::new(1, 12, 1, 13));
    assert!(!prev.is_open);
}

#[test]
fn test_word_at_position() {
    let m = model_with_language("let foo_bar = baz;", false);
    let word = m.get_word_at_position(Position::new(1, 6)).unwrap();
    assert_eq!(word.word, "foo_bar");
    assert_eq!(word.start_column, 5);
    assert_eq!(word.end_column, 12);

    assert!(m.get_word_at_position(Position::new(1, 13)).is_none());
}

#[test]
fn test_word_until_position() {
    let m = model_with_language("let foo_bar = baz;", false);
    let word = m.get_word_until_position(Position::new(1, 8));
    assert_eq!(word.word, "foo");
    assert_eq!(word.start_column, 5);
    assert_eq!(word.end_column, 8);

    let empty = m.get_word_until_position(Position::new(1, 13));
    assert_eq!(empty.word, "");
    assert_eq!(empty.start_column, 13);
}

#[test]
fn test_indent_guides_nested_blocks() {
    let m = model_with_language("root\n    a\n        b\n    c\nend", false);
    assert_eq!(
        m.get_lines_indent_guides(1, 5).unwrap(),
        vec![0, 1, 2, 1, 0]
    );
}

#[test]
fn test_indent_guides_blank_line_off_side() {
    let regular = model_with_language("        a\n\n    b", false);
    assert_eq!(regular.get_lines_indent_guides(2, 2).unwrap(), vec![2]);

    let off_side = model_with_language("        a\n\n    b", true);
    assert_eq!(off_side.get_lines_indent_guides(2, 2).unwrap(), vec![1]);
}

#[test]
fn test_find_matches_default_limit() {
    let text = "x\n".repeat(1500);
    let m = model_with_language(&text, false);
    let hits = m
        .find_matches("x", None, false, true, false, false, None)
        .unwrap();
    assert_eq!(hits.len(), 999, "default result cap");

    let capped = m
        .find_matches("x", None, false, true, false, false, Some(5))
        .unwrap();
    assert_eq!(capped.len(), 5);
}

#[test]
fn test_find_matches_in_scope_with_regex() {
    let m = model_with_language("foo1\nfoo2\nfoo3", false);
    let hits = m
        .find_matches(
            r"foo(\d)",
            Some(Range::new(2, 1, 3, 5)),
            true,
            true,
            false,
            true,
            None,
        )
        .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].range, Range::new(2, 1, 2, 5));
    assert_eq!(hits[0].matches.as_ref().unwrap()[1], "2");
}

#[test]
fn test_find_next_and_previous_from_position() {
    let m = model_with_language("alpha beta alpha", false);
    let next = m
        .find_next_match("alpha", Position::new(1, 2), false, true, false, false)
        .unwrap()
        .unwrap();
    assert_eq!(next.range, Range::new(1, 12, 1, 17));

    let prev = m
        .find_previous_match("alpha", Position::new(1, 12), false, true, false, false)
        .unwrap()
        .unwrap();
    assert_eq!(prev.range, Range::new(1, 1, 1, 6));
}

#[test]
fn test_language_id_at_position_defaults_to_model_language() {
    let m = model_with_language("anything", false);
    let id = m.get_language_id_at_position(Position::new(1, 3));
    assert_eq!(id, m.language_identifier().id);
}
