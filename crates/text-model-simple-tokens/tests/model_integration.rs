use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use text_model::{
    EditOperation, LanguageRegistry, Position, StandardTokenType, TextModel,
    TextModelCreationOptions,
};
use text_model_lang::LanguageConfiguration;
use text_model_simple_tokens::SimpleTokenizer;

fn json_model(text: &str) -> TextModel {
    let mut registry = LanguageRegistry::new();
    let language = registry.register("json", LanguageConfiguration::with_default_brackets());
    let tokenizer = SimpleTokenizer::json_default(language.id).unwrap();
    registry.set_tokenizer(language.id, Arc::new(tokenizer));
    TextModel::new(
        text,
        Some(language),
        Arc::new(registry),
        TextModelCreationOptions::default(),
    )
}

#[test]
fn test_untokenized_lines_serve_placeholders() {
    let m = json_model("{\"a\": 1}\n\"b\"");
    let tokens = m.get_line_tokens(2).unwrap();
    assert_eq!(tokens.count(), 1);
    assert_eq!(tokens.language_id(0), m.language_identifier().id);
    assert_eq!(tokens.standard_token_type(0), StandardTokenType::Other);
}

#[test]
fn test_force_tokenization_classifies_lines() {
    let mut m = json_model("{\"key\": 12}\n\"str\"");
    m.force_tokenization(2).unwrap();

    let line1 = m.get_line_tokens(1).unwrap();
    assert!(line1.count() > 1);
    assert_eq!(line1.standard_token_type(1), StandardTokenType::String);

    let line2 = m.get_line_tokens(2).unwrap();
    assert_eq!(line2.standard_token_type(0), StandardTokenType::String);
}

#[test]
fn test_edit_invalidates_and_background_catches_up() {
    let mut m = json_model("1\n2\n3");
    m.on_before_attached();
    // Warm-up already tokenized this tiny document.
    assert!(!m.has_pending_background_tokenization());

    m.apply_edits(vec![EditOperation::insert(Position::new(2, 1), "\"x\" ")])
        .unwrap();
    assert!(
        m.has_pending_background_tokenization(),
        "edit re-arms background work on an attached model"
    );

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    m.on_did_change_tokens(move |e| sink.borrow_mut().extend(e.ranges.clone()));

    while m.tokenize_background() {}
    assert!(!m.has_pending_background_tokenization());
    assert!(!events.borrow().is_empty());

    let line2 = m.get_line_tokens(2).unwrap();
    assert_eq!(line2.standard_token_type(0), StandardTokenType::String);
}

#[test]
fn test_detached_model_does_not_schedule_background_work() {
    let mut m = json_model("1\n2");
    m.apply_edits(vec![EditOperation::insert(Position::new(1, 1), "x")])
        .unwrap();
    assert!(
        !m.has_pending_background_tokenization(),
        "no editor attached, nothing scheduled"
    );
}

#[test]
fn test_tokenize_if_cheap_near_frontier() {
    let mut m = json_model("1\n2\n3\n4");
    assert!(m.is_cheap_to_tokenize(1));
    m.tokenize_if_cheap(2).unwrap();
    let tokens = m.get_line_tokens(2).unwrap();
    assert_eq!(tokens.language_id(0), m.language_identifier().id);
    assert!(tokens.count() >= 1);
}

#[test]
fn test_language_id_at_position_uses_tokens() {
    let mut m = json_model("\"abc\"");
    m.force_tokenization(1).unwrap();
    let id = m.get_language_id_at_position(Position::new(1, 3));
    assert_eq!(id, m.language_identifier().id);
}

#[test]
fn test_reset_tokenization_emits_full_range() {
    let mut m = json_model("1\n2\n3");
    m.force_tokenization(3).unwrap();

    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    m.on_did_change_tokens(move |e| sink.borrow_mut().extend(e.ranges.clone()));

    m.reset_tokenization();
    let seen = events.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!((seen[0].from_line, seen[0].to_line), (1, 3));
}

#[test]
fn test_brackets_ignore_string_tokens_end_to_end() {
    // The '(' inside the JSON string must not match the code paren.
    let mut m = json_model("[\"(\", 1]");
    m.force_tokenization(1).unwrap();

    let ranges = m.match_bracket(Position::new(1, 1)).unwrap().unwrap();
    assert_eq!(ranges[0], text_model::Range::new(1, 1, 1, 2));
    assert_eq!(ranges[1], text_model::Range::new(1, 8, 1, 9));

    assert!(m.match_bracket(Position::new(1, 3)).unwrap().is_none());
}
