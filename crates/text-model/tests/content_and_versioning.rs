use std::sync::Arc;
use text_model::{
    EditOperation, EndOfLinePreference, LanguageRegistry, LineEnding, Position, Range,
    RawContentChange, TextModel, TextModelCreationOptions, TextModelError,
};

fn model(text: &str) -> TextModel {
    TextModel::new(
        text,
        None,
        Arc::new(LanguageRegistry::new()),
        TextModelCreationOptions::default(),
    )
}

#[test]
fn test_simple_insert_scenario() {
    let mut m = model("abc\ndef");
    let raw_log: std::rc::Rc<std::cell::RefCell<Vec<RawContentChange>>> =
        std::rc::Rc::default();
    let sink = std::rc::Rc::clone(&raw_log);
    m.on_did_change_raw_content(move |e| sink.borrow_mut().extend(e.changes.clone()));

    let version_before = m.version_id();
    m.apply_edits(vec![EditOperation::insert(Position::new(1, 2), "X")])
        .unwrap();

    assert_eq!(
        m.get_value(EndOfLinePreference::TextDefined, false),
        "aXbc\ndef"
    );
    assert_eq!(m.version_id(), version_before + 1);
    assert_eq!(
        *raw_log.borrow(),
        vec![RawContentChange::LineChanged {
            line: 1,
            content: "aXbc".to_string()
        }]
    );
}

#[test]
fn test_eol_change_scenario() {
    let mut m = model("a\r\nb");
    assert_eq!(m.line_ending(), LineEnding::Crlf);

    let raw_log: std::rc::Rc<std::cell::RefCell<Vec<RawContentChange>>> =
        std::rc::Rc::default();
    let sink = std::rc::Rc::clone(&raw_log);
    m.on_did_change_raw_content(move |e| sink.borrow_mut().extend(e.changes.clone()));

    let version_before = m.version_id();
    m.set_line_ending(LineEnding::Lf).unwrap();

    assert_eq!(m.get_value(EndOfLinePreference::TextDefined, false), "a\nb");
    assert_eq!(m.get_line_count(), 2);
    assert_eq!(*raw_log.borrow(), vec![RawContentChange::EolChanged]);
    assert_eq!(m.version_id(), version_before + 1);

    // Setting the current EOL again is a no-op.
    m.set_line_ending(LineEnding::Lf).unwrap();
    assert_eq!(m.version_id(), version_before + 1);
}

#[test]
fn test_offset_position_round_trip_all_positions() {
    let m = model("ab\u{1F600}\ncd\r\next");
    for line in 1..=m.get_line_count() {
        let max_column = m.get_line_max_column(line).unwrap();
        for column in 1..=max_column {
            let position = m.validate_position(Position::new(line, column));
            let offset = m.get_offset_at(position);
            assert_eq!(m.get_position_at(offset), position);
        }
    }
}

#[test]
fn test_reverse_edits_restore_content_and_eol() {
    let original = "alpha\nbeta\ngamma";
    let mut m = model(original);
    let reverse = m
        .apply_edits(vec![
            EditOperation::replace(Range::new(1, 1, 2, 3), "ZZ"),
            EditOperation::insert(Position::new(3, 6), "!"),
        ])
        .unwrap();

    assert_ne!(m.get_value(EndOfLinePreference::TextDefined, false), original);
    m.apply_edits(
        reverse
            .into_iter()
            .map(|r| EditOperation::replace(r.range, r.text))
            .collect(),
    )
    .unwrap();
    assert_eq!(m.get_value(EndOfLinePreference::TextDefined, false), original);
    assert_eq!(m.line_ending(), LineEnding::Lf);
}

#[test]
fn test_surrogate_pair_validation() {
    let m = model("a\u{1F600}b");
    // Column 3 sits between the two halves of the emoji: strict validation
    // moves it back.
    assert_eq!(
        m.validate_position(Position::new(1, 3)),
        Position::new(1, 2)
    );
    // A range with only its end inside the pair expands the end forward.
    assert_eq!(
        m.validate_range(Range::new(1, 1, 1, 3)),
        Range::new(1, 1, 1, 4)
    );
    // An empty range inside the pair shifts left.
    assert_eq!(
        m.validate_range(Range::new(1, 3, 1, 3)),
        Range::new(1, 2, 1, 2)
    );
}

#[test]
fn test_value_in_range_and_length() {
    let m = model("one\ntwo\nthree");
    assert_eq!(
        m.get_value_in_range(Range::new(1, 2, 3, 3), EndOfLinePreference::TextDefined),
        "ne\ntwo\nth"
    );
    assert_eq!(m.get_value_length(), 13);
    assert_eq!(m.get_full_model_range(), Range::new(1, 1, 3, 6));
}

#[test]
fn test_line_queries_and_errors() {
    let m = model("  hi\nsecond");
    assert_eq!(m.get_line_content(2).unwrap(), "second");
    assert_eq!(m.get_line_first_non_whitespace_column(1).unwrap(), 3);
    assert!(matches!(
        m.get_line_content(3),
        Err(TextModelError::InvalidLineNumber { line: 3, .. })
    ));
    assert!(matches!(
        m.get_line_length(0),
        Err(TextModelError::InvalidLineNumber { line: 0, .. })
    ));
}

#[test]
fn test_modify_position_crosses_lines() {
    let m = model("ab\ncd");
    assert_eq!(m.modify_position(Position::new(1, 3), 1), Position::new(2, 1));
    assert_eq!(m.modify_position(Position::new(2, 1), -1), Position::new(1, 3));
    assert_eq!(m.modify_position(Position::new(1, 1), -5), Position::new(1, 1));
}

#[test]
fn test_set_value_flushes() {
    let mut m = model("old content");
    let flush_seen = std::rc::Rc::new(std::cell::Cell::new(false));
    let sink = std::rc::Rc::clone(&flush_seen);
    m.on_did_change_content(move |e| {
        if e.is_flush {
            sink.set(true);
        }
    });

    let version_before = m.version_id();
    m.set_value("brand\nnew").unwrap();
    assert_eq!(m.get_line_count(), 2);
    assert_eq!(m.version_id(), version_before + 1);
    assert!(flush_seen.get());
    assert!(!m.can_undo(), "set_value drops undo history");
}

#[test]
fn test_disposed_model_errors() {
    let mut m = model("x");
    m.dispose();
    assert!(m.is_disposed());
    assert!(matches!(m.get_line_content(1), Err(TextModelError::Disposed)));
    assert!(matches!(
        m.apply_edits(vec![EditOperation::insert(Position::new(1, 1), "y")]),
        Err(TextModelError::Disposed)
    ));
    // Dispose is idempotent.
    m.dispose();
}

#[test]
fn test_overlapping_edits_rejected() {
    let mut m = model("abcdef");
    assert!(matches!(
        m.apply_edits(vec![
            EditOperation::replace(Range::new(1, 1, 1, 4), "x"),
            EditOperation::replace(Range::new(1, 3, 1, 5), "y"),
        ]),
        Err(TextModelError::OverlappingEdits)
    ));
}

#[test]
fn test_model_identity() {
    let a = model("1");
    let b = model("1");
    assert_ne!(a.id(), b.id());
    assert!(a.id().starts_with("$model"));
    assert!(a.uri().starts_with("inmemory://model/"));
    assert!(a.equals(&b));
}
