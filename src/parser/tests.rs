//! Tokenizer tests
//!
//! These tests only check token boundaries and positions. Execution is
//! covered by the interpreter tests.

use super::tokenize;

#[test]
fn test_tokenize_simple_program() {
    let program = tokenize("3 4 map2 [ dup * ]").expect("Should tokenize");

    assert_eq!(
        program.tokens,
        vec!["3", "4", "map2", "[", "dup", "*", "]"]
    );
    assert_eq!(program.positions.len(), program.tokens.len());
}

#[test]
fn test_tokenize_indices_follow_token_order() {
    let program = tokenize("a b c d").unwrap();

    let indices: Vec<usize> = program.positions.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn test_tokenize_collapses_whitespace_runs() {
    let program = tokenize("  1 \t\t 2\n\n   3   ").unwrap();

    assert_eq!(program.tokens, vec!["1", "2", "3"]);
}

#[test]
fn test_tokenize_line_and_column() {
    let program = tokenize("1 2\n  dup\n[ * ]").unwrap();

    let dup = &program.positions[2];
    assert_eq!((dup.line, dup.col), (1, 2));

    let open = &program.positions[3];
    assert_eq!((open.line, open.col), (2, 0));

    let close = &program.positions[5];
    assert_eq!((close.line, close.col), (2, 4));
}

#[test]
fn test_tokenize_empty_source() {
    let program = tokenize("").unwrap();
    assert!(program.is_empty());

    let program = tokenize(" \n\t ").unwrap();
    assert!(program.is_empty());
}

#[test]
fn test_tokenize_brackets_need_whitespace() {
    // Delimiters are ordinary tokens, so "[dup" stays glued together
    let program = tokenize("[dup *]").unwrap();

    assert_eq!(program.tokens, vec!["[dup", "*]"]);
}

#[test]
fn test_parse_error_reports_position() {
    use super::{ParseError, Rule};
    use pest::error::{Error, ErrorVariant};
    use pest::Position;

    let source = "1 2\n  map2";
    let pos = Position::new(source, 6).unwrap();
    let err: ParseError = Error::<Rule>::new_from_pos(
        ErrorVariant::CustomError {
            message: "bad token".to_string(),
        },
        pos,
    )
    .into();

    let ParseError::PestError(_, line_col) = &err;
    assert_eq!(*line_col, Some((1, 2)));
    assert!(err.to_string().starts_with("line 2, column 3: "));
}
