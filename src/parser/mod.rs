//! Tokenizer - PEST-based whitespace tokenizer for Strand programs
//!
//! Produces the flat token stream the scheduler executes, with a source
//! position for every token. Tokens are never interpreted here; the
//! instruction decoder in `interpreter::types::op` does that.

use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::interpreter::types::SourcePos;

#[cfg(test)]
mod tests;

/* ===================== Program ===================== */

/// A tokenized program
///
/// `positions[i]` describes `tokens[i]`; `positions[i].index == i` for a
/// freshly tokenized program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub tokens: Vec<String>,
    pub positions: Vec<SourcePos>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "parser/tokens.pest"]
struct TokenParser;

/* ===================== Error Types ===================== */

#[derive(Debug)]
pub enum ParseError {
    PestError(String, Option<(usize, usize)>),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::PestError(msg, Some((line, col))) => {
                write!(f, "line {}, column {}: {}", line + 1, col + 1, msg)
            }
            ParseError::PestError(msg, None) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let pos = match err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => {
                Some((line.saturating_sub(1), col.saturating_sub(1)))
            }
            pest::error::LineColLocation::Span((line, col), _) => {
                Some((line.saturating_sub(1), col.saturating_sub(1)))
            }
        };
        ParseError::PestError(err.to_string(), pos)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Split program text into tokens on runs of whitespace
///
/// An empty or all-whitespace source yields an empty program.
pub fn tokenize(source: &str) -> ParseResult<Program> {
    let pairs = TokenParser::parse(Rule::program, source)?;

    let mut program = Program::default();

    for pair in pairs.flatten() {
        if pair.as_rule() != Rule::token {
            continue;
        }

        let (line, col) = pair.line_col();
        let index = program.tokens.len();

        program.tokens.push(pair.as_str().to_string());
        program.positions.push(SourcePos {
            index,
            line: line.saturating_sub(1),
            col: col.saturating_sub(1),
        });
    }

    Ok(program)
}
