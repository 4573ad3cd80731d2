//! Instruction decoding
//!
//! Tokens are decoded into a closed set of opcodes before dispatch. The
//! arity of `mapN` travels in the variant, so `map7` still decodes and is
//! rejected when executed.

use super::values::Val;

/// Block delimiters
pub const BLOCK_OPEN: &str = "[";
pub const BLOCK_CLOSE: &str = "]";

/// Decoded instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Push a literal value
    Push(Val),

    Dup,
    Drop,
    Swap,
    Over,

    Add,
    Sub,
    Mul,
    Div,
    Mod,

    Eq,
    Lt,
    Gt,
    Not,

    /// `[` - run the matching block in a nested frame
    BlockOpen,
    /// `]` - only legal as the end of a block, never executed
    BlockClose,

    /// Pop a condition, skip the next instruction or block when falsy
    If,
    /// Clone the running thread (branch)
    Fork,
    /// Parallel map over N popped values
    Map(u8),

    Unknown(String),
}

impl Op {
    /// Decode a token
    pub fn decode(token: &str) -> Op {
        if let Some(val) = Val::parse_literal(token) {
            return Op::Push(val);
        }

        match token {
            BLOCK_OPEN => Op::BlockOpen,
            BLOCK_CLOSE => Op::BlockClose,
            "dup" => Op::Dup,
            "drop" => Op::Drop,
            "swap" => Op::Swap,
            "over" => Op::Over,
            "+" => Op::Add,
            "-" => Op::Sub,
            "*" => Op::Mul,
            "/" => Op::Div,
            "%" => Op::Mod,
            "=" => Op::Eq,
            "<" => Op::Lt,
            ">" => Op::Gt,
            "not" => Op::Not,
            "if" => Op::If,
            "fork" => Op::Fork,
            _ => decode_map(token).unwrap_or_else(|| Op::Unknown(token.to_string())),
        }
    }

    /// Instruction name for logs and error messages
    pub fn name(&self) -> String {
        match self {
            Op::Push(v) => v.to_string(),
            Op::Dup => "dup".into(),
            Op::Drop => "drop".into(),
            Op::Swap => "swap".into(),
            Op::Over => "over".into(),
            Op::Add => "+".into(),
            Op::Sub => "-".into(),
            Op::Mul => "*".into(),
            Op::Div => "/".into(),
            Op::Mod => "%".into(),
            Op::Eq => "=".into(),
            Op::Lt => "<".into(),
            Op::Gt => ">".into(),
            Op::Not => "not".into(),
            Op::BlockOpen => BLOCK_OPEN.into(),
            Op::BlockClose => BLOCK_CLOSE.into(),
            Op::If => "if".into(),
            Op::Fork => "fork".into(),
            Op::Map(n) => format!("map{}", n),
            Op::Unknown(token) => token.clone(),
        }
    }
}

/// `map<digits>` with a value that fits in a u8
fn decode_map(token: &str) -> Option<Op> {
    let digits = token.strip_prefix("map")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u8>().ok().map(Op::Map)
}
