//! Message protocol
//!
//! Simulated instruments behave like message-based VISA sessions: ASCII lines
//! terminated by `\n` in both directions. Requests are either queries
//! (`?MNEMONIC args...`) or sets/actions (`!MNEMONIC args...`). Replies are a
//! value, `OK` or `ERROR`. Binary payloads use the IEEE 488.2 definite-length
//! block format `#<D><length><data>`.

use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// Terminator expected at the end of every request
pub const RECV_TERMINATION: u8 = b'\n';

/// Terminator appended to every reply
pub const SEND_TERMINATION: &[u8] = b"\n";

/// Reply to a successful set or action
pub const OK_REPLY: &str = "OK";

/// Reply to any failed command
pub const ERROR_REPLY: &str = "ERROR";

/// Longest request line accepted, terminator excluded
pub const MAX_LINE: usize = 4096;

/// Whether a command reads or changes instrument state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `?` prefix
    Query,
    /// `!` prefix
    Set,
}

impl CommandKind {
    fn prefix(self) -> char {
        match self {
            CommandKind::Query => '?',
            CommandKind::Set => '!',
        }
    }
}

/// A parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Query or set
    pub kind: CommandKind,
    /// Upper-cased mnemonic, e.g. `AMP`
    pub mnemonic: String,
    /// Whitespace separated arguments
    pub args: Vec<String>,
}

impl Command {
    /// Parse a request line. Surrounding whitespace, including a trailing
    /// `\r`, is ignored.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        if !line.is_ascii() {
            return Err(CommandError::NotAscii);
        }

        let kind = match line.as_bytes()[0] {
            b'?' => CommandKind::Query,
            b'!' => CommandKind::Set,
            _ => return Err(CommandError::BadPrefix(line.to_string())),
        };

        let mut parts = line[1..].split_ascii_whitespace();
        let mnemonic = parts
            .next()
            .ok_or_else(|| CommandError::Unknown(line.to_string()))?
            .to_ascii_uppercase();
        let args = parts.map(str::to_string).collect();

        Ok(Self {
            kind,
            mnemonic,
            args,
        })
    }

    /// Shorthand for a query with no arguments
    pub fn is_query(&self, mnemonic: &str) -> bool {
        self.kind == CommandKind::Query && self.mnemonic == mnemonic
    }

    /// Fail unless exactly `expected` arguments were given
    pub fn expect_args(&self, expected: usize) -> Result<(), CommandError> {
        if self.args.len() != expected {
            return Err(CommandError::ArgumentCount {
                command: self.to_string(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }

    /// Parse argument `index` as `T`
    pub fn arg<T: FromStr>(&self, index: usize) -> Result<T, CommandError> {
        let raw = self.args.get(index).ok_or_else(|| CommandError::ArgumentCount {
            command: self.to_string(),
            expected: index + 1,
            got: self.args.len(),
        })?;
        raw.parse()
            .map_err(|_| CommandError::InvalidArgument(raw.clone()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.mnemonic)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Successful reply to a command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `OK`
    Ok,
    /// A textual value
    Value(String),
    /// A binary payload sent as a definite-length block
    Block(Vec<u8>),
}

impl Reply {
    /// A numeric value, printed in its shortest exact form
    pub fn number(value: f64) -> Self {
        // Avoid sending "-0"
        let value = if value == 0.0 { 0.0 } else { value };
        Reply::Value(format!("{value}"))
    }

    /// A boolean as `1` or `0`
    pub fn flag(value: bool) -> Self {
        Reply::Value(if value { "1" } else { "0" }.to_string())
    }
}

/// Encode a command outcome for the wire, terminator included
pub fn encode_reply(result: &Result<Reply, CommandError>) -> Vec<u8> {
    let mut bytes = match result {
        Ok(Reply::Ok) => OK_REPLY.as_bytes().to_vec(),
        Ok(Reply::Value(value)) => value.as_bytes().to_vec(),
        Ok(Reply::Block(data)) => encode_block(data),
        Err(_) => ERROR_REPLY.as_bytes().to_vec(),
    };
    bytes.extend_from_slice(SEND_TERMINATION);
    bytes
}

/// Wrap `data` in an IEEE 488.2 definite-length block header
pub fn encode_block(data: &[u8]) -> Vec<u8> {
    let length = data.len().to_string();
    let mut block = Vec::with_capacity(2 + length.len() + data.len());
    block.push(b'#');
    block.push(b'0' + length.len() as u8);
    block.extend_from_slice(length.as_bytes());
    block.extend_from_slice(data);
    block
}

/// Parse the `<D>` digit of a block header, i.e. the width of `<length>`
pub fn block_length_width(digit: u8) -> Result<usize, CommandError> {
    match digit {
        b'1'..=b'9' => Ok(usize::from(digit - b'0')),
        _ => Err(CommandError::MalformedBlock("length width must be 1-9")),
    }
}

/// Parse the `<length>` field of a block header
pub fn block_length(field: &[u8]) -> Result<usize, CommandError> {
    std::str::from_utf8(field)
        .ok()
        .filter(|text| text.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|text| text.parse().ok())
        .ok_or(CommandError::MalformedBlock("length is not a decimal number"))
}

/// Extract the payload of a definite-length block at the start of `bytes`.
///
/// Bytes after the payload (a terminator, for instance) are ignored.
pub fn decode_block(bytes: &[u8]) -> Result<&[u8], CommandError> {
    match bytes.first() {
        Some(b'#') => {}
        _ => return Err(CommandError::MalformedBlock("missing '#' header")),
    }
    let width = block_length_width(
        *bytes
            .get(1)
            .ok_or(CommandError::MalformedBlock("truncated header"))?,
    )?;
    let field = bytes
        .get(2..2 + width)
        .ok_or(CommandError::MalformedBlock("truncated header"))?;
    let length = block_length(field)?;

    let start = 2 + width;
    bytes
        .get(start..start + length)
        .ok_or(CommandError::MalformedBlock("payload shorter than declared length"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_queries_and_sets() {
        let query = Command::parse("?amp\r").unwrap();
        assert_eq!(query.kind, CommandKind::Query);
        assert_eq!(query.mnemonic, "AMP");
        assert!(query.args.is_empty());
        assert!(query.is_query("AMP"));

        let set = Command::parse("!DOU 3  1").unwrap();
        assert_eq!(set.kind, CommandKind::Set);
        assert_eq!(set.mnemonic, "DOU");
        assert_eq!(set.args, ["3", "1"]);
        assert_eq!(set.to_string(), "!DOU 3 1");
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_matches!(Command::parse("   "), Err(CommandError::Empty));
        assert_matches!(Command::parse("?AMPé"), Err(CommandError::NotAscii));
        assert_matches!(Command::parse("AMP 1"), Err(CommandError::BadPrefix(_)));
        assert_matches!(Command::parse("?"), Err(CommandError::Unknown(_)));
    }

    #[test]
    fn argument_helpers() {
        let command = Command::parse("!TES 2 x").unwrap();
        assert_eq!(command.arg::<u32>(0).unwrap(), 2);
        assert_matches!(command.arg::<u32>(1), Err(CommandError::InvalidArgument(raw)) if raw == "x");
        assert_matches!(
            command.arg::<u32>(2),
            Err(CommandError::ArgumentCount { expected: 3, got: 2, .. })
        );
        assert!(command.expect_args(2).is_ok());
        assert!(command.expect_args(1).is_err());
    }

    #[test]
    fn replies_are_terminated() {
        assert_eq!(encode_reply(&Ok(Reply::Ok)), b"OK\n");
        assert_eq!(encode_reply(&Ok(Reply::number(1.5))), b"1.5\n");
        assert_eq!(encode_reply(&Ok(Reply::number(-0.0))), b"0\n");
        assert_eq!(encode_reply(&Ok(Reply::flag(true))), b"1\n");
        assert_eq!(encode_reply(&Err(CommandError::Empty)), b"ERROR\n");
        assert_eq!(encode_reply(&Ok(Reply::Block(vec![7, 8]))), b"#12\x07\x08\n");
    }

    #[test]
    fn block_header_counts_length_digits() {
        assert_eq!(encode_block(&[]), b"#10");
        assert_eq!(encode_block(&[0u8; 12])[..4], *b"#212");

        let payload = vec![0x0Au8; 1000];
        let block = encode_block(&payload);
        assert_eq!(&block[..6], b"#41000");
        assert_eq!(decode_block(&block).unwrap(), payload.as_slice());
    }

    #[test]
    fn decode_rejects_bad_headers() {
        assert_matches!(decode_block(b"12abc"), Err(CommandError::MalformedBlock(_)));
        assert_matches!(decode_block(b"#0"), Err(CommandError::MalformedBlock(_)));
        assert_matches!(decode_block(b"#2x1abc"), Err(CommandError::MalformedBlock(_)));
        assert_matches!(decode_block(b"#15abc"), Err(CommandError::MalformedBlock(_)));
        assert_matches!(decode_block(b"#"), Err(CommandError::MalformedBlock(_)));
    }

    #[test]
    fn decode_ignores_trailing_terminator() {
        assert_eq!(decode_block(b"#13abc\n").unwrap(), b"abc");
    }
}
