//! Command line tokenizer and parser.
//!
//! Grammar, in order of precedence:
//!
//! 1. Whitespace (space, tab, CR, LF) separates tokens.
//! 2. `--key[=value]` is a named argument. A bare `--flag` gets the
//!    literal value `"true"`; a value may be quoted.
//! 3. `"…"` and `'…'` are quoted strings with `\n`, `\t`, `\r`, `\\`,
//!    `\"` and `\'` escapes; any other escaped character is itself.
//! 4. Anything else is a plain token, ending at the next whitespace.
//!
//! The first token must be plain and becomes the command name. Remaining
//! plain and quoted tokens are positional values; named arguments are
//! last-write-wins.

use crate::args::CommandArgs;
use crate::value::CommandValue;
use thiserror::Error;

/// Reasons a command line fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command line")]
    EmptyInput,
    #[error("no tokens found")]
    NoTokens,
    #[error("command name must be a plain token")]
    InvalidCommandName,
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Plain(String),
    Quoted(String),
    Named { key: String, value: String },
}

/// Parses one command line into a [`CommandArgs`].
pub fn parse(line: &str) -> Result<CommandArgs, ParseError> {
    if line.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let tokens = tokenize(line);
    let mut tokens = tokens.into_iter();

    let mut args = match tokens.next() {
        None => return Err(ParseError::NoTokens),
        Some(Token::Plain(name)) => CommandArgs::new(name),
        Some(_) => return Err(ParseError::InvalidCommandName),
    };

    for token in tokens {
        match token {
            Token::Plain(value) | Token::Quoted(value) => {
                args.positional.push(CommandValue::coerce(&value));
            }
            Token::Named { key, value } => {
                args.named.insert(key, CommandValue::coerce(&value));
            }
        }
    }

    Ok(args)
}

fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        if is_whitespace(chars[pos]) {
            pos += 1;
        } else if chars[pos] == '-' && chars.get(pos + 1) == Some(&'-') {
            tokens.push(read_named(&chars, &mut pos));
        } else if chars[pos] == '"' || chars[pos] == '\'' {
            tokens.push(Token::Quoted(read_quoted(&chars, &mut pos)));
        } else {
            tokens.push(Token::Plain(read_plain(&chars, &mut pos)));
        }
    }

    tokens
}

/// Reads a quoted string. `pos` is at the opening quote. An unterminated
/// quote runs to the end of the input.
fn read_quoted(chars: &[char], pos: &mut usize) -> String {
    let quote = chars[*pos];
    *pos += 1;

    let mut value = String::new();
    let mut escaped = false;

    while *pos < chars.len() {
        let c = chars[*pos];
        if escaped {
            value.push(match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            *pos += 1;
            break;
        } else {
            value.push(c);
        }
        *pos += 1;
    }

    value
}

/// Reads a `--key[=value]` token. `pos` is at the first dash.
fn read_named(chars: &[char], pos: &mut usize) -> Token {
    *pos += 2;

    let key_start = *pos;
    while *pos < chars.len() && chars[*pos] != '=' && !is_whitespace(chars[*pos]) {
        *pos += 1;
    }
    let key: String = chars[key_start..*pos].iter().collect();

    let value = if chars.get(*pos) == Some(&'=') {
        *pos += 1;
        if matches!(chars.get(*pos), Some(&'"') | Some(&'\'')) {
            read_quoted(chars, pos)
        } else {
            let value_start = *pos;
            while *pos < chars.len() && !is_whitespace(chars[*pos]) {
                *pos += 1;
            }
            chars[value_start..*pos].iter().collect()
        }
    } else {
        // Bare flag.
        "true".to_owned()
    };

    Token::Named { key, value }
}

fn read_plain(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && !is_whitespace(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}
