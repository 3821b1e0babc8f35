/// Lexer for the binding expression language.
///
/// Converts expression text into a flat sequence of [`Token`]s. Byte offsets
/// are kept on every token so parse errors can point at the offending spot.
use super::evaluator::EvalError;

// ─── Tokens ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    /// Operators and punctuation, longest match first (`===` before `==`).
    Punct(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub offset: usize,
}

const PUNCTUATION: &[&str] = &[
    "===", "!==", "?.", "??", "=>", "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%",
    "<", ">", "!", "?", ":", ".", ",", "(", ")", "[", "]",
];

// ─── Tokenizer ────────────────────────────────────────────────────────────────

pub fn tokenize(src: &str) -> Result<Vec<SpannedToken>, EvalError> {
    let mut out = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && bytes.get(i + 1).map_or(false, u8::is_ascii_digit))
        {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            // exponent part: 1e3, 2.5E-4
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text = &src[start..i];
            let n = text.parse::<f64>().map_err(|_| EvalError::Syntax {
                message: format!("invalid number '{}'", text),
                offset: start,
            })?;
            out.push(SpannedToken {
                token: Token::Num(n),
                offset: start,
            });
            continue;
        }

        if c == '"' || c == '\'' {
            let (s, next) = read_string(src, i, c)?;
            out.push(SpannedToken {
                token: Token::Str(s),
                offset: i,
            });
            i = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            out.push(SpannedToken {
                token: Token::Ident(src[start..i].to_string()),
                offset: start,
            });
            continue;
        }

        // `?.` followed by a digit is a ternary with a decimal, not optional chaining
        let rest = &src[i..];
        let punct = PUNCTUATION.iter().find(|p| {
            rest.starts_with(**p)
                && !(**p == "?." && rest[2..].starts_with(|ch: char| ch.is_ascii_digit()))
        });
        match punct {
            Some(p) => {
                out.push(SpannedToken {
                    token: Token::Punct(p),
                    offset: i,
                });
                i += p.len();
            }
            None => {
                let ch = rest.chars().next().unwrap_or('?');
                return Err(EvalError::Syntax {
                    message: format!("unexpected character '{}'", ch),
                    offset: i,
                });
            }
        }
    }

    Ok(out)
}

/// Read a quoted string starting at `start` (the quote itself). Returns the
/// unescaped contents and the byte index just past the closing quote.
fn read_string(src: &str, start: usize, quote: char) -> Result<(String, usize), EvalError> {
    let mut out = String::new();
    let mut escaped = false;
    for (rel, ch) in src[start + 1..].char_indices() {
        if escaped {
            out.push(match ch {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return Ok((out, start + 1 + rel + ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    Err(EvalError::Syntax {
        message: "unterminated string literal".to_string(),
        offset: start,
    })
}
