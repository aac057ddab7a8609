//! Tokenizer for expressions.

use common_error::{QuarryError, QuarryResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Integer(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Slash,
    Dot,
    DotDot,
    At,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Percent,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

pub(crate) fn tokenize(source: &str) -> QuarryResult<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                    is_float = true;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        is_float = true;
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let token = if is_float {
                    Token::Float(text.parse().map_err(|_| invalid_number(&text))?)
                } else {
                    Token::Integer(text.parse().map_err(|_| invalid_number(&text))?)
                };
                tokens.push(token);
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => {
                            return Err(QuarryError::expression("unterminated string literal"))
                        }
                        Some('"') => break,
                        Some('\\') => {
                            match chars.get(i + 1) {
                                Some('n') => text.push('\n'),
                                Some('t') => text.push('\t'),
                                Some(&other) => text.push(other),
                                None => {
                                    return Err(QuarryError::expression(
                                        "unterminated string literal",
                                    ))
                                }
                            }
                            i += 2;
                        }
                        Some(&other) => {
                            text.push(other);
                            i += 1;
                        }
                    }
                }
                i += 1;
                tokens.push(Token::Str(text));
                continue;
            }
            '.' if next == Some('.') => {
                tokens.push(Token::DotDot);
                i += 2;
                continue;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Eq);
                i += 2;
                continue;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
                continue;
            }
            '<' if next == Some('=') => {
                tokens.push(Token::Le);
                i += 2;
                continue;
            }
            '>' if next == Some('=') => {
                tokens.push(Token::Ge);
                i += 2;
                continue;
            }
            _ => {}
        }
        let token = match c {
            '.' => Token::Dot,
            '/' => Token::Slash,
            '@' => Token::At,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '%' => Token::Percent,
            '<' => Token::Lt,
            '>' => Token::Gt,
            other => {
                return Err(QuarryError::expression(format!(
                    "unexpected character '{other}' at position {i}"
                )))
            }
        };
        tokens.push(token);
        i += 1;
    }
    Ok(tokens)
}

fn invalid_number(text: &str) -> QuarryError {
    QuarryError::expression(format!("invalid number '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_path_and_operators() {
        let tokens = tokenize("/a[2]/../b@ <= 1.5e2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Slash,
                Token::Ident("a".into()),
                Token::LBracket,
                Token::Integer(2),
                Token::RBracket,
                Token::Slash,
                Token::DotDot,
                Token::Slash,
                Token::Ident("b".into()),
                Token::At,
                Token::Le,
                Token::Float(150.0),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\"b""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("a\"b".into())]);
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(tokenize("1 # 2").unwrap_err().code(), -401);
    }
}
