use crate::parse::ParseError;

///
/// TokenKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Semi,
    Comma,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `=in=`
    In,
    /// `=out=`
    Out,
    /// Bare word: identifiers, keywords, numbers, datetimes, wildcards.
    Word(String),
    /// Single-quoted string with the quotes stripped.
    Quoted(String),
}

impl TokenKind {
    /// Human-readable form for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::Semi => "';'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Eq => "'=='".to_string(),
            Self::Ne => "'!='".to_string(),
            Self::Lt => "'<'".to_string(),
            Self::Le => "'<='".to_string(),
            Self::Gt => "'>'".to_string(),
            Self::Ge => "'>='".to_string(),
            Self::In => "'=in='".to_string(),
            Self::Out => "'=out='".to_string(),
            Self::Word(word) => format!("'{word}'"),
            Self::Quoted(_) => "string literal".to_string(),
        }
    }
}

///
/// Token
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    const fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

// Word tokens absorb everything a bare FIQL argument may contain:
// identifiers, numbers, datetimes (with `-`, `:`, `+`), and `*` markers.
const fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '*' | '-' | '+')
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::new(TokenKind::LParen, offset));
                i += 1;
            }
            ')' => {
                tokens.push(Token::new(TokenKind::RParen, offset));
                i += 1;
            }
            ';' => {
                tokens.push(Token::new(TokenKind::Semi, offset));
                i += 1;
            }
            ',' => {
                tokens.push(Token::new(TokenKind::Comma, offset));
                i += 1;
            }
            '<' | '>' => {
                let wide = matches!(chars.get(i + 1), Some((_, '=')));
                let kind = match (c, wide) {
                    ('<', true) => TokenKind::Le,
                    ('<', false) => TokenKind::Lt,
                    (_, true) => TokenKind::Ge,
                    (_, false) => TokenKind::Gt,
                };
                tokens.push(Token::new(kind, offset));
                i += if wide { 2 } else { 1 };
            }
            '!' => {
                if matches!(chars.get(i + 1), Some((_, '='))) {
                    tokens.push(Token::new(TokenKind::Ne, offset));
                    i += 2;
                } else {
                    return Err(ParseError::UnexpectedChar { ch: '!', offset });
                }
            }
            '=' => {
                if matches!(chars.get(i + 1), Some((_, '='))) {
                    tokens.push(Token::new(TokenKind::Eq, offset));
                    i += 2;
                    continue;
                }
                // FIQL named operator: `=word=`
                let mut j = i + 1;
                let mut word = String::new();
                while let Some((_, c)) = chars.get(j) {
                    if c.is_ascii_alphabetic() {
                        word.push(*c);
                        j += 1;
                    } else {
                        break;
                    }
                }
                if word.is_empty() || !matches!(chars.get(j), Some((_, '='))) {
                    return Err(ParseError::UnexpectedChar { ch: '=', offset });
                }
                let kind = match word.as_str() {
                    "gt" => TokenKind::Gt,
                    "ge" => TokenKind::Ge,
                    "lt" => TokenKind::Lt,
                    "le" => TokenKind::Le,
                    "in" => TokenKind::In,
                    "out" => TokenKind::Out,
                    _ => return Err(ParseError::UnknownOperator { op: word, offset }),
                };
                tokens.push(Token::new(kind, offset));
                i = j + 1;
            }
            '\'' => {
                let mut j = i + 1;
                let mut inner = String::new();
                loop {
                    match chars.get(j) {
                        Some((_, '\'')) => break,
                        Some((_, c)) => {
                            inner.push(*c);
                            j += 1;
                        }
                        None => return Err(ParseError::UnterminatedString { offset }),
                    }
                }
                tokens.push(Token::new(TokenKind::Quoted(inner), offset));
                i = j + 1;
            }
            c if is_word_char(c) => {
                let mut j = i;
                let mut word = String::new();
                while let Some((_, c)) = chars.get(j) {
                    if is_word_char(*c) {
                        word.push(*c);
                        j += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(TokenKind::Word(word), offset));
                i = j;
            }
            other => return Err(ParseError::UnexpectedChar { ch: other, offset }),
        }
    }

    Ok(tokens)
}
