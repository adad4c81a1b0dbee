use crate::parse::{
    ParseError,
    ast::{CompareToken, Expr, Literal, StringFn},
    token::{Token, TokenKind},
};

///
/// Parser
///
/// Recursive descent over the token stream. Precedence, loosest first:
/// OR (`,` / `or`) < AND (`;` / `and`) < NOT < primary. Logical chains at
/// one level collect into a single n-ary node.
///

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

// A consumed comparison operator: either relational or membership.
enum CompOp {
    Compare(CompareToken),
    Membership { negated: bool },
}

impl Parser {
    pub(crate) const fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }

        let expr = self.or_expr()?;
        if self.current().is_some() {
            return Err(self.unexpected("end of expression"));
        }

        Ok(expr)
    }

    // --- grammar ---

    fn or_expr(&mut self) -> Result<Expr, ParseError> {
        let mut children = vec![self.and_expr()?];
        while self.eat(&TokenKind::Comma) || self.eat_keyword("or") {
            children.push(self.and_expr()?);
        }

        Ok(if children.len() == 1 {
            children.pop().expect("single OR child")
        } else {
            Expr::Or(children)
        })
    }

    fn and_expr(&mut self) -> Result<Expr, ParseError> {
        let mut children = vec![self.unary()?];
        while self.eat(&TokenKind::Semi) || self.eat_keyword("and") {
            children.push(self.unary()?);
        }

        Ok(if children.len() == 1 {
            children.pop().expect("single AND child")
        } else {
            Expr::And(children)
        })
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        // `not` negates unless it is a field name in comparison position.
        if self.at_keyword("not") && !self.comparison_op_follows() {
            self.advance();
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&TokenKind::LParen) {
            // Grouping is a syntactic no-op: the inner node passes through.
            let inner = self.or_expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(inner);
        }

        let function = match self.current().map(|t| &t.kind) {
            Some(TokenKind::Word(word)) => StringFn::from_name(word),
            _ => None,
        };
        if let Some(function) = function {
            if matches!(self.peek(1).map(|t| &t.kind), Some(TokenKind::LParen)) {
                return self.call(function);
            }
        }

        if matches!(self.current().map(|t| &t.kind), Some(TokenKind::Word(_))) {
            return self.comparison();
        }

        Err(self.unexpected("an expression"))
    }

    fn call(&mut self, function: StringFn) -> Result<Expr, ParseError> {
        self.advance(); // function name
        self.expect(TokenKind::LParen, "'('")?;
        let field = self.identifier()?;
        self.expect(TokenKind::Comma, "','")?;
        let arg = self.literal()?;
        self.expect(TokenKind::RParen, "')'")?;

        Ok(Expr::Call {
            function,
            field,
            arg,
        })
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let field = self.identifier()?;

        match self.comparison_op()? {
            CompOp::Compare(op) => {
                let value = self.literal()?;
                Ok(Expr::Compare { field, op, value })
            }
            CompOp::Membership { negated } => {
                let items = self.list()?;
                Ok(Expr::In {
                    field,
                    negated,
                    items,
                })
            }
        }
    }

    fn comparison_op(&mut self) -> Result<CompOp, ParseError> {
        let Some(token) = self.current() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a comparison operator",
            });
        };

        let op = match &token.kind {
            TokenKind::Eq => CompOp::Compare(CompareToken::Eq),
            TokenKind::Ne => CompOp::Compare(CompareToken::Ne),
            TokenKind::Gt => CompOp::Compare(CompareToken::Gt),
            TokenKind::Ge => CompOp::Compare(CompareToken::Ge),
            TokenKind::Lt => CompOp::Compare(CompareToken::Lt),
            TokenKind::Le => CompOp::Compare(CompareToken::Le),
            TokenKind::In => CompOp::Membership { negated: false },
            TokenKind::Out => CompOp::Membership { negated: true },
            TokenKind::Word(word) => match word_comparison(word) {
                Some(op) => op,
                None => return Err(self.unexpected("a comparison operator")),
            },
            _ => return Err(self.unexpected("a comparison operator")),
        };

        self.advance();
        Ok(op)
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        let Some(token) = self.current() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a field name",
            });
        };
        let offset = token.offset;
        let kind = token.kind.clone();

        match kind {
            TokenKind::Word(word) if is_identifier(&word) => {
                self.advance();
                Ok(word)
            }
            TokenKind::Word(word) => Err(ParseError::InvalidIdentifier { name: word, offset }),
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "a field name",
                offset,
            }),
        }
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        let Some(token) = self.current() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "a literal value",
            });
        };
        let offset = token.offset;
        let kind = token.kind.clone();

        match kind {
            TokenKind::Word(word) => {
                self.advance();
                Ok(Literal::word(word))
            }
            TokenKind::Quoted(text) => {
                self.advance();
                Ok(Literal::quoted(text))
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                expected: "a literal value",
                offset,
            }),
        }
    }

    fn list(&mut self) -> Result<Vec<Literal>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut items = vec![self.literal()?];
        while self.eat(&TokenKind::Comma) {
            items.push(self.literal()?);
        }
        self.expect(TokenKind::RParen, "')'")?;

        Ok(items)
    }

    // --- token plumbing ---

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current().is_some_and(|token| token.kind == *kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.current().map(|t| &t.kind),
            Some(TokenKind::Word(word)) if word.eq_ignore_ascii_case(keyword)
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn comparison_op_follows(&self) -> bool {
        match self.peek(1).map(|t| &t.kind) {
            Some(
                TokenKind::Eq
                | TokenKind::Ne
                | TokenKind::Gt
                | TokenKind::Ge
                | TokenKind::Lt
                | TokenKind::Le
                | TokenKind::In
                | TokenKind::Out,
            ) => true,
            Some(TokenKind::Word(word)) => word_comparison(word).is_some(),
            _ => false,
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.current() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.kind.describe(),
                expected,
                offset: token.offset,
            },
            None => ParseError::UnexpectedEnd { expected },
        }
    }
}

// Word-form comparison operators, matched case-insensitively.
fn word_comparison(word: &str) -> Option<CompOp> {
    let op = match word.to_ascii_lowercase().as_str() {
        "eq" => CompOp::Compare(CompareToken::Eq),
        "ne" => CompOp::Compare(CompareToken::Ne),
        "gt" => CompOp::Compare(CompareToken::Gt),
        "ge" => CompOp::Compare(CompareToken::Ge),
        "lt" => CompOp::Compare(CompareToken::Lt),
        "le" => CompOp::Compare(CompareToken::Le),
        "in" => CompOp::Membership { negated: false },
        _ => return None,
    };
    Some(op)
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
