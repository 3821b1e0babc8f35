/// Recursive-descent parser for binding expressions.
///
/// Precedence, lowest first: arrow / ternary, `??`, `||`, `&&`, equality,
/// relational, additive, multiplicative, unary, postfix (member, index,
/// call), primary.
use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::evaluator::EvalError;
use super::lexer::{tokenize, SpannedToken, Token};
use serde_json::Value;

/// Deepest nesting of sub-expressions accepted before giving up.
const MAX_NESTING: usize = 128;

/// Most operator, access and call nodes one expression may contain. Left
/// associative chains are built iteratively, so this bounds the tree height
/// the evaluator has to recurse through.
const MAX_NODES: usize = 256;

// ─── Public entry point ───────────────────────────────────────────────────────

/// Parse a complete expression. Trailing tokens are an error.
pub fn parse(src: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(EvalError::Syntax {
            message: "empty expression".to_string(),
            offset: 0,
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        src_len: src.len(),
        depth: 0,
        nodes: 0,
    };
    let expr = parser.parse_expr()?;
    if let Some(tok) = parser.tokens.get(parser.pos) {
        return Err(EvalError::Syntax {
            message: format!("unexpected token {:?}", tok.token),
            offset: tok.offset,
        });
    }
    Ok(expr)
}

// ─── Parser ───────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    src_len: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead).map(|t| &t.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.src_len, |t| t.offset)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Token::Punct(p)) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), EvalError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", punct)))
        }
    }

    fn error(&self, message: String) -> EvalError {
        EvalError::Syntax {
            message,
            offset: self.offset(),
        }
    }

    /// Count one composite node against [`MAX_NODES`].
    fn grow(&mut self) -> Result<(), EvalError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(self.error("expression is too large".to_string()));
        }
        Ok(())
    }

    fn is_punct(tok: Option<&Token>, punct: &str) -> bool {
        matches!(tok, Some(Token::Punct(p)) if *p == punct)
    }

    // ── Levels ────────────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.depth += 1;
        let result = if self.depth > MAX_NESTING {
            Err(self.error("expression nested too deeply".to_string()))
        } else {
            self.parse_conditional()
        };
        self.depth -= 1;
        result
    }

    fn parse_conditional(&mut self) -> Result<Expr, EvalError> {
        if let Some(lambda) = self.try_parse_lambda()? {
            return Ok(lambda);
        }
        let test = self.parse_nullish()?;
        if self.eat("?") {
            self.grow()?;
            let consequent = self.parse_expr()?;
            self.expect(":")?;
            let alternate = self.parse_expr()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(test)
    }

    /// `x => body` or `(x) => body`.
    fn try_parse_lambda(&mut self) -> Result<Option<Expr>, EvalError> {
        let (param, consumed) = match (self.peek(), self.peek_at(1), self.peek_at(2), self.peek_at(3)) {
            (Some(Token::Ident(name)), arrow, _, _) if Self::is_punct(arrow, "=>") => {
                (name.clone(), 2)
            }
            (open, Some(Token::Ident(name)), close, arrow)
                if Self::is_punct(open, "(")
                    && Self::is_punct(close, ")")
                    && Self::is_punct(arrow, "=>") =>
            {
                (name.clone(), 4)
            }
            _ => return Ok(None),
        };
        self.pos += consumed;
        self.grow()?;
        let body = self.parse_expr()?;
        Ok(Some(Expr::Lambda {
            param,
            body: Box::new(body),
        }))
    }

    fn parse_nullish(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_or()?;
        while self.eat("??") {
            self.grow()?;
            let right = self.parse_or()?;
            left = logical(LogicalOp::Nullish, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            self.grow()?;
            let right = self.parse_and()?;
            left = logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_equality()?;
        while self.eat("&&") {
            self.grow()?;
            let right = self.parse_equality()?;
            left = logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct("===")) => BinaryOp::StrictEq,
                Some(Token::Punct("!==")) => BinaryOp::StrictNe,
                Some(Token::Punct("==")) => BinaryOp::Eq,
                Some(Token::Punct("!=")) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            self.grow()?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct("<")) => BinaryOp::Lt,
                Some(Token::Punct("<=")) => BinaryOp::Le,
                Some(Token::Punct(">")) => BinaryOp::Gt,
                Some(Token::Punct(">=")) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            self.grow()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct("+")) => BinaryOp::Add,
                Some(Token::Punct("-")) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            self.grow()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Punct("*")) => BinaryOp::Mul,
                Some(Token::Punct("/")) => BinaryOp::Div,
                Some(Token::Punct("%")) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            self.grow()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Some(Token::Punct("!")) => UnaryOp::Not,
            Some(Token::Punct("-")) => UnaryOp::Neg,
            Some(Token::Punct("+")) => UnaryOp::Plus,
            Some(Token::Ident(name)) if name == "typeof" => UnaryOp::TypeOf,
            _ => return self.parse_postfix(),
        };
        self.pos += 1;
        self.grow()?;
        self.depth += 1;
        let operand = if self.depth > MAX_NESTING {
            Err(self.error("expression nested too deeply".to_string()))
        } else {
            self.parse_unary()
        };
        self.depth -= 1;
        let operand = operand?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            if matches!(self.peek(), Some(Token::Punct("." | "?." | "[" | "("))) {
                self.grow()?;
            }
            if self.eat(".") {
                let property = self.expect_property_name()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional: false,
                };
            } else if self.eat("?.") {
                if self.eat("[") {
                    let index = self.parse_expr()?;
                    self.expect("]")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        optional: true,
                    };
                } else {
                    let property = self.expect_property_name()?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                        optional: true,
                    };
                }
            } else if self.eat("[") {
                let index = self.parse_expr()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                };
            } else if self.eat("(") {
                let args = self.parse_list(")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn expect_property_name(&mut self) -> Result<String, EvalError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error("expected property name".to_string())),
        }
    }

    /// Comma-separated expressions up to (and consuming) `close`.
    fn parse_list(&mut self, close: &str) -> Result<Vec<Expr>, EvalError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(",")?;
            // trailing comma
            if self.eat(close) {
                return Ok(items);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let tok = match self.peek() {
            Some(t) => t.clone(),
            None => return Err(self.error("unexpected end of expression".to_string())),
        };
        self.pos += 1;
        match tok {
            Token::Num(n) => Ok(Expr::Literal(super::value::number(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Undefined,
                _ => Expr::Ident(name),
            }),
            Token::Punct("(") => {
                let inner = self.parse_expr()?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Punct("[") => Ok(Expr::Array(self.parse_list("]")?)),
            Token::Punct(p) => {
                self.pos -= 1;
                Err(self.error(format!("unexpected '{}'", p)))
            }
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
