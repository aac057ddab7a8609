//! Expression syntax tree, parser and type checker.

use std::fmt;

use common_error::{QuarryError, QuarryResult};

use super::lexer::{tokenize, Token};

/// Result type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprType {
    Boolean,
    Integer,
    Float,
    String,
    Node,
    Void,
}

impl ExprType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Node => "node",
            Self::Void => "void",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Int,
    Float,
    Str,
    Bool,
    Exists,
    NumElements,
    NumDims,
    Dim,
    Length,
    ByteSize,
    Goto,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "str" => Self::Str,
            "bool" => Self::Bool,
            "exists" => Self::Exists,
            "numelements" => Self::NumElements,
            "numdims" => Self::NumDims,
            "dim" => Self::Dim,
            "length" => Self::Length,
            "bytesize" => Self::ByteSize,
            "goto" => Self::Goto,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Step {
    Current,
    Parent,
    Field(String),
    Index(Box<Expr>),
    Attributes,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Str(String),
    Node { absolute: bool, steps: Vec<Step> },
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Whether evaluation needs no cursor.
    pub(crate) fn is_constant(&self) -> bool {
        match self {
            Self::Boolean(_) | Self::Integer(_) | Self::Float(_) | Self::Str(_) => true,
            Self::Node { .. } => false,
            Self::Neg(inner) | Self::Not(inner) => inner.is_constant(),
            Self::Binary { left, right, .. } => left.is_constant() && right.is_constant(),
            Self::Call { args, .. } => args.iter().all(Expr::is_constant),
        }
    }

    /// Static type, rejecting ill-typed trees.
    pub(crate) fn type_check(&self) -> QuarryResult<ExprType> {
        match self {
            Self::Boolean(_) => Ok(ExprType::Boolean),
            Self::Integer(_) => Ok(ExprType::Integer),
            Self::Float(_) => Ok(ExprType::Float),
            Self::Str(_) => Ok(ExprType::String),
            Self::Node { steps, .. } => {
                for step in steps {
                    if let Step::Index(index) = step {
                        expect(index.type_check()?, &[ExprType::Integer], "array index")?;
                    }
                }
                Ok(ExprType::Node)
            }
            Self::Neg(inner) => {
                let t = inner.type_check()?;
                expect(t, &[ExprType::Integer, ExprType::Float], "unary minus")?;
                Ok(t)
            }
            Self::Not(inner) => {
                expect(inner.type_check()?, &[ExprType::Boolean], "not")?;
                Ok(ExprType::Boolean)
            }
            Self::Binary { op, left, right } => {
                let l = left.type_check()?;
                let r = right.type_check()?;
                binary_type(*op, l, r)
            }
            Self::Call { function, args } => {
                let types = args
                    .iter()
                    .map(Expr::type_check)
                    .collect::<QuarryResult<Vec<_>>>()?;
                call_type(*function, &types)
            }
        }
    }
}

fn expect(actual: ExprType, allowed: &[ExprType], context: &str) -> QuarryResult<()> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(QuarryError::expression(format!(
            "invalid argument type ({actual}) for {context}"
        )))
    }
}

fn binary_type(op: BinaryOp, l: ExprType, r: ExprType) -> QuarryResult<ExprType> {
    use BinaryOp::*;
    let mismatch = || {
        Err(QuarryError::expression(format!(
            "invalid operand types ({l}, {r}) for {op:?}"
        )))
    };
    match op {
        Add if l == ExprType::String && r == ExprType::String => Ok(ExprType::String),
        Add | Sub | Mul | Div if l.is_numeric() && r.is_numeric() => {
            if l == ExprType::Integer && r == ExprType::Integer {
                Ok(ExprType::Integer)
            } else {
                Ok(ExprType::Float)
            }
        }
        Rem if l == ExprType::Integer && r == ExprType::Integer => Ok(ExprType::Integer),
        Eq | Ne | Lt | Le | Gt | Ge
            if (l.is_numeric() && r.is_numeric())
                || (l == ExprType::String && r == ExprType::String) =>
        {
            Ok(ExprType::Boolean)
        }
        Eq | Ne if l == ExprType::Boolean && r == ExprType::Boolean => Ok(ExprType::Boolean),
        And | Or if l == ExprType::Boolean && r == ExprType::Boolean => Ok(ExprType::Boolean),
        _ => mismatch(),
    }
}

fn call_type(function: Function, args: &[ExprType]) -> QuarryResult<ExprType> {
    use ExprType::*;
    let (params, result): (&[&[ExprType]], ExprType) = match function {
        Function::Int => (&[&[Node, Integer, Float, String, Boolean]], Integer),
        Function::Float => (&[&[Node, Integer, Float, String]], Float),
        Function::Str => (&[&[Node, Integer, Float, String]], String),
        Function::Bool => (&[&[Node, Integer, Boolean]], Boolean),
        Function::Exists => (&[&[Node]], Boolean),
        Function::NumElements | Function::NumDims | Function::ByteSize => (&[&[Node]], Integer),
        Function::Dim => (&[&[Node], &[Integer]], Integer),
        Function::Length => (&[&[Node, String]], Integer),
        Function::Goto => (&[&[Node]], Void),
    };
    if params.len() != args.len() {
        return Err(QuarryError::expression(format!(
            "{function:?} expects {} argument(s), got {}",
            params.len(),
            args.len()
        )));
    }
    for (allowed, &actual) in params.iter().zip(args) {
        expect(actual, allowed, &format!("{function:?}"))?;
    }
    Ok(result)
}

// ============================================================================
// Parser
// ============================================================================

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub(crate) fn parse(source: &str) -> QuarryResult<Expr> {
        let mut parser = Self {
            tokens: tokenize(source)?,
            pos: 0,
        };
        if parser.tokens.is_empty() {
            return Err(QuarryError::expression("empty expression"));
        }
        let expr = parser.or()?;
        if let Some(token) = parser.peek() {
            return Err(QuarryError::expression(format!(
                "unexpected {token:?} after end of expression"
            )));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn require(&mut self, expected: Token) -> QuarryResult<()> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(QuarryError::expression(format!(
                "expected {expected:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> QuarryResult<Expr> {
        let mut left = self.and()?;
        while self.eat_keyword("or") {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> QuarryResult<Expr> {
        let mut left = self.not()?;
        while self.eat_keyword("and") {
            let right = self.not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn not(&mut self) -> QuarryResult<Expr> {
        if self.eat_keyword("not") {
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> QuarryResult<Expr> {
        let left = self.sum()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::Ne) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.sum()?;
        Ok(binary(op, left, right))
    }

    fn sum(&mut self) -> QuarryResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> QuarryResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> QuarryResult<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> QuarryResult<Expr> {
        match self.peek().cloned() {
            Some(Token::Integer(v)) => {
                self.pos += 1;
                Ok(Expr::Integer(v))
            }
            Some(Token::Float(v)) => {
                self.pos += 1;
                Ok(Expr::Float(v))
            }
            Some(Token::Str(s)) => {
                self.pos += 1;
                Ok(Expr::Str(s))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or()?;
                self.require(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) if name == "true" || name == "false" => {
                self.pos += 1;
                Ok(Expr::Boolean(name == "true"))
            }
            Some(Token::Ident(name)) if self.peek_at(1) == Some(&Token::LParen) => {
                let function = Function::lookup(&name).ok_or_else(|| {
                    QuarryError::expression(format!("undefined function '{name}'"))
                })?;
                self.pos += 2;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.or()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.require(Token::Comma)?;
                    }
                }
                Ok(Expr::Call { function, args })
            }
            Some(Token::Slash) | Some(Token::Dot) | Some(Token::DotDot) | Some(Token::At)
            | Some(Token::Ident(_)) => self.node(),
            other => Err(QuarryError::expression(format!(
                "unexpected {other:?} in expression"
            ))),
        }
    }

    fn starts_step(&self, offset: usize) -> bool {
        matches!(
            self.peek_at(offset),
            Some(Token::Dot) | Some(Token::DotDot) | Some(Token::At) | Some(Token::Ident(_))
        )
    }

    fn node(&mut self) -> QuarryResult<Expr> {
        let absolute = self.eat(&Token::Slash);
        let mut steps = Vec::new();
        if absolute && !self.starts_step(0) {
            return Ok(Expr::Node { absolute, steps });
        }
        loop {
            self.step(&mut steps)?;
            if self.peek() == Some(&Token::Slash) && self.starts_step(1) {
                self.pos += 1;
            } else if self.peek() == Some(&Token::At) {
                // `name@` reads as the attributes of `name`
                continue;
            } else {
                break;
            }
        }
        Ok(Expr::Node { absolute, steps })
    }

    fn step(&mut self, steps: &mut Vec<Step>) -> QuarryResult<()> {
        match self.advance() {
            Some(Token::Dot) => steps.push(Step::Current),
            Some(Token::DotDot) => steps.push(Step::Parent),
            Some(Token::At) => steps.push(Step::Attributes),
            Some(Token::Ident(name)) => steps.push(Step::Field(name)),
            other => {
                return Err(QuarryError::expression(format!(
                    "expected a path step, found {other:?}"
                )))
            }
        }
        while self.eat(&Token::LBracket) {
            let index = self.or()?;
            self.require(Token::RBracket)?;
            steps.push(Step::Index(Box::new(index)));
        }
        Ok(())
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
