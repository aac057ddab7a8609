//! Expression evaluation against a cursor.

use std::cmp::Ordering;
use std::fmt;

use common_error::{QuarryError, QuarryResult};
use quarry_core::{Cursor, TypeClass};

use super::parser::{BinaryOp, Expr, ExprType, Function, Parser, Step};

/// A parsed and type-checked expression.
///
/// # Example
///
/// ```rust,ignore
/// let expr = Expression::parse("numelements(/measurements) > 2")?;
/// assert_eq!(expr.result_type(), ExprType::Boolean);
/// let answer = expr.eval_bool(Some(&cursor))?;
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    tree: Expr,
    result_type: ExprType,
}

impl Expression {
    pub fn parse(source: &str) -> QuarryResult<Self> {
        let tree = Parser::parse(source)?;
        let result_type = tree.type_check()?;
        Ok(Self {
            source: source.to_string(),
            tree,
            result_type,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn result_type(&self) -> ExprType {
        self.result_type
    }

    /// True when the expression can be evaluated without a cursor.
    pub fn is_constant(&self) -> bool {
        self.tree.is_constant()
    }

    pub fn eval_bool(&self, cursor: Option<&Cursor>) -> QuarryResult<bool> {
        self.require(ExprType::Boolean)?;
        match (Evaluator { context: cursor }).eval(&self.tree)? {
            Value::Bool(v) => Ok(v),
            other => Err(other.unexpected(ExprType::Boolean)),
        }
    }

    pub fn eval_integer(&self, cursor: Option<&Cursor>) -> QuarryResult<i64> {
        self.require(ExprType::Integer)?;
        match (Evaluator { context: cursor }).eval(&self.tree)? {
            Value::Int(v) => Ok(v),
            other => Err(other.unexpected(ExprType::Integer)),
        }
    }

    pub fn eval_float(&self, cursor: Option<&Cursor>) -> QuarryResult<f64> {
        self.require(ExprType::Float)?;
        match (Evaluator { context: cursor }).eval(&self.tree)? {
            Value::Float(v) => Ok(v),
            other => Err(other.unexpected(ExprType::Float)),
        }
    }

    pub fn eval_string(&self, cursor: Option<&Cursor>) -> QuarryResult<String> {
        self.require(ExprType::String)?;
        match (Evaluator { context: cursor }).eval(&self.tree)? {
            Value::Str(v) => Ok(v),
            other => Err(other.unexpected(ExprType::String)),
        }
    }

    /// Evaluate a node expression, returning a cursor at the node.
    pub fn eval_node(&self, cursor: &Cursor) -> QuarryResult<Cursor> {
        self.require(ExprType::Node)?;
        match (Evaluator {
            context: Some(cursor),
        })
        .eval(&self.tree)?
        {
            Value::Node(node) => Ok(node),
            other => Err(other.unexpected(ExprType::Node)),
        }
    }

    /// Execute a void expression, which may move the cursor.
    pub fn eval_void(&self, cursor: &mut Cursor) -> QuarryResult<()> {
        self.require(ExprType::Void)?;
        let target = match &self.tree {
            Expr::Call {
                function: Function::Goto,
                args,
            } => match args.first() {
                Some(path) => (Evaluator {
                    context: Some(&*cursor),
                })
                .node(path, false)?,
                None => None,
            },
            _ => None,
        };
        match target {
            Some(target) => {
                *cursor = target;
                Ok(())
            }
            None => Err(QuarryError::expression("goto target does not exist")),
        }
    }

    fn require(&self, expected: ExprType) -> QuarryResult<()> {
        if self.result_type == expected {
            Ok(())
        } else {
            Err(QuarryError::expression(format!(
                "expression '{}' is of type {}, not {}",
                self.source, self.result_type, expected
            )))
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ============================================================================
// Evaluator
// ============================================================================

#[derive(Debug)]
enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Node(Cursor),
    Void,
}

impl Value {
    fn unexpected(&self, expected: ExprType) -> QuarryError {
        QuarryError::internal(format!("expression produced {self:?} where {expected} was expected"))
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

struct Evaluator<'a> {
    context: Option<&'a Cursor>,
}

impl Evaluator<'_> {
    fn cursor(&self) -> QuarryResult<&Cursor> {
        self.context
            .ok_or_else(|| QuarryError::expression("expression needs a cursor to evaluate"))
    }

    fn eval(&self, expr: &Expr) -> QuarryResult<Value> {
        match expr {
            Expr::Boolean(v) => Ok(Value::Bool(*v)),
            Expr::Integer(v) => Ok(Value::Int(*v)),
            Expr::Float(v) => Ok(Value::Float(*v)),
            Expr::Str(v) => Ok(Value::Str(v.clone())),
            Expr::Node { .. } => match self.node(expr, false)? {
                Some(node) => Ok(Value::Node(node)),
                None => Err(QuarryError::expression("node does not exist")),
            },
            Expr::Neg(inner) => match self.eval(inner)? {
                Value::Int(v) => v
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| QuarryError::expression("integer overflow in negation")),
                Value::Float(v) => Ok(Value::Float(-v)),
                other => Err(other.unexpected(ExprType::Float)),
            },
            Expr::Not(inner) => match self.eval(inner)? {
                Value::Bool(v) => Ok(Value::Bool(!v)),
                other => Err(other.unexpected(ExprType::Boolean)),
            },
            Expr::Binary { op, left, right } => self.binary(*op, left, right),
            Expr::Call { function, args } => self.call(*function, args),
        }
    }

    fn eval_int(&self, expr: &Expr) -> QuarryResult<i64> {
        match self.eval(expr)? {
            Value::Int(v) => Ok(v),
            other => Err(other.unexpected(ExprType::Integer)),
        }
    }

    /// Walk a path expression. With `probe` set, a missing node yields
    /// `None` instead of an error.
    fn node(&self, expr: &Expr, probe: bool) -> QuarryResult<Option<Cursor>> {
        let (absolute, steps) = match expr {
            Expr::Node { absolute, steps } => (*absolute, steps),
            _ => return Err(QuarryError::expression("expected a node expression")),
        };
        let mut cursor = self.cursor()?.clone();
        if absolute {
            cursor.goto_root()?;
        }
        for step in steps {
            let moved = match step {
                Step::Current => Ok(()),
                Step::Parent => cursor.goto_parent(),
                Step::Attributes => cursor.goto_attributes(),
                Step::Field(name) => {
                    if cursor.type_class() != TypeClass::Record {
                        Err(QuarryError::expression(format!(
                            "cannot select field '{name}' of a {} node",
                            cursor.type_class()
                        )))
                    } else {
                        match cursor.record_field_index(name) {
                            Ok(index) if probe && !cursor.record_field_available(index)? => {
                                return Ok(None)
                            }
                            Ok(index) => cursor.goto_record_field_by_index(index),
                            Err(err) => Err(err),
                        }
                    }
                }
                Step::Index(index) => {
                    let index = self.eval_int(index)?;
                    cursor.goto_array_element_by_index(index)
                }
            };
            match moved {
                Ok(()) => {}
                Err(_) if probe => return Ok(None),
                Err(err) => return Err(err),
            }
        }
        Ok(Some(cursor))
    }

    fn node_arg(&self, expr: &Expr) -> QuarryResult<Cursor> {
        self.node(expr, false)?
            .ok_or_else(|| QuarryError::expression("node does not exist"))
    }

    fn binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> QuarryResult<Value> {
        // short circuit
        match op {
            BinaryOp::And => {
                return Ok(Value::Bool(self.bool(left)? && self.bool(right)?));
            }
            BinaryOp::Or => {
                return Ok(Value::Bool(self.bool(left)? || self.bool(right)?));
            }
            _ => {}
        }
        let l = self.eval(left)?;
        let r = self.eval(right)?;
        match (op, l, r) {
            (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (op, Value::Int(a), Value::Int(b)) => integer_op(op, a, b),
            (op, Value::Str(a), Value::Str(b)) => Ok(Value::Bool(compare(op, a.cmp(&b))?)),
            (op, Value::Bool(a), Value::Bool(b)) => match op {
                BinaryOp::Eq => Ok(Value::Bool(a == b)),
                BinaryOp::Ne => Ok(Value::Bool(a != b)),
                _ => Err(QuarryError::expression(format!(
                    "invalid operator {op:?} for booleans"
                ))),
            },
            (op, l, r) => match (l.as_f64(), r.as_f64()) {
                (Some(a), Some(b)) => float_op(op, a, b),
                _ => Err(QuarryError::expression(format!(
                    "invalid operands for {op:?}"
                ))),
            },
        }
    }

    fn bool(&self, expr: &Expr) -> QuarryResult<bool> {
        match self.eval(expr)? {
            Value::Bool(v) => Ok(v),
            other => Err(other.unexpected(ExprType::Boolean)),
        }
    }

    fn call(&self, function: Function, args: &[Expr]) -> QuarryResult<Value> {
        let arg = args
            .first()
            .ok_or_else(|| QuarryError::expression(format!("{function:?} needs an argument")))?;
        match function {
            Function::Exists => Ok(Value::Bool(self.node(arg, true)?.is_some())),
            Function::NumElements => {
                let node = self.node_arg(arg)?;
                Ok(Value::Int(node.num_elements()? as i64))
            }
            Function::NumDims => {
                let node = self.node_arg(arg)?;
                let rank = match node.type_class() {
                    TypeClass::Array => node.array_dims()?.len(),
                    _ => 0,
                };
                Ok(Value::Int(rank as i64))
            }
            Function::Dim => {
                let node = self.node_arg(arg)?;
                let which = match args.get(1) {
                    Some(expr) => self.eval_int(expr)?,
                    None => return Err(QuarryError::expression("dim needs a dimension index")),
                };
                let dims = node.array_dims()?;
                usize::try_from(which)
                    .ok()
                    .and_then(|i| dims.get(i))
                    .map(|&extent| Value::Int(extent as i64))
                    .ok_or_else(|| {
                        QuarryError::expression(format!(
                            "dimension index ({which}) exceeds rank ({})",
                            dims.len()
                        ))
                    })
            }
            Function::ByteSize => {
                let node = self.node_arg(arg)?;
                Ok(Value::Int(node.byte_size()? as i64))
            }
            Function::Length => match self.eval(arg)? {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::Node(node) => Ok(Value::Int(node.string_length()? as i64)),
                other => Err(other.unexpected(ExprType::String)),
            },
            Function::Int => match self.eval(arg)? {
                Value::Int(v) => Ok(Value::Int(v)),
                Value::Float(v) => float_to_int(v),
                Value::Bool(v) => Ok(Value::Int(v as i64)),
                Value::Str(s) => parse_int(&s),
                Value::Node(node) => match node.read_type() {
                    Some(read_type) if read_type.is_integer() => Ok(Value::Int(node.read_i64()?)),
                    _ if node.type_class() == TypeClass::Text => parse_int(&node.read_string()?),
                    _ => float_to_int(node.read_f64()?),
                },
                Value::Void => Err(Value::Void.unexpected(ExprType::Integer)),
            },
            Function::Float => match self.eval(arg)? {
                Value::Int(v) => Ok(Value::Float(v as f64)),
                Value::Float(v) => Ok(Value::Float(v)),
                Value::Str(s) => parse_float(&s),
                Value::Node(node) if node.type_class() == TypeClass::Text => {
                    parse_float(&node.read_string()?)
                }
                Value::Node(node) => Ok(Value::Float(node.read_f64()?)),
                other => Err(other.unexpected(ExprType::Float)),
            },
            Function::Str => match self.eval(arg)? {
                Value::Int(v) => Ok(Value::Str(v.to_string())),
                Value::Float(v) => Ok(Value::Str(v.to_string())),
                Value::Str(s) => Ok(Value::Str(s)),
                Value::Node(node) => Ok(Value::Str(node.read_string()?)),
                other => Err(other.unexpected(ExprType::String)),
            },
            Function::Bool => match self.eval(arg)? {
                Value::Bool(v) => Ok(Value::Bool(v)),
                Value::Int(v) => Ok(Value::Bool(v != 0)),
                Value::Node(node) => Ok(Value::Bool(node.read_i64()? != 0)),
                other => Err(other.unexpected(ExprType::Boolean)),
            },
            Function::Goto => Err(QuarryError::expression(
                "goto can only be executed as a void expression",
            )),
        }
    }
}

fn compare(op: BinaryOp, ordering: Ordering) -> QuarryResult<bool> {
    Ok(match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        BinaryOp::Ge => ordering != Ordering::Less,
        other => {
            return Err(QuarryError::expression(format!(
                "{other:?} is not a comparison"
            )))
        }
    })
}

fn integer_op(op: BinaryOp, a: i64, b: i64) -> QuarryResult<Value> {
    let overflow = || QuarryError::expression(format!("integer overflow in {a} {op:?} {b}"));
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div | BinaryOp::Rem if b == 0 => {
            return Err(QuarryError::expression("division by zero"))
        }
        BinaryOp::Div => a.checked_div(b).ok_or_else(overflow)?,
        BinaryOp::Rem => a.checked_rem(b).ok_or_else(overflow)?,
        op => return Ok(Value::Bool(compare(op, a.cmp(&b))?)),
    };
    Ok(Value::Int(result))
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> QuarryResult<Value> {
    Ok(match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => Value::Float(a / b),
        op => match a.partial_cmp(&b) {
            Some(ordering) => Value::Bool(compare(op, ordering)?),
            // NaN compares unequal to everything
            None => Value::Bool(op == BinaryOp::Ne),
        },
    })
}

fn float_to_int(v: f64) -> QuarryResult<Value> {
    if v.is_finite() && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Ok(Value::Int(v.trunc() as i64))
    } else {
        Err(QuarryError::expression(format!(
            "floating point value {v} cannot be converted to an integer"
        )))
    }
}

fn parse_int(text: &str) -> QuarryResult<Value> {
    text.trim().parse().map(Value::Int).map_err(|_| {
        QuarryError::expression(format!("invalid integer string '{text}'"))
    })
}

fn parse_float(text: &str) -> QuarryResult<Value> {
    text.trim().parse().map(Value::Float).map_err(|_| {
        QuarryError::expression(format!("invalid floating point string '{text}'"))
    })
}
