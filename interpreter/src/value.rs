use ast::{
    ast::Literal,
    env::Environment,
    error::{Error, Result},
    types::{IntWidth, Type},
};
use std::{fmt::Display, rc::Rc};
use typesystem::typed_ast::TypedFnDef;

/// Fixed-width integer; `raw` always lies in the range of `width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntValue {
    pub width: IntWidth,
    pub raw: i32,
}

impl IntValue {
    pub fn new(width: IntWidth, raw: i64) -> Self {
        Self {
            width,
            raw: width.wrap(raw),
        }
    }

    /// truncating width conversion
    pub fn to(self, width: IntWidth) -> Self {
        Self::new(width, self.raw as i64)
    }

    fn compute(self, other: IntValue, width: IntWidth, op: impl Fn(i64, i64) -> i64) -> Self {
        let (a, b) = (self.to(width).raw as i64, other.to(width).raw as i64);
        Self::new(width, op(a, b))
    }

    pub fn add(self, other: IntValue, width: IntWidth) -> Self {
        self.compute(other, width, |a, b| a + b)
    }

    pub fn subtract(self, other: IntValue, width: IntWidth) -> Self {
        self.compute(other, width, |a, b| a - b)
    }

    pub fn multiply(self, other: IntValue, width: IntWidth) -> Self {
        self.compute(other, width, |a, b| a * b)
    }

    /// truncates toward zero, `x / 0 == 0`
    pub fn divide(self, other: IntValue, width: IntWidth) -> Self {
        self.compute(other, width, |a, b| if b == 0 { 0 } else { a / b })
    }

    pub fn power(self, other: IntValue, width: IntWidth) -> Self {
        self.compute(other, width, |base, exp| {
            if exp >= 0 {
                return base.wrapping_pow(exp as u32);
            }
            // truncated real result of base^-n
            match base {
                1 => 1,
                -1 if exp % 2 == 0 => 1,
                -1 => -1,
                _ => 0,
            }
        })
    }
}

impl Display for IntValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A function value. Partial application yields a new closure over the
/// remaining parameters; `arity` keeps the parameter count of the function
/// expression it came from.
#[derive(Debug, Clone)]
pub struct Closure {
    pub params: Vec<String>,
    pub def: Rc<TypedFnDef>,
    pub env: Environment,
    pub arity: usize,
}

impl Closure {
    pub fn new(def: Rc<TypedFnDef>, env: Environment) -> Self {
        Self {
            params: def.params.clone(),
            arity: def.params.len(),
            def,
            env,
        }
    }

    pub fn type_of(&self) -> Type {
        let domain = if self.params.is_empty() {
            vec![Type::Void]
        } else {
            vec![Type::Any; self.params.len()]
        };
        Type::partial(domain, self.def.body.ty.clone(), self.arity)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(IntValue),
    Str(String),
    Bool(bool),
    Closure(Closure),
}

/// closures never compare equal
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn int(width: IntWidth, raw: i64) -> Self {
        Value::Int(IntValue::new(width, raw))
    }

    pub fn type_of(&self) -> Type {
        match self {
            Value::Int(int) => Type::Int(int.width),
            Value::Str(_) => Type::String,
            Value::Bool(_) => Type::Bool,
            Value::Closure(closure) => closure.type_of(),
        }
    }

    /// converts to `ty`: integers are truncated into the target width,
    /// everything else must already have that type
    pub fn to(self, ty: &Type) -> Result<Value> {
        match (self, ty) {
            (Value::Int(int), Type::Int(width)) => Ok(Value::Int(int.to(*width))),
            (value, Type::Any) => Ok(value),
            (value @ Value::Str(_), Type::String)
            | (value @ Value::Bool(_), Type::Bool)
            | (value @ Value::Closure(_), Type::Function { .. }) => Ok(value),
            (value, ty) => Err(Error::type_error(
                format!("cannot convert {} of type {} to {}", value, value.type_of(), ty),
                None,
            )),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Int { width, bits } => Value::Int(IntValue {
                width: *width,
                raw: *bits,
            }),
            Literal::Str(text) => Value::Str(text.clone()),
            Literal::Bool(bit) => Value::Bool(*bit),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{}", int),
            Value::Str(text) => write!(f, "{}", text),
            Value::Bool(bit) => write!(f, "{}", bit),
            Value::Closure(closure) => write!(f, "<closure/{}>", closure.arity),
        }
    }
}
