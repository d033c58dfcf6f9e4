use crate::{
    error::Location,
    types::{IntWidth, Type},
};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int { width: IntWidth, bits: i32 },
    Str(String),
    Bool(bool),
}

impl Literal {
    /// integer literal wrapped into `width`
    pub fn int(width: IntWidth, raw: i64) -> Self {
        Literal::Int {
            width,
            bits: width.wrap(raw),
        }
    }

    pub fn type_of(&self) -> Type {
        match self {
            Literal::Int { width, .. } => Type::Int(*width),
            Literal::Str(_) => Type::String,
            Literal::Bool(_) => Type::Bool,
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int { width, bits } => write!(f, "{}{}", bits, width),
            Literal::Str(text) => write!(f, "(str \"{}\")", text),
            Literal::Bool(bit) => write!(f, "{}", bit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    And,
    Or,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub location: Option<Location>,
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            location: None,
        }
    }
}

/// let x = value; or let x: typ = value;
#[derive(Debug, Clone, PartialEq)]
pub struct Let {
    pub name: String,
    pub typ: Option<Type>,
    pub value: Box<Expr>,
    pub location: Option<Location>,
}

impl Let {
    pub fn new(name: &str, typ: Option<Type>, value: Expr) -> Self {
        Self {
            name: name.to_string(),
            typ,
            value: Box::new(value),
            location: None,
        }
    }
}

impl Display for Let {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.typ {
            Some(typ) => write!(f, "(let {} : {} {})", self.name, typ, self.value),
            None => write!(f, "(let {} {})", self.name, self.value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub location: Option<Location>,
}

impl Binary {
    pub fn new(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Box<Expr>,
    pub location: Option<Location>,
}

impl Unary {
    pub fn new(op: UnaryOp, operand: Expr) -> Self {
        Self {
            op,
            operand: Box::new(operand),
            location: None,
        }
    }
}

/// (fn (x y) body)
#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub params: Vec<String>,
    pub body: Box<Expr>,
    pub location: Option<Location>,
}

impl FnDef {
    pub fn new(params: Vec<String>, body: Expr) -> Self {
        Self {
            params,
            body: Box::new(body),
            location: None,
        }
    }
}

impl Display for FnDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(fn ({}) {})", self.params.join(" "), self.body)
    }
}

/// (f a b)
#[derive(Debug, Clone, PartialEq)]
pub struct FnApp {
    pub target: Box<Expr>,
    pub args: Vec<Expr>,
    pub location: Option<Location>,
}

impl FnApp {
    pub fn new(target: Expr, args: Vec<Expr>) -> Self {
        Self {
            target: Box::new(target),
            args,
            location: None,
        }
    }
}

impl Display for FnApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}", self.target)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

/// (as target to)
#[derive(Debug, Clone, PartialEq)]
pub struct Cast {
    pub target: Box<Expr>,
    pub to: Type,
    pub location: Option<Location>,
}

impl Cast {
    pub fn new(target: Expr, to: Type) -> Self {
        Self {
            target: Box::new(target),
            to,
            location: None,
        }
    }
}

/// Every node kind except `Block` and `Literal` carries an optional source
/// location. A literal never fails and the only block error is an empty
/// block, which is reported without a location.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Block(Vec<Expr>),
    Let(Let),
    Variable(Variable),
    Literal(Literal),
    Binary(Binary),
    Unary(Unary),
    FnDef(FnDef),
    FnApp(FnApp),
    Cast(Cast),
}

impl Expr {
    /// attaches a source location; a no-op on blocks and literals
    pub fn at(mut self, location: Location) -> Self {
        let slot = match &mut self {
            Expr::Block(_) | Expr::Literal(_) => None,
            Expr::Let(r#let) => Some(&mut r#let.location),
            Expr::Variable(var) => Some(&mut var.location),
            Expr::Binary(binary) => Some(&mut binary.location),
            Expr::Unary(unary) => Some(&mut unary.location),
            Expr::FnDef(def) => Some(&mut def.location),
            Expr::FnApp(app) => Some(&mut app.location),
            Expr::Cast(cast) => Some(&mut cast.location),
        };
        if let Some(slot) = slot {
            *slot = Some(location);
        }
        self
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Block(statements) => {
                write!(f, "(block")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Expr::Let(r#let) => write!(f, "{}", r#let),
            Expr::Variable(var) => write!(f, "{}", var.name),
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Binary(binary) => {
                write!(f, "({} {} {})", binary.op, binary.left, binary.right)
            }
            Expr::Unary(unary) => write!(f, "({} {})", unary.op, unary.operand),
            Expr::FnDef(def) => write!(f, "{}", def),
            Expr::FnApp(app) => write!(f, "{}", app),
            Expr::Cast(cast) => write!(f, "(as {} {})", cast.target, cast.to),
        }
    }
}

/// top-level statements, evaluated as one block
#[derive(Debug, Clone, PartialEq)]
pub struct Program(pub Vec<Expr>);
