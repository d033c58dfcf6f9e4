//! Annotated AST produced by the type checker.
//!
//! Every node carries the type the checker resolved for it. Operator nodes
//! use it to select the operation the evaluator performs, so evaluation
//! never re-derives operand widths on its own.

use ast::{
    ast::{BinaryOp, Literal, UnaryOp},
    error::Location,
    types::Type,
};
use std::{fmt::Display, rc::Rc};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFnDef {
    pub params: Vec<String>,
    pub body: TypedExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedKind {
    Block(Vec<TypedExpr>),
    Let {
        name: String,
        /// declared type the bound value is converted to
        declared: Option<Type>,
        value: Box<TypedExpr>,
    },
    Variable(String),
    Literal(Literal),
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
    },
    /// shared with every closure created from it
    FnDef(Rc<TypedFnDef>),
    FnApp {
        target: Box<TypedExpr>,
        args: Vec<TypedExpr>,
    },
    Cast {
        target: Box<TypedExpr>,
        to: Type,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedKind,
    pub ty: Type,
    pub location: Option<Location>,
}

impl TypedExpr {
    pub fn new(kind: TypedKind, ty: Type, location: Option<Location>) -> Self {
        Self { kind, ty, location }
    }
}

impl Display for TypedExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypedKind::Block(statements) => write!(f, "(block {} statement(s))", statements.len()),
            TypedKind::Let { name, value, .. } => write!(f, "(let {} {})", name, value),
            TypedKind::Variable(name) => write!(f, "{}", name),
            TypedKind::Literal(literal) => write!(f, "{}", literal),
            TypedKind::Binary { op, left, right } => write!(f, "({} {} {})", op, left, right),
            TypedKind::Unary { op, operand } => write!(f, "({} {})", op, operand),
            TypedKind::FnDef(def) => write!(f, "(fn ({}) ..)", def.params.join(" ")),
            TypedKind::FnApp { target, args } => write!(f, "({} +{} arg(s))", target, args.len()),
            TypedKind::Cast { target, to } => write!(f, "(as {} {})", target, to),
        }?;
        write!(f, " : {}", self.ty)
    }
}

/// a program that passed type checking
#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub body: TypedExpr,
}

impl TypedProgram {
    pub fn ty(&self) -> &Type {
        &self.body.ty
    }
}
