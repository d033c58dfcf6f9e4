use crate::{
    ast::{Binary, BinaryOp, Cast, Expr, FnApp, FnDef, Let, Literal, Program, Unary, UnaryOp, Variable},
    types::{IntWidth, Type},
};
use anyhow::{anyhow, Result};
use symbolic_expressions::{parser::parse_str, Sexp};

const WIDTH_SUFFIXES: [(&str, IntWidth); 3] = [
    ("i8", IntWidth::I8),
    ("i16", IntWidth::I16),
    ("i32", IntWidth::I32),
];

fn parse_type(sexp: &Sexp) -> Result<Type> {
    match sexp.string()?.as_str() {
        "i8" => Ok(Type::Int(IntWidth::I8)),
        "i16" => Ok(Type::Int(IntWidth::I16)),
        "i32" => Ok(Type::Int(IntWidth::I32)),
        "string" => Ok(Type::String),
        "bool" => Ok(Type::Bool),
        other => Err(anyhow!("unknown type {}", other)),
    }
}

/// `42`, `-3`, `7i8`; literals without suffix are 32-bit
fn parse_int(lit: &str) -> Option<Result<Literal>> {
    let (digits, width) = WIDTH_SUFFIXES
        .iter()
        .find_map(|(suffix, width)| lit.strip_suffix(suffix).map(|digits| (digits, *width)))
        .unwrap_or((lit, IntWidth::I32));
    let unsigned = digits.strip_prefix('-').unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(
        digits
            .parse::<i64>()
            .map(|raw| Literal::int(width, raw))
            .map_err(|e| anyhow!("invalid integer literal {}: {}", lit, e)),
    )
}

fn parse_params(sexp: &Sexp) -> Result<Vec<String>> {
    match sexp {
        Sexp::List(list) => list
            .iter()
            .map(|param| param.string().map(|name| name.to_string()).map_err(Into::into))
            .collect(),
        Sexp::String(name) => Ok(vec![name.to_string()]),
        _ => Ok(vec![]),
    }
}

/// (let a 1) or (let a : i8 1)
fn parse_let(list: &[Sexp]) -> Result<Expr> {
    match list.len() {
        3 => Ok(Expr::Let(Let::new(
            list[1].string()?,
            None,
            into_ast(&list[2])?,
        ))),
        5 if list[2].string().ok().map(|s| s.as_str()) == Some(":") => Ok(Expr::Let(Let::new(
            list[1].string()?,
            Some(parse_type(&list[3])?),
            into_ast(&list[4])?,
        ))),
        _ => Err(anyhow!("let must have 2 or 3 operands. but {}", Sexp::List(list.to_vec()))),
    }
}

/// (fn (x y) body)
fn parse_fn(list: &[Sexp]) -> Result<Expr> {
    if list.len() != 3 {
        return Err(anyhow!("fn must have parameters and a body"));
    }
    let params = parse_params(&list[1])?;
    let body = into_ast(&list[2])?;
    Ok(Expr::FnDef(FnDef::new(params, body)))
}

/// (str "text")
fn parse_str_literal(list: &[Sexp]) -> Result<Expr> {
    let text = list[1..]
        .iter()
        .map(|part| part.string().map(|s| s.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()?
        .join(" ");
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(&text)
        .to_string();
    Ok(Expr::Literal(Literal::Str(text)))
}

fn binary_op(name: &str) -> Option<BinaryOp> {
    match name {
        "+" => Some(BinaryOp::Add),
        "-" => Some(BinaryOp::Sub),
        "*" => Some(BinaryOp::Mul),
        "/" => Some(BinaryOp::Div),
        "^" => Some(BinaryOp::Pow),
        "and" | "&&" => Some(BinaryOp::And),
        "or" | "||" => Some(BinaryOp::Or),
        _ => None,
    }
}

fn parse_list(list: &[Sexp]) -> Result<Expr> {
    let Some(head) = list.first() else {
        return Err(anyhow!("empty list is not an expression"));
    };
    let keyword = head.string().ok().map(|s| s.as_str());
    match keyword {
        Some("let") => parse_let(list),
        Some("fn") => parse_fn(list),
        Some("str") => parse_str_literal(list),
        Some("block") => Ok(Expr::Block(
            list[1..].iter().map(into_ast).collect::<Result<Vec<_>>>()?,
        )),
        Some("as") if list.len() == 3 => Ok(Expr::Cast(Cast::new(
            into_ast(&list[1])?,
            parse_type(&list[2])?,
        ))),
        Some("not" | "!") if list.len() == 2 => {
            Ok(Expr::Unary(Unary::new(UnaryOp::Not, into_ast(&list[1])?)))
        }
        Some(op) if binary_op(op).is_some() && list.len() == 3 => {
            let op = binary_op(op).ok_or_else(|| anyhow!("unknown operator {}", op))?;
            Ok(Expr::Binary(Binary::new(
                op,
                into_ast(&list[1])?,
                into_ast(&list[2])?,
            )))
        }
        // (f a b) applies f to a and b
        _ => {
            let target = into_ast(head)?;
            let args = list[1..].iter().map(into_ast).collect::<Result<Vec<_>>>()?;
            Ok(Expr::FnApp(FnApp::new(target, args)))
        }
    }
}

pub fn into_ast(sexp: &Sexp) -> Result<Expr> {
    match sexp {
        Sexp::List(list) => parse_list(list),
        Sexp::String(lit) => match lit.as_str() {
            "true" => Ok(Expr::Literal(Literal::Bool(true))),
            "false" => Ok(Expr::Literal(Literal::Bool(false))),
            _ => match parse_int(lit) {
                Some(literal) => Ok(Expr::Literal(literal?)),
                None => Ok(Expr::Variable(Variable::new(lit))),
            },
        },
        _ => Err(anyhow!("invalid sexp: {}", sexp)),
    }
}

/// Parses a whole program. Lines starting with `;` are comments.
pub fn parse(program: &str) -> Result<Program> {
    let program = program
        .split('\n')
        .filter(|line| !line.trim_start().starts_with(';'))
        .collect::<Vec<_>>()
        .join(" ");
    let statements = match parse_str(&format!("({})", program))? {
        Sexp::List(list) => list.iter().map(into_ast).collect::<Result<Vec<_>>>()?,
        Sexp::Empty => vec![],
        sexp => return Err(anyhow!("invalid program: {}", sexp)),
    };
    log::debug!("parsed {} statement(s)", statements.len());
    Ok(Program(statements))
}
