use crate::typed_ast::{TypedExpr, TypedFnDef, TypedKind, TypedProgram};
use ast::{
    ast::{Binary, BinaryOp, Cast, Expr, FnApp, FnDef, Let, Program, Unary, UnaryOp, Variable},
    env::{Environment, Store},
    error::{Error, Location, Result},
    types::Type,
};
use std::rc::Rc;

pub type TypeStore = Store<Type>;

/// Checking state of one run besides the environment and the store.
#[derive(Debug, Default)]
pub struct TypeEnv {
    /// names whose (non-function) defining expression is being checked
    defining: Vec<String>,
}

impl TypeEnv {
    fn is_defining(&self, name: &str) -> bool {
        self.defining.iter().any(|defining| defining == name)
    }
}

pub trait TypeCheck {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)>;
}

/// binds `name` to `ty` in a fresh location
fn bind(env: &Environment, mut store: TypeStore, name: &str, ty: Type) -> Result<TypeStore> {
    let location = store.allocate();
    let store = store.write(location, ty)?;
    env.bind(name, location);
    Ok(store)
}

fn ensure_assignable(
    from: &Type,
    to: &Type,
    describe: impl FnOnce() -> String,
    location: Option<Location>,
) -> Result<()> {
    if !from.is_assignable_to(to) {
        return Err(Error::type_error(describe(), location));
    }
    Ok(())
}

/// result type of `left op right`, `None` if the operands do not fit
pub fn binary_type(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    match op {
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Type::Bool | Type::Any, Type::Bool | Type::Any) => Some(Type::Bool),
            _ => None,
        },
        BinaryOp::Add => match (left, right) {
            (Type::String, Type::String) => Some(Type::String),
            (Type::Any, Type::Int(_) | Type::String | Type::Any)
            | (Type::Int(_) | Type::String, Type::Any) => Some(Type::Any),
            _ => left.greater_domain(right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow => match (left, right) {
            (Type::Any, Type::Int(_) | Type::Any) | (Type::Int(_), Type::Any) => Some(Type::Any),
            _ => left.greater_domain(right),
        },
    }
}

fn check_block(
    statements: &[Expr],
    t_env: &mut TypeEnv,
    env: &Environment,
    store: TypeStore,
) -> Result<(TypedExpr, TypeStore)> {
    if statements.is_empty() {
        return Err(Error::type_error("empty block has no value", None));
    }
    let mut store = store;
    let mut ty = Type::Void;
    let mut typed = Vec::with_capacity(statements.len());
    for statement in statements {
        let (statement, new_store) = statement.type_check(t_env, env, store)?;
        store = new_store;
        ty = statement.ty.clone();
        typed.push(statement);
    }
    Ok((TypedExpr::new(TypedKind::Block(typed), ty, None), store))
}

impl TypeCheck for Variable {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let Some(location) = env.lookup(&self.name) else {
            let name = self.name.clone();
            let location = self.location;
            return Err(if t_env.is_defining(&self.name) {
                Error::OwnDefinition { name, location }
            } else {
                Error::Undefined { name, location }
            });
        };
        let ty = store.read(location)?.clone();
        let typed = TypedExpr::new(TypedKind::Variable(self.name.clone()), ty, self.location);
        Ok((typed, store))
    }
}

impl TypeCheck for Binary {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let (left, store) = self.left.type_check(t_env, env, store)?;
        let (right, store) = self.right.type_check(t_env, env, store)?;
        let ty = binary_type(self.op, &left.ty, &right.ty).ok_or_else(|| {
            Error::type_error(
                format!("cannot apply {} to {} and {}", self.op, left.ty, right.ty),
                self.location,
            )
        })?;
        let typed = TypedExpr::new(
            TypedKind::Binary {
                op: self.op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            self.location,
        );
        Ok((typed, store))
    }
}

impl TypeCheck for Unary {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let (operand, store) = self.operand.type_check(t_env, env, store)?;
        let ty = match (self.op, &operand.ty) {
            (UnaryOp::Not, Type::Bool | Type::Any) => Type::Bool,
            (op, ty) => {
                return Err(Error::type_error(
                    format!("cannot apply {} to {}", op, ty),
                    self.location,
                ))
            }
        };
        let typed = TypedExpr::new(
            TypedKind::Unary {
                op: self.op,
                operand: Box::new(operand),
            },
            ty,
            self.location,
        );
        Ok((typed, store))
    }
}

impl TypeCheck for FnDef {
    /// parameters stay `any` until the function is applied
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let scope = env.extend();
        let mut store = store;
        for param in &self.params {
            store = bind(&scope, store, param, Type::Any)?;
        }
        let domain = if self.params.is_empty() {
            vec![Type::Void]
        } else {
            vec![Type::Any; self.params.len()]
        };
        let (body, store) = self.body.type_check(t_env, &scope, store)?;
        let ty = Type::function(domain, body.ty.clone());
        let def = TypedFnDef {
            params: self.params.clone(),
            body,
        };
        Ok((
            TypedExpr::new(TypedKind::FnDef(Rc::new(def)), ty, self.location),
            store,
        ))
    }
}

impl TypeCheck for Let {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let (value, store) = match self.value.as_ref() {
            // a function may call itself: its name denotes a placeholder
            // until the function type is known
            Expr::FnDef(def) => {
                let store = bind(env, store, &self.name, Type::Recursive(self.name.clone()))?;
                def.type_check(t_env, env, store)?
            }
            value => {
                t_env.defining.push(self.name.clone());
                let checked = value.type_check(t_env, env, store);
                t_env.defining.pop();
                checked?
            }
        };
        let ty = match &self.typ {
            Some(declared) => {
                ensure_assignable(
                    &value.ty,
                    declared,
                    || format!("cannot bind {} to \"{}\" declared as {}", value.ty, self.name, declared),
                    self.location,
                )?;
                declared.clone()
            }
            None => value.ty.clone(),
        };
        let store = bind(env, store, &self.name, ty.clone())?;
        log::debug!("let {} : {}", self.name, ty);
        let typed = TypedExpr::new(
            TypedKind::Let {
                name: self.name.clone(),
                declared: self.typ.clone(),
                value: Box::new(value),
            },
            ty,
            self.location,
        );
        Ok((typed, store))
    }
}

/// the function type a recursive placeholder stands for, once known
fn resolve(ty: Type, env: &Environment, store: &TypeStore) -> Type {
    let Type::Recursive(name) = &ty else {
        return ty;
    };
    env.lookup(name)
        .and_then(|location| store.read(location).ok())
        .filter(|resolved| matches!(resolved, Type::Function { .. }))
        .cloned()
        .unwrap_or(ty)
}

impl TypeCheck for FnApp {
    /// f :: [a, b] => c
    /// (f x) :: b => c, (f x y) :: c
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let (target, mut store) = self.target.type_check(t_env, env, store)?;
        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            let (arg, new_store) = arg.type_check(t_env, env, store)?;
            store = new_store;
            args.push(arg);
        }

        let ty = match resolve(target.ty.clone(), env, &store) {
            Type::Function { domain, image, .. } if domain == [Type::Void] => {
                if !args.is_empty() {
                    return Err(Error::type_error(
                        format!(
                            "{} expects no arguments but {} were passed",
                            target.ty,
                            args.len()
                        ),
                        self.location,
                    ));
                }
                *image
            }
            Type::Function {
                domain,
                image,
                arity,
            } => {
                if args.len() > domain.len() {
                    return Err(Error::Bind {
                        excess: args.len() - domain.len(),
                        arity,
                        location: self.location,
                    });
                }
                for (i, (arg, param)) in args.iter().zip(domain.iter()).enumerate() {
                    ensure_assignable(
                        &arg.ty,
                        param,
                        || {
                            format!(
                                "argument {} of type {} does not match parameter type {}",
                                i + 1,
                                arg.ty,
                                param
                            )
                        },
                        arg.location.or(self.location),
                    )?;
                }
                if args.len() == domain.len() {
                    *image
                } else {
                    Type::partial(domain[args.len()..].to_vec(), *image, arity)
                }
            }
            // parameters and functions still being defined
            Type::Any | Type::Recursive(_) => Type::Any,
            other => {
                return Err(Error::type_error(
                    format!("{} is not callable", other),
                    self.location,
                ))
            }
        };
        log::debug!("apply {} to {} argument(s) : {}", target.ty, args.len(), ty);
        let typed = TypedExpr::new(
            TypedKind::FnApp {
                target: Box::new(target),
                args,
            },
            ty,
            self.location,
        );
        Ok((typed, store))
    }
}

impl TypeCheck for Cast {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        let (target, store) = self.target.type_check(t_env, env, store)?;
        let castable = target.ty == self.to
            || (target.ty.is_int() && self.to.is_int())
            || target.ty == Type::Any;
        if !castable {
            return Err(Error::type_error(
                format!("cannot cast {} to {}", target.ty, self.to),
                self.location,
            ));
        }
        let typed = TypedExpr::new(
            TypedKind::Cast {
                target: Box::new(target),
                to: self.to.clone(),
            },
            self.to.clone(),
            self.location,
        );
        Ok((typed, store))
    }
}

impl TypeCheck for Expr {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        log::debug!("type_check: {}", self);
        let (typed, store) = match self {
            Expr::Block(statements) => check_block(statements, t_env, env, store),
            Expr::Let(r#let) => r#let.type_check(t_env, env, store),
            Expr::Variable(var) => var.type_check(t_env, env, store),
            Expr::Literal(literal) => Ok((
                TypedExpr::new(TypedKind::Literal(literal.clone()), literal.type_of(), None),
                store,
            )),
            Expr::Binary(binary) => binary.type_check(t_env, env, store),
            Expr::Unary(unary) => unary.type_check(t_env, env, store),
            Expr::FnDef(def) => def.type_check(t_env, env, store),
            Expr::FnApp(app) => app.type_check(t_env, env, store),
            Expr::Cast(cast) => cast.type_check(t_env, env, store),
        }?;
        log::debug!("type_check: {} : {}", self, typed.ty);
        Ok((typed, store))
    }
}

impl TypeCheck for Program {
    fn type_check(
        &self,
        t_env: &mut TypeEnv,
        env: &Environment,
        store: TypeStore,
    ) -> Result<(TypedExpr, TypeStore)> {
        check_block(&self.0, t_env, env, store)
    }
}

/// Checks `program` against a fresh environment and store.
pub fn type_check(program: &Program) -> Result<TypedProgram> {
    let (program, _) = type_check_in(program, &Environment::new(), TypeStore::new())?;
    Ok(program)
}

/// Checks `program` against an existing environment and store, e.g. one
/// pre-populated by a REPL.
pub fn type_check_in(
    program: &Program,
    env: &Environment,
    store: TypeStore,
) -> Result<(TypedProgram, TypeStore)> {
    let mut t_env = TypeEnv::default();
    let (body, store) = program.type_check(&mut t_env, env, store)?;
    Ok((TypedProgram { body }, store))
}
