use crate::value::{Closure, IntValue, Value};
use ast::{
    ast::{BinaryOp, UnaryOp},
    env::{Environment, Store},
    error::{Error, Location, Result},
    types::{IntWidth, Type},
};
use typesystem::typed_ast::{TypedExpr, TypedKind, TypedProgram};

pub type ValueStore = Store<Value>;

pub trait Eval {
    fn eval(&self, env: &Environment, store: ValueStore) -> Result<(Value, ValueStore)>;
}

/// width an integer operator computes in: the checker's annotation, or the
/// wider runtime operand when the annotation is `any`
fn width_of(hint: &Type, a: &IntValue, b: &IntValue) -> IntWidth {
    match hint {
        Type::Int(width) => *width,
        _ => a.width.greater(b.width),
    }
}

fn binary(
    op: BinaryOp,
    hint: &Type,
    left: Value,
    right: Value,
    location: Option<Location>,
) -> Result<Value> {
    let value = match (op, left, right) {
        (BinaryOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
        (BinaryOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Value::Str(a + &b),
        (BinaryOp::Add, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.add(b, width_of(hint, &a, &b)))
        }
        (BinaryOp::Sub, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.subtract(b, width_of(hint, &a, &b)))
        }
        (BinaryOp::Mul, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.multiply(b, width_of(hint, &a, &b)))
        }
        (BinaryOp::Div, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.divide(b, width_of(hint, &a, &b)))
        }
        (BinaryOp::Pow, Value::Int(a), Value::Int(b)) => {
            Value::Int(a.power(b, width_of(hint, &a, &b)))
        }
        (op, left, right) => {
            return Err(Error::type_error(
                format!(
                    "cannot apply {} to {} and {}",
                    op,
                    left.type_of(),
                    right.type_of()
                ),
                location,
            ))
        }
    };
    Ok(value)
}

/// Binds arguments to the closure's parameters in order. Too few arguments
/// produce a closure over the rest, too many a bind error (a type error for
/// zero-parameter closures).
fn apply(
    closure: Closure,
    args: Vec<Value>,
    store: ValueStore,
    location: Option<Location>,
) -> Result<(Value, ValueStore)> {
    let scope = closure.env.extend();
    let mut store = store;
    let mut args = args.into_iter();
    for (i, param) in closure.params.iter().enumerate() {
        let Some(arg) = args.next() else {
            let rest = closure.params[i..].to_vec();
            log::debug!(
                "partial application, {} of {} parameter(s) left",
                rest.len(),
                closure.arity
            );
            let partial = Closure {
                params: rest,
                def: closure.def.clone(),
                env: scope,
                arity: closure.arity,
            };
            return Ok((Value::Closure(partial), store));
        };
        scope.unbind(param);
        let cell = store.allocate();
        store = store.write(cell, arg)?;
        scope.bind(param, cell);
    }
    let excess = args.count();
    if excess > 0 && closure.arity == 0 {
        return Err(Error::type_error(
            format!(
                "{} expects no arguments but {} were passed",
                closure.type_of(),
                excess
            ),
            location,
        ));
    }
    if excess > 0 {
        return Err(Error::Bind {
            excess,
            arity: closure.arity,
            location,
        });
    }
    closure.def.body.eval(&scope, store)
}

fn eval_block(
    statements: &[TypedExpr],
    env: &Environment,
    store: ValueStore,
) -> Result<(Value, ValueStore)> {
    let mut store = store;
    let mut last = None;
    for statement in statements {
        let (value, new_store) = statement.eval(env, store)?;
        store = new_store;
        last = Some(value);
    }
    let value = last.ok_or_else(|| Error::type_error("empty block has no value", None))?;
    Ok((value, store))
}

impl Eval for TypedExpr {
    fn eval(&self, env: &Environment, store: ValueStore) -> Result<(Value, ValueStore)> {
        match &self.kind {
            TypedKind::Block(statements) => eval_block(statements, env, store),
            TypedKind::Literal(literal) => Ok((Value::from(literal), store)),
            TypedKind::Variable(name) => {
                let cell = env.lookup(name).ok_or_else(|| Error::Undefined {
                    name: name.clone(),
                    location: self.location,
                })?;
                let value = store.read(cell)?.clone();
                Ok((value, store))
            }
            TypedKind::Let {
                name,
                declared,
                value,
            } => {
                let (value, mut store) = value.eval(env, store)?;
                let value = match declared {
                    Some(ty) => value.to(ty).map_err(|err| err.or_at(self.location))?,
                    None => value,
                };
                let cell = store.allocate();
                let store = store.write(cell, value.clone())?;
                env.bind(name, cell);
                log::debug!("let {} = {} at {}", name, value, cell);
                Ok((value, store))
            }
            TypedKind::Binary { op, left, right } => {
                let (left, store) = left.eval(env, store)?;
                let (right, store) = right.eval(env, store)?;
                let value = binary(*op, &self.ty, left, right, self.location)?;
                Ok((value, store))
            }
            TypedKind::Unary { op, operand } => {
                let (operand, store) = operand.eval(env, store)?;
                match (op, operand) {
                    (UnaryOp::Not, Value::Bool(bit)) => Ok((Value::Bool(!bit), store)),
                    (op, operand) => Err(Error::type_error(
                        format!("cannot apply {} to {}", op, operand.type_of()),
                        self.location,
                    )),
                }
            }
            TypedKind::FnDef(def) => {
                let closure = Closure::new(def.clone(), env.clone());
                Ok((Value::Closure(closure), store))
            }
            TypedKind::FnApp { target, args } => {
                let (target, mut store) = target.eval(env, store)?;
                let closure = match target {
                    Value::Closure(closure) => closure,
                    other => {
                        return Err(Error::type_error(
                            format!("{} is not callable", other.type_of()),
                            self.location,
                        ))
                    }
                };
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    let (value, new_store) = arg.eval(env, store)?;
                    store = new_store;
                    values.push(value);
                }
                log::debug!(
                    "apply <closure/{}> with {} parameter(s) left to {} argument(s)",
                    closure.arity,
                    closure.params.len(),
                    values.len()
                );
                apply(closure, values, store, self.location)
            }
            TypedKind::Cast { target, to } => {
                let (value, store) = target.eval(env, store)?;
                let value = value.to(to).map_err(|err| err.or_at(self.location))?;
                Ok((value, store))
            }
        }
    }
}

impl Eval for TypedProgram {
    fn eval(&self, env: &Environment, store: ValueStore) -> Result<(Value, ValueStore)> {
        self.body.eval(env, store)
    }
}

#[cfg(test)]
mod tests {
    use super::Eval;
    use crate::{tests::setup, value::Value};
    use anyhow::Result;
    use ast::{
        env::{Environment, Store},
        error::{Error, ErrorKind},
        into_ast::parse,
        types::IntWidth,
    };
    use typesystem::type_check;

    fn eval(src: &str) -> Result<(Value, super::ValueStore, Environment)> {
        setup();
        let program = type_check(&parse(src)?)?;
        let env = Environment::new();
        let (value, store) = program.eval(&env, Store::new())?;
        Ok((value, store, env))
    }

    fn should_eval(src: &str, expected: Value) -> Result<()> {
        let (value, _, _) = eval(src)?;
        assert_eq!(value, expected, "{}", src);
        Ok(())
    }

    fn should_fail(src: &str) -> Result<Error> {
        setup();
        let program = type_check(&parse(src)?)?;
        let err = program
            .eval(&Environment::new(), Store::new())
            .expect_err(src);
        Ok(err)
    }

    fn int(raw: i64) -> Value {
        Value::int(IntWidth::I32, raw)
    }

    #[test]
    fn curried_application() -> Result<()> {
        should_eval("(let f (fn (x y) (+ x y))) ((f 1) 2)", int(3))?;
        should_eval("(let f (fn (x y) (+ x y))) (f 1 2)", int(3))?;
        should_eval("(let f (fn (x y z) (* (- x y) z))) (((f 7) 2) 3)", int(15))?;
        should_eval(
            "(let g (fn (x) (fn (y) (+ x y)))) ((g 1) ((g 2) 3))",
            int(6),
        )
    }

    #[test]
    fn curry_equivalence() -> Result<()> {
        let (curried, curried_store, _) = eval("(let f (fn (x y) (+ x y))) ((f 1) 2)")?;
        let (direct, direct_store, _) = eval("(let f (fn (x y) (+ x y))) (f 1 2)")?;
        assert_eq!(curried, direct);
        let bound = |store: &super::ValueStore| {
            store
                .iter()
                .filter(|(_, value)| !matches!(value, Value::Closure(_)))
                .map(|(_, value)| value.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(bound(&curried_store), bound(&direct_store));
        assert_eq!(bound(&direct_store), vec![int(1), int(2)]);
        Ok(())
    }

    #[test]
    fn partial_application_keeps_arity() -> Result<()> {
        let (value, _, _) = eval("(let f (fn (x y z) x)) ((f 1) 2)")?;
        let closure = match value {
            Value::Closure(closure) => closure,
            other => panic!("expected a closure, got {}", other),
        };
        assert_eq!(closure.arity, 3);
        assert_eq!(closure.params, vec!["z".to_string()]);
        Ok(())
    }

    #[test]
    fn zero_parameter_function() -> Result<()> {
        should_eval("(let k (fn () (str hi))) (k)", Value::Str("hi".to_string()))
    }

    #[test]
    fn excess_arguments() -> Result<()> {
        // the checker only sees `any` for the parameter, the closure is known at runtime
        let err = should_fail("(let apply (fn (f) (f 1 2))) (apply (fn (x) x))")?;
        assert_eq!(err.kind(), ErrorKind::Bind);
        assert_eq!(
            err.to_string(),
            "Bind error: 1 argument(s) in excess of original arity 1"
        );
        // a partially applied closure reports its original arity
        let err = should_fail("(let call (fn (g) (g 1 2))) (let f (fn (a b) a)) (call (f 0))")?;
        assert!(matches!(err, Error::Bind { excess: 1, arity: 2, .. }));
        Ok(())
    }

    #[test]
    fn shadowing() -> Result<()> {
        let (value, store, env) = eval("(let a 1) (let a 2) a")?;
        assert_eq!(value, int(2));
        let cells = env.lookup_all("a");
        assert_eq!(cells.len(), 2);
        assert_ne!(cells[0], cells[1]);
        assert_eq!(*store.read(cells[0])?, int(2));
        assert_eq!(*store.read(cells[1])?, int(1));
        Ok(())
    }

    #[test]
    fn closures_see_later_bindings_of_their_scope() -> Result<()> {
        should_eval("(let x 1) (let f (fn (y) (+ x y))) (let x 10) (f 5)", int(15))
    }

    #[test]
    fn operator_width_is_fixed_when_the_function_is_checked() -> Result<()> {
        // the body is typed against `x : i8`; the later i32 `x` is read at
        // run time but still added in 8 bits
        should_eval(
            "(let x 1i8) (let f (fn () (+ x x))) (let x 100) (f)",
            Value::int(IntWidth::I8, -56),
        )
    }

    #[test]
    fn parameters_shadow_outer_names() -> Result<()> {
        should_eval("(let x 1) (let f (fn (x) (* x 2))) (+ (f 5) x)", int(11))
    }

    #[test]
    fn booleans() -> Result<()> {
        should_eval("(&& true false)", Value::Bool(false))?;
        should_eval("(|| false true)", Value::Bool(true))?;
        should_eval("(not (and true true))", Value::Bool(false))?;
        should_eval("((fn (a b) (or a b)) false false)", Value::Bool(false))
    }

    #[test]
    fn strings() -> Result<()> {
        should_eval(
            "(let greet (fn (name) (+ (str hello) name))) (greet (str world))",
            Value::Str("helloworld".to_string()),
        )
    }

    #[test]
    fn widening() -> Result<()> {
        should_eval("(+ 100i8 100i8)", Value::int(IntWidth::I8, -56))?;
        should_eval("(+ 100i8 100i16)", Value::int(IntWidth::I16, 200))?;
        // width decided from the runtime operands
        should_eval(
            "((fn (a b) (+ a b)) 100i8 100i16)",
            Value::int(IntWidth::I16, 200),
        )?;
        should_eval("(* 1000i16 1000)", int(1_000_000))
    }

    #[test]
    fn division_and_power() -> Result<()> {
        should_eval("(/ 7 2)", int(3))?;
        should_eval("(/ -7 2)", int(-3))?;
        should_eval("(/ 5 0)", int(0))?;
        should_eval("(^ 2 10)", int(1024))?;
        should_eval("(^ 2 -1)", int(0))?;
        should_eval("(^ -1 -3)", int(-1))?;
        should_eval("(^ 3i8 5i8)", Value::int(IntWidth::I8, -13))
    }

    #[test]
    fn casts() -> Result<()> {
        should_eval("(as 300 i8)", Value::int(IntWidth::I8, 44))?;
        should_eval("(as 200i16 i8)", Value::int(IntWidth::I8, -56))?;
        should_eval("(as (as 300 i8) i32)", int(44))?;
        should_eval("(as -1i8 i16)", Value::int(IntWidth::I16, -1))?;
        let err = should_fail("((fn (x) (as x i8)) true)")?;
        assert_eq!(err.kind(), ErrorKind::Type);
        Ok(())
    }

    #[test]
    fn declared_let_converts() -> Result<()> {
        should_eval("(let x : i32 5i8) x", int(5))?;
        should_eval("(let x : i16 ((fn (v) v) 70000)) x", Value::int(IntWidth::I16, 4464))
    }

    #[test]
    fn runtime_type_errors() -> Result<()> {
        let err = should_fail("((fn (x) (x 1)) 5)")?;
        assert_eq!(err.to_string(), "Type error: i32 is not callable");
        let err = should_fail("((fn (a) (+ a 1)) (str s))")?;
        assert_eq!(err.kind(), ErrorKind::Type);
        let err = should_fail("((fn (b) (not b)) 1)")?;
        assert_eq!(err.kind(), ErrorKind::Type);
        // a zero-parameter closure reached through an `any` parameter
        let err = should_fail("((fn (g) (g 1)) (fn () 2))")?;
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(
            err.to_string(),
            "Type error: void => i32 expects no arguments but 1 were passed"
        );
        Ok(())
    }

    #[test]
    fn recursive_let_resolves_itself() -> Result<()> {
        let (value, _, _) = eval("(let f (fn (n) (fn (m) (f m)))) (((f 1) 2) 3)")?;
        assert_eq!(value.to_string(), "<closure/1>");
        let (value, _, _) = eval("(let twice (fn (n) (fn (k) (twice k)))) ((twice 1) 2)")?;
        assert!(matches!(value, Value::Closure(ref closure) if closure.params == ["k"]));
        Ok(())
    }

    #[test]
    fn runs_do_not_share_stores() -> Result<()> {
        let (_, first, _) = eval("(let a 1) (let b 2)")?;
        let (_, second, _) = eval("(let a 1) (let b 2)")?;
        let cells = |store: &super::ValueStore| store.iter().map(|(cell, _)| *cell).collect::<Vec<_>>();
        assert_eq!(cells(&first), cells(&second));
        Ok(())
    }
}
