use crate::eval::{Eval, ValueStore};
use ast::{
    ast::Program,
    env::{Environment, Store},
    error::Result,
};
use typesystem::{type_check, typed_ast::TypedProgram};
use value::Value;

pub mod eval;
pub mod value;

/// Evaluates a checked program in a fresh environment and store.
pub fn evaluate(program: &TypedProgram) -> Result<(Value, ValueStore)> {
    evaluate_in(program, &Environment::new(), Store::new())
}

pub fn evaluate_in(
    program: &TypedProgram,
    env: &Environment,
    store: ValueStore,
) -> Result<(Value, ValueStore)> {
    program.eval(env, store)
}

/// check, then evaluate
pub fn run(program: &Program) -> Result<(Value, ValueStore)> {
    log::debug!("run: {} statement(s)", program.0.len());
    let program = type_check(program)?;
    log::debug!("checked {}", program.body);
    let (value, store) = evaluate(&program)?;
    log::debug!("store:\n{}", store);
    Ok((value, store))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::run;
    use crate::value::Value;
    use anyhow::{anyhow, Result};
    use ast::{error::ErrorKind, into_ast::parse, types::IntWidth};
    use std::{fs, sync::Once};

    static INIT: Once = Once::new();

    pub fn setup() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_test_writer()
                .without_time()
                .with_max_level(tracing::Level::DEBUG)
                .with_line_number(true)
                .init();
        });
    }

    #[test]
    fn run_checks_before_evaluating() -> Result<()> {
        setup();
        let err = run(&parse("(let f (fn (x) x)) (+ (str a) 1)")?).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        let (value, store) = run(&parse("(let f (fn (x y) (+ x y))) ((f 1) 2)")?)?;
        assert_eq!(value, Value::int(IntWidth::I32, 3));
        assert_eq!(store.len(), 3);
        Ok(())
    }

    /// every demo states its expected output on its first line: `; => 3`
    #[test]
    fn demos() -> Result<()> {
        setup();
        let demos = project_root::get_project_root()?.join("demos");
        let mut ran = 0;
        for entry in fs::read_dir(&demos)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("chi") {
                continue;
            }
            let source = fs::read_to_string(&path)?;
            let expected = source
                .lines()
                .next()
                .and_then(|line| line.strip_prefix("; => "))
                .ok_or_else(|| anyhow!("{} has no expected output", path.display()))?;
            let (value, _) = run(&parse(&source)?)?;
            assert_eq!(value.to_string(), expected.trim(), "{}", path.display());
            ran += 1;
        }
        assert!(ran > 0, "no demos in {}", demos.display());
        Ok(())
    }
}
