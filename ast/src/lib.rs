pub mod ast;
pub mod env;
pub mod error;
pub mod into_ast;
pub mod types;
