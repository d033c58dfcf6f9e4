pub mod type_check;
pub mod typed_ast;

pub use type_check::type_check;
