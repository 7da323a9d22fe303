pub mod ast;
pub mod codegen;
pub mod driver;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod loader;
pub mod logging;
pub mod lower;
pub mod parser;
pub mod span;
pub mod suggest;
pub mod target;
