//! The typed expression tree callers build queries from, and the text it becomes.

pub mod ast;
pub mod helpers;
pub mod string;
