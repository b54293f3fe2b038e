//! Translate typed expression trees into SQL fragments and assemble them into statements.

pub mod aggregates;
pub mod error;
pub mod expression;
pub mod helpers;
pub mod query;
pub mod typing;
pub mod values;
