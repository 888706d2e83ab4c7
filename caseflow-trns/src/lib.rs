mod builder;
mod chain;
mod control;
mod expr;
mod init;
mod input;
mod leaf;

#[cfg(test)]
mod test;

pub use builder::ChainBuilder;
pub use chain::{Chain, ChainRunner, Outcome, Pass, RunState, Step, Transformation};
pub use control::{Clause, DoIf, IndexClause, Loop};
pub use expr::{constant, expr, field, Expr, Expression};
pub use init::CaseInit;
pub use input::input_program;
pub use leaf::{
    Break, CaseLimit, Compute, EndCase, EndFile, FilterBy, FnTransformation, ReadFrom, SelectIf,
};
