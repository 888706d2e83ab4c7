// The dataset is what the command layer talks to: a dictionary, the active
// data, and the transformations waiting to run over it. Procedures open it,
// read through it once and commit; everything below (streams, sorting,
// chains) lives in the subsystem crates and is re-exported here for
// convenience.

mod dataset;

#[cfg(test)]
mod test;

pub use caseflow_base as base;
pub use caseflow_data as data;
pub use caseflow_trns as trns;
pub use dataset::{Dataset, Lag};
