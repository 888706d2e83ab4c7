mod dict;
mod filter;
mod fork;
mod grouper;
pub mod ioutil;
mod keys;
mod merge;
mod proto;
mod record;
mod select;
mod sink;
mod sort;
mod source;
mod translate;
mod value;


pub use dict::{Dictionary, MissingClass, MissingValues, Variable};
pub use filter::{count_into, filter, filter_excluding, filter_missing, filter_weight, Excluded};
pub use grouper::{group_by, Grouper};
pub use keys::{Direction, KeyField, KeySpec};
pub use proto::Proto;
pub use record::{Record, RecordBody, RecordMut};
pub use select::select;
pub use sink::{RowSink, SinkProvider};
pub use sort::{sort, sort_by_field, sort_writer};
pub use source::{CaseNumber, RowProvider, RowSource};
pub use translate::{
    append_numeric, append_rank, append_sequence, distinct, project, translate,
    translate_stateless, DistinctFn, RankErrors,
};
pub use value::{pad_bytes, Value, SYSMIS};
