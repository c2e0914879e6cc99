//! The operator shells that `Graph::run` wires together, and the three
//! capability traits they drive.

mod group;
mod join;
mod map;
mod reduce;
mod sort;
mod source;

pub(crate) use group::Groups;
pub(crate) use join::JoinStream;
pub(crate) use map::MapStream;
pub(crate) use reduce::ReduceStream;
pub(crate) use sort::SortStream;
pub(crate) use source::{LineParser, RowIter, file_stream, iter_stream};

pub use sort::SortOptions;

use crate::error::FlowError;
use crate::row::Row;

/// A lazy, finite, single-pass sequence of rows.
///
/// Streams exist only inside one `run`; dropping a stream before
/// exhaustion cancels the pipeline and releases its resources.
pub type RowStream = Box<dyn Iterator<Item = Result<Row, FlowError>>>;

/// Turns one input row into any number of output rows.
///
/// A mapper that returns no rows acts as a filter.  Implementations must
/// be re-entrant: the same mapper value is reused across rows and across
/// runs, so all per-row state belongs on the call.
pub trait Mapper {
    fn map(&self, row: Row) -> Result<Vec<Row>, FlowError>;
}

/// Folds one group of rows into any number of output rows.
///
/// The shell hands over every row of one group at a time, in stream
/// order, together with the grouping key columns.  Per-group state
/// belongs in locals of the call, never on the reducer value.
pub trait Reducer {
    fn reduce(&self, key: &[String], rows: &[Row]) -> Result<Vec<Row>, FlowError>;
}

/// Combines one matched pair of groups from the two sides of a join.
///
/// Either side may be empty when the other has no matching key; the
/// strategy decides what, if anything, to emit for that case.
pub trait Joiner {
    fn join(&self, keys: &[String], left: &[Row], right: &[Row]) -> Result<Vec<Row>, FlowError>;
}
