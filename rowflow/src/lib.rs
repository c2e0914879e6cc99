//! Lazy computational graphs over record streams.
//!
//! Rowflow builds MapReduce-style pipelines over flat key→value records:
//! a [Graph] is an immutable description of chained operators (source,
//! map, reduce, sort, join), and nothing runs until [Graph::run] pulls a
//! fresh [RowStream] out of the bound sources.  The same graph can be
//! re-run against different bindings, and a sub-graph can feed several
//! joins.
//!
//! ```rust
//! use rowflow::*;
//!
//! fn main() {
//!     let word_counts = Graph::from_iter("docs")
//!         .map(FilterPunctuation::new("text"))
//!         .map(LowerCase::new("text"))
//!         .map(Split::new("text"))
//!         .sort(&["text"])
//!         .reduce(Count::new("count"), &["text"])
//!         .sort(&["count", "text"]);
//!
//!     let bindings = SourceBindings::new().bind("docs", || {
//!         vec![
//!             row! {"doc_id" => 1, "text" => "Hello, world!"},
//!             row! {"doc_id" => 2, "text" => "hello again"},
//!         ]
//!     });
//!
//!     for row in word_counts.run(&bindings).unwrap() {
//!         println!("{}", row.unwrap().to_json().unwrap());
//!     }
//! }
//! ```
//!
//! ## Execution model
//!
//! Execution is single-threaded and pull-based: every operator is a lazy
//! iterator, and downstream demand drives the pipeline.  Reduce and join
//! group *consecutive* rows with equal keys, so their inputs must arrive
//! sorted (or at least grouped) by the declared key columns — place a
//! [Graph::sort] upstream.  The sort is stable and spills to uniquely
//! named temp files once its buffer fills, so pipelines keep running on
//! inputs larger than memory; spills vanish when the stream is dropped.
//!
//! ## Errors
//!
//! The first [FlowError] aborts the run and terminates the stream; there
//! is no per-row recovery.  Sources, rows and streams release their
//! resources on the abort path as well as on early drop.

#[macro_use]
extern crate log;

mod error;
mod graph;
mod library;
mod operators;
mod row;

pub use error::*;
pub use graph::*;
pub use library::*;
pub use operators::{Joiner, Mapper, Reducer, RowStream, SortOptions};
pub use row::*;
