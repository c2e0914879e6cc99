use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::FlowError;
use crate::operators::{
    JoinStream, Joiner, LineParser, MapStream, Mapper, ReduceStream, Reducer, RowIter, RowStream,
    SortOptions, SortStream, file_stream, iter_stream,
};
use crate::row::Row;

type Factory = Box<dyn Fn() -> RowIter>;

/// Run-time bindings from source name to a nullary factory producing a
/// fresh row iterator.  Factories may be invoked several times per run
/// (a sub-graph referenced by a join is re-executed) and once more on
/// every re-run, so they must hand out independent iterators.
#[derive(Default)]
pub struct SourceBindings {
    factories: HashMap<String, Factory>,
}

impl SourceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `factory`, builder style.
    pub fn bind<I>(mut self, name: impl Into<String>, factory: impl Fn() -> I + 'static) -> Self
    where
        I: IntoIterator<Item = Row>,
        I::IntoIter: 'static,
    {
        self.factories
            .insert(name.into(), Box::new(move || Box::new(factory().into_iter())));
        self
    }

    fn factory(&self, name: &str) -> Result<RowIter, FlowError> {
        match self.factories.get(name) {
            Some(make) => Ok(make()),
            None => Err(FlowError::SourceMissing(name.to_owned())),
        }
    }
}

enum Op {
    IterSource {
        name: String,
    },
    FileSource {
        path: PathBuf,
        parser: Rc<LineParser>,
    },
    Map {
        mapper: Rc<dyn Mapper>,
    },
    Reduce {
        reducer: Rc<dyn Reducer>,
        keys: Vec<String>,
    },
    Sort {
        keys: Vec<String>,
        options: SortOptions,
    },
    Join {
        joiner: Rc<dyn Joiner>,
        keys: Vec<String>,
    },
}

struct Node {
    op: Op,
    parent: Option<Rc<Node>>,
    right: Option<Rc<Node>>,
}

/// An immutable description of an operator pipeline.
///
/// Graphs are cheap values: every builder call returns a new node
/// wrapping the previous one, and cloning shares the description.
/// Nothing runs until [Graph::run], which materializes a fresh stream
/// pull-style from the bound sources; the same graph can be re-run any
/// number of times against different bindings.
///
/// ```
/// use rowflow::*;
///
/// let counts = Graph::from_iter("lines")
///     .map(Split::new("text"))
///     .sort(&["text"])
///     .reduce(Count::new("count"), &["text"]);
///
/// let bindings = SourceBindings::new()
///     .bind("lines", || vec![row! {"text" => "to be or not to be"}]);
/// let rows: Vec<Row> = counts
///     .run(&bindings)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(rows.len(), 4);
/// ```
#[derive(Clone)]
pub struct Graph {
    node: Rc<Node>,
}

impl Graph {
    fn wrap(op: Op, parent: Option<Rc<Node>>, right: Option<Rc<Node>>) -> Graph {
        Graph {
            node: Rc::new(Node { op, parent, right }),
        }
    }

    /// A leaf graph reading rows from the named source binding.
    pub fn from_iter(name: impl Into<String>) -> Graph {
        Graph::wrap(Op::IterSource { name: name.into() }, None, None)
    }

    /// A leaf graph reading rows from a file, one per line, through the
    /// supplied parser.  The file is opened when `run` is called and
    /// closed when the stream ends.
    pub fn from_file(
        path: impl Into<PathBuf>,
        parser: impl Fn(&str) -> anyhow::Result<Row> + 'static,
    ) -> Graph {
        Graph::wrap(
            Op::FileSource {
                path: path.into(),
                parser: Rc::new(parser),
            },
            None,
            None,
        )
    }

    /// Extends the pipeline with a map over `mapper`.
    pub fn map(&self, mapper: impl Mapper + 'static) -> Graph {
        Graph::wrap(
            Op::Map {
                mapper: Rc::new(mapper),
            },
            Some(self.node.clone()),
            None,
        )
    }

    /// Extends the pipeline with a grouped reduce.  The upstream must
    /// already be grouped by `keys` (insert a [Graph::sort] when it is
    /// not); the engine does not verify this.
    pub fn reduce(&self, reducer: impl Reducer + 'static, keys: &[&str]) -> Graph {
        Graph::wrap(
            Op::Reduce {
                reducer: Rc::new(reducer),
                keys: own(keys),
            },
            Some(self.node.clone()),
            None,
        )
    }

    /// Extends the pipeline with a stable ascending sort by `keys`.
    pub fn sort(&self, keys: &[&str]) -> Graph {
        self.sort_with(keys, SortOptions::default())
    }

    /// Like [Graph::sort], with explicit spill tuning.
    pub fn sort_with(&self, keys: &[&str], options: SortOptions) -> Graph {
        Graph::wrap(
            Op::Sort {
                keys: own(keys),
                options,
            },
            Some(self.node.clone()),
            None,
        )
    }

    /// Extends the pipeline with a sort-merge join against `right`.
    /// Both sides must be sorted ascending by `keys`.  The right graph
    /// is re-executed on every run of this one.
    pub fn join(&self, joiner: impl Joiner + 'static, right: &Graph, keys: &[&str]) -> Graph {
        Graph::wrap(
            Op::Join {
                joiner: Rc::new(joiner),
                keys: own(keys),
            },
            Some(self.node.clone()),
            Some(right.node.clone()),
        )
    }

    /// Materializes the pipeline against `bindings` and returns its
    /// output stream.  Each call produces an independent stream; state
    /// never leaks between runs.
    pub fn run(&self, bindings: &SourceBindings) -> Result<RowStream, FlowError> {
        materialize(&self.node, bindings)
    }
}

fn own(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| (*key).to_owned()).collect()
}

fn materialize(node: &Rc<Node>, bindings: &SourceBindings) -> Result<RowStream, FlowError> {
    match &node.op {
        Op::IterSource { name } => Ok(iter_stream(bindings.factory(name)?)),
        Op::FileSource { path, parser } => file_stream(path, parser.clone()),
        Op::Map { mapper } => {
            let upstream = materialize(parent(node), bindings)?;
            Ok(Box::new(MapStream::new(mapper.clone(), upstream)))
        }
        Op::Reduce { reducer, keys } => {
            let upstream = materialize(parent(node), bindings)?;
            Ok(Box::new(ReduceStream::new(
                reducer.clone(),
                keys.clone(),
                upstream,
            )))
        }
        Op::Sort { keys, options } => {
            let upstream = materialize(parent(node), bindings)?;
            Ok(Box::new(SortStream::new(
                keys.clone(),
                options.clone(),
                upstream,
            )))
        }
        Op::Join { joiner, keys } => {
            let left = materialize(parent(node), bindings)?;
            let right_node = node
                .right
                .as_ref()
                .expect("join node always carries a right sibling");
            let right = materialize(right_node, bindings)?;
            Ok(Box::new(JoinStream::new(
                joiner.clone(),
                keys.clone(),
                left,
                right,
            )))
        }
    }
}

fn parent(node: &Rc<Node>) -> &Rc<Node> {
    node.parent
        .as_ref()
        .expect("non-source operator always has an upstream")
}
