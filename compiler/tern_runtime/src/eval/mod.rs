//! Graph interpreter.
//!
//! Walks the control chain from `Start`, evaluating each fixed node in
//! order. Floating nodes are evaluated on demand and memoized. Every node
//! kind is supported, high-level ones included, so a graph can be run
//! before canonicalization, between phases, and after lowering.

use rustc_hash::FxHashMap;
use tern_ir::{Constant, Dispatch, Graph, MetaAccess, MethodRef, NodeId, NodeKind};

use crate::heap::{Runtime, RuntimeError};


/// Abnormal termination of a graph run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    /// A null receiver reached a call or a null check.
    #[error("null pointer at {node:?}")]
    NullPointer { node: NodeId },
    #[error("argument {index} was not supplied")]
    MissingArgument { index: u32 },
    /// A value was read before the fixed node producing it ran.
    #[error("{node:?} was used before it was evaluated")]
    Unscheduled { node: NodeId },
    /// A devirtualized call met a receiver of another class.
    #[error("direct call at {node:?} reached a receiver of the wrong class")]
    DispatchMismatch { node: NodeId },
    #[error("control chain ended without a Return")]
    NoReturn,
    #[error("{kind} at {node:?} failed: {source}")]
    Runtime {
        node: NodeId,
        kind: &'static str,
        #[source]
        source: RuntimeError,
    },
}

/// Observable result of a graph run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Value passed to `Return`.
    pub value: Constant,
    /// `(slot, value)` for every `Store`, in execution order.
    pub stores: Vec<(u32, Constant)>,
}

/// Run `graph` against `runtime` with the given arguments.
pub fn evaluate(graph: &Graph, runtime: &Runtime, args: &[Constant]) -> Result<Outcome, Trap> {
    Interpreter {
        graph,
        runtime,
        args,
        values: FxHashMap::default(),
        stores: Vec::new(),
    }
    .run()
}

struct Interpreter<'a> {
    graph: &'a Graph,
    runtime: &'a Runtime,
    args: &'a [Constant],
    values: FxHashMap<NodeId, Constant>,
    stores: Vec<(u32, Constant)>,
}

impl Interpreter<'_> {
    fn run(mut self) -> Result<Outcome, Trap> {
        let mut cursor = self.graph.next(self.graph.start());
        while let Some(node) = cursor {
            let kind = *self.graph.kind(node);
            tracing::trace!(node = node.raw(), kind = kind.name(), "eval");
            match kind {
                NodeKind::Return => {
                    let value = self.input(node, 0)?;
                    return Ok(Outcome {
                        value,
                        stores: self.stores,
                    });
                }
                NodeKind::CallSiteTarget(descriptor) | NodeKind::Invoke(descriptor) => {
                    let value = self.call(node, descriptor.method)?;
                    self.values.insert(node, value);
                }
                NodeKind::Call(target) => {
                    if let Dispatch::Direct { receiver_type } = target.dispatch {
                        let receiver = self.input(node, 0)?;
                        let actual = receiver.as_object().and_then(|o| self.runtime.type_of(o));
                        if actual.is_some_and(|ty| ty != receiver_type) {
                            return Err(Trap::DispatchMismatch { node });
                        }
                    }
                    let value = self.call(node, target.method)?;
                    self.values.insert(node, value);
                }
                NodeKind::NullCheck => {
                    if self.input(node, 0)?.is_null() {
                        return Err(Trap::NullPointer { node });
                    }
                }
                NodeKind::Store { slot } => {
                    let value = self.input(node, 0)?;
                    self.stores.push((slot, value));
                }
                // Only fixed kinds are linked into the chain.
                NodeKind::Start | NodeKind::Parameter { .. } | NodeKind::Constant(_) => {}
            }
            cursor = self.graph.next(node);
        }
        Err(Trap::NoReturn)
    }

    fn input(&mut self, node: NodeId, position: usize) -> Result<Constant, Trap> {
        let graph = self.graph;
        match graph.inputs(node).get(position) {
            Some(&input) => self.value(input),
            None => Err(Trap::Unscheduled { node }),
        }
    }

    fn value(&mut self, node: NodeId) -> Result<Constant, Trap> {
        if let Some(&value) = self.values.get(&node) {
            return Ok(value);
        }
        let value = match *self.graph.kind(node) {
            NodeKind::Constant(constant) => constant,
            NodeKind::Parameter { index } => {
                let slot = usize::try_from(index).map_err(|_| Trap::MissingArgument { index })?;
                *self.args.get(slot).ok_or(Trap::MissingArgument { index })?
            }
            _ => return Err(Trap::Unscheduled { node }),
        };
        self.values.insert(node, value);
        Ok(value)
    }

    fn call(&mut self, node: NodeId, method: MethodRef) -> Result<Constant, Trap> {
        let graph = self.graph;
        let args = graph
            .inputs(node)
            .iter()
            .map(|&input| self.value(input))
            .collect::<Result<Vec<_>, _>>()?;
        self.runtime
            .invoke(method, &args)
            .map_err(|source| match source {
                RuntimeError::NullReceiver { .. } => Trap::NullPointer { node },
                source => Trap::Runtime {
                    node,
                    kind: graph.kind(node).name(),
                    source,
                },
            })
    }
}
