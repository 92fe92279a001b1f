//! Runtime snapshots and step history
//!
//! A [`Snapshot`] is what an interpreter hands over after each step: its lexical
//! environments (ordered name → datum bindings plus a parent link) and a heap of
//! identified objects. Object identity is explicit: two bindings holding the same
//! [`DatumId`] denote the same runtime array or closure.

use crate::errors::HistoryError;
use rustc_hash::FxHashMap;
use std::fmt;

/// Identifier of a runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvId(pub u64);

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env#{}", self.0)
    }
}

/// Identity of a heap object (array or closure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatumId(pub u64);

impl fmt::Display for DatumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Scalar runtime values
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Number(f64),
    Text(String),
    Bool(bool),
    Undefined,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Primitive::Number(n) => write!(f, "{}", n),
            Primitive::Text(s) => write!(f, "\"{}\"", s),
            Primitive::Bool(b) => write!(f, "{}", b),
            Primitive::Undefined => write!(f, "undefined"),
        }
    }
}

/// What a binding or an array cell holds
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Primitive(Primitive),
    /// The empty list / null pointer
    Null,
    /// A heap object, by identity
    Object(DatumId),
}

impl Datum {
    pub fn number(n: f64) -> Self {
        Datum::Primitive(Primitive::Number(n))
    }

    pub fn text(s: &str) -> Self {
        Datum::Primitive(Primitive::Text(s.to_string()))
    }

    pub fn object(id: u64) -> Self {
        Datum::Object(DatumId(id))
    }
}

/// A closure: parameters, body and the environment it was defined in
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub name: String,
    pub params: Vec<String>,
    pub body: String,
    pub env: EnvId,
}

impl Closure {
    /// Short textual form, used when the closure cannot be drawn as a function
    pub fn describe(&self) -> String {
        format!("{}({})", self.name, self.params.join(", "))
    }
}

/// Objects living on the heap
#[derive(Debug, Clone, PartialEq)]
pub enum HeapObject {
    Array(Vec<Datum>),
    Closure(Closure),
}

/// One name in an environment. `value` is `None` while the name is declared but
/// not yet assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvBinding {
    pub name: String,
    pub value: Option<Datum>,
    pub constant: bool,
}

/// A lexical environment as recorded by the interpreter
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEnv {
    pub id: EnvId,
    pub name: String,
    pub parent: Option<EnvId>,
    pub bindings: Vec<EnvBinding>,
}

impl RuntimeEnv {
    pub fn new(id: u64, name: &str, parent: Option<u64>) -> Self {
        RuntimeEnv {
            id: EnvId(id),
            name: name.to_string(),
            parent: parent.map(EnvId),
            bindings: Vec::new(),
        }
    }

    /// Bind a variable
    pub fn bind(mut self, name: &str, value: Datum) -> Self {
        self.push(name, Some(value), false);
        self
    }

    /// Bind a constant
    pub fn constant(mut self, name: &str, value: Datum) -> Self {
        self.push(name, Some(value), true);
        self
    }

    /// Declare a name without a value yet
    pub fn declare(mut self, name: &str) -> Self {
        self.push(name, None, false);
        self
    }

    fn push(&mut self, name: &str, value: Option<Datum>, constant: bool) {
        self.bindings.push(EnvBinding {
            name: name.to_string(),
            value,
            constant,
        });
    }

    /// True if the environment has names but none of them is assigned
    pub fn is_predeclared_only(&self) -> bool {
        !self.bindings.is_empty() && self.bindings.iter().all(|b| b.value.is_none())
    }
}

/// Interpreter state at one step
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub step: usize,
    /// Environments in creation order
    pub envs: Vec<RuntimeEnv>,
    pub heap: FxHashMap<DatumId, HeapObject>,
    /// Innermost environment of the running code; the tree builder walks
    /// outward from it to find the global environment
    pub current: Option<EnvId>,
}

impl Snapshot {
    pub fn new(step: usize) -> Self {
        Snapshot {
            step,
            ..Default::default()
        }
    }

    /// Add an environment; the last one added becomes the current one
    pub fn with_env(mut self, env: RuntimeEnv) -> Self {
        self.current = Some(env.id);
        self.envs.push(env);
        self
    }

    pub fn with_array(mut self, id: u64, cells: Vec<Datum>) -> Self {
        self.heap.insert(DatumId(id), HeapObject::Array(cells));
        self
    }

    pub fn with_closure(mut self, id: u64, closure: Closure) -> Self {
        self.heap.insert(DatumId(id), HeapObject::Closure(closure));
        self
    }

    pub fn object(&self, id: DatumId) -> Option<&HeapObject> {
        self.heap.get(&id)
    }

    /// Environments from the current one outward to the global one.
    /// Stops on a parent cycle.
    pub fn current_chain(&self) -> Vec<EnvId> {
        let mut chain = Vec::new();
        let mut next = self.current;
        while let Some(id) = next {
            if chain.contains(&id) {
                break;
            }
            chain.push(id);
            next = self
                .envs
                .iter()
                .find(|env| env.id == id)
                .and_then(|env| env.parent);
        }
        chain
    }

    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        // Rough figures: 100 bytes per environment, 40 per binding or cell
        let envs: usize = self
            .envs
            .iter()
            .map(|env| 100 + env.bindings.len() * 40)
            .sum();
        let heap: usize = self
            .heap
            .values()
            .map(|obj| match obj {
                HeapObject::Array(cells) => 40 + cells.len() * 40,
                HeapObject::Closure(c) => 100 + c.body.len(),
            })
            .sum();
        envs + heap
    }
}

/// Step history with a memory limit, navigated back and forth by the viewer
#[derive(Debug)]
pub struct SnapshotHistory {
    snapshots: Vec<Snapshot>,
    position: usize,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotHistory {
    pub fn new(max_memory: usize) -> Self {
        SnapshotHistory {
            snapshots: Vec::new(),
            position: 0,
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), HistoryError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(HistoryError::LimitExceeded {
                current: self.current_memory,
                requested: snapshot_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Snapshot at the current position
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.position)
    }

    pub fn step_forward(&mut self) -> Result<&Snapshot, HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        if self.position + 1 >= self.snapshots.len() {
            return Err(HistoryError::AtEnd);
        }
        self.position += 1;
        Ok(&self.snapshots[self.position])
    }

    pub fn step_backward(&mut self) -> Result<&Snapshot, HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        if self.position == 0 {
            return Err(HistoryError::AtStart);
        }
        self.position -= 1;
        Ok(&self.snapshots[self.position])
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    pub fn jump_to_end(&mut self) {
        self.position = self.snapshots.len().saturating_sub(1);
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_display() {
        assert_eq!(Primitive::Number(3.0).to_string(), "3");
        assert_eq!(Primitive::Number(2.5).to_string(), "2.5");
        assert_eq!(Primitive::Text("hi".into()).to_string(), "\"hi\"");
        assert_eq!(Primitive::Bool(false).to_string(), "false");
        assert_eq!(Primitive::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_current_chain_stops_on_cycle() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(1, "a", Some(2)))
            .with_env(RuntimeEnv::new(2, "b", Some(1)));
        assert_eq!(snapshot.current_chain(), vec![EnvId(2), EnvId(1)]);
    }

    #[test]
    fn test_history_navigation() {
        let mut history = SnapshotHistory::new(1024 * 1024);
        assert_eq!(history.step_forward().unwrap_err(), HistoryError::Empty);

        history.push(Snapshot::new(0)).unwrap();
        history.push(Snapshot::new(1)).unwrap();

        assert_eq!(history.step_backward().unwrap_err(), HistoryError::AtStart);
        assert_eq!(history.step_forward().unwrap().step, 1);
        assert_eq!(history.step_forward().unwrap_err(), HistoryError::AtEnd);
        history.rewind();
        assert_eq!(history.position(), 0);
    }

    #[test]
    fn test_history_memory_limit() {
        let big = Snapshot::new(0).with_env(RuntimeEnv::new(0, "global", None));
        let size = big.estimated_size();
        let mut history = SnapshotHistory::new(size);
        history.push(big.clone()).unwrap();
        assert!(matches!(
            history.push(big),
            Err(HistoryError::LimitExceeded { .. })
        ));
        assert_eq!(history.memory_usage(), size);
    }
}
