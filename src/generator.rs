use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

enum State {
    Pending(Box<dyn Iterator<Item = Value>>),
    Materialized(Rc<Vec<Value>>),
}

/// A single-pass lazy sequence.
///
/// The underlying iterator is drained the first time the sequence is needed
/// and the owned result is shared by every clone from then on.
#[derive(Clone)]
pub struct Generator {
    state: Rc<RefCell<State>>,
}

impl Generator {
    pub fn new<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self {
            state: Rc::new(RefCell::new(State::Pending(Box::new(iter.into_iter())))),
        }
    }

    /// Whether both handles refer to the same underlying sequence.
    pub fn ptr_eq(&self, other: &Generator) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn is_consumed(&self) -> bool {
        matches!(*self.state.borrow(), State::Materialized(_))
    }

    /// Drain the iterator (once) and return the owned items.
    pub fn materialize(&self) -> Rc<Vec<Value>> {
        let mut state = self.state.borrow_mut();
        let items = match &mut *state {
            State::Materialized(items) => return Rc::clone(items),
            State::Pending(iter) => Rc::new(iter.by_ref().collect::<Vec<_>>()),
        };
        *state = State::Materialized(Rc::clone(&items));
        items
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            State::Pending(_) => f.write_str("Generator(<pending>)"),
            State::Materialized(items) => f.debug_tuple("Generator").field(items).finish(),
        }
    }
}
