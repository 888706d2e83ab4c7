// Taint is a weak error signal shared between the stages of a row stream.
//
// Taint objects form a directed graph. An edge A -> B is made by
// `A.propagate(&B)` and means "if A ever becomes tainted, so does B". Two
// invariants hold at all times:
//
//  1. If a node is tainted, then all of its successors are tainted.
//
//  2. If a node is tainted, then it and all of its predecessors are
//     successor-tainted.
//
// So a fault anywhere downstream is visible upstream through
// `has_tainted_successor`, and a fault upstream is visible downstream
// through `is_tainted`. Which fault it was is deliberately not kept.
//
// Edges are weak in both directions; a node lives as long as some stream
// stage holds a `Taint` handle to it. When the last handle goes, the node
// splices its predecessors onto its successors so that transitive
// propagation through it survives.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

#[cfg(test)]
use test_log::test;

#[derive(Default)]
struct Node {
    tainted: Cell<bool>,
    tainted_successor: Cell<bool>,
    successors: RefCell<Vec<Weak<Node>>>,
    predecessors: RefCell<Vec<Weak<Node>>>,
}

#[derive(Clone)]
pub struct Taint(Rc<Node>);

impl Default for Taint {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Taint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taint")
            .field("tainted", &self.0.tainted.get())
            .field("tainted_successor", &self.0.tainted_successor.get())
            .finish()
    }
}

impl Taint {
    pub fn new() -> Self {
        Taint(Rc::new(Node::default()))
    }

    /// Arranges for `to` to become tainted whenever `self` does. Takes
    /// effect immediately if `self` is already tainted.
    pub fn propagate(&self, to: &Taint) {
        link(&self.0, &to.0);
    }

    pub fn is_tainted(&self) -> bool {
        self.0.tainted.get()
    }

    pub fn set(&self) {
        if !self.0.tainted.get() {
            set_taint(&self.0);
        }
    }

    /// True if this node, or any node reachable from it along propagation
    /// edges, is or ever was tainted.
    pub fn has_tainted_successor(&self) -> bool {
        self.0.tainted_successor.get()
    }

    /// Clears the successor-taint flag, which only works if no successor
    /// currently carries it.
    pub fn reset_successor_taint(&self) {
        if self.0.tainted_successor.get() {
            if live(&self.0.successors)
                .iter()
                .any(|s| s.tainted_successor.get())
            {
                return;
            }
            self.0.tainted_successor.set(false);
        }
    }

    pub fn same(&self, other: &Taint) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

fn live(list: &RefCell<Vec<Weak<Node>>>) -> Vec<Rc<Node>> {
    let mut list = list.borrow_mut();
    list.retain(|w| w.strong_count() > 0);
    list.iter().filter_map(|w| w.upgrade()).collect()
}

fn add(list: &RefCell<Vec<Weak<Node>>>, node: &Rc<Node>) {
    let mut list = list.borrow_mut();
    let ptr = Rc::as_ptr(node);
    if !list.iter().any(|w| w.as_ptr() == ptr) {
        list.push(Rc::downgrade(node));
    }
}

fn link(from: &Rc<Node>, to: &Rc<Node>) {
    if Rc::ptr_eq(from, to) {
        return;
    }
    add(&from.successors, to);
    add(&to.predecessors, from);
    if from.tainted.get() && !to.tainted.get() {
        set_taint(to);
    } else if to.tainted_successor.get() && !from.tainted_successor.get() {
        set_tainted_successor(from);
    }
}

fn set_taint(node: &Rc<Node>) {
    node.tainted.set(true);
    node.tainted_successor.set(true);
    for s in live(&node.successors) {
        if !s.tainted.get() {
            set_taint(&s);
        }
    }
    for p in live(&node.predecessors) {
        if !p.tainted_successor.get() {
            set_tainted_successor(&p);
        }
    }
}

fn set_tainted_successor(node: &Rc<Node>) {
    node.tainted_successor.set(true);
    for p in live(&node.predecessors) {
        if !p.tainted_successor.get() {
            set_tainted_successor(&p);
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let preds = live(&self.predecessors);
        let succs = live(&self.successors);
        for p in preds.iter() {
            for s in succs.iter() {
                link(p, s);
            }
        }
    }
}

#[test]
fn test_taint_flows_forward() {
    let a = Taint::new();
    let b = Taint::new();
    let c = Taint::new();
    a.propagate(&b);
    b.propagate(&c);
    assert!(!c.is_tainted());
    a.set();
    assert!(b.is_tainted());
    assert!(c.is_tainted());
}

#[test]
fn test_successor_taint_flows_back() {
    let a = Taint::new();
    let b = Taint::new();
    let c = Taint::new();
    a.propagate(&b);
    b.propagate(&c);
    c.set();
    assert!(!a.is_tainted());
    assert!(a.has_tainted_successor());
    assert!(b.has_tainted_successor());
}
