use crate::Value;
use std::{fmt, rc::Rc};

/// The shape of a record: one width per field, 0 for numeric. Prototypes
/// are immutable and cheap to clone; streams and records share them.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Proto(Rc<[usize]>);

impl fmt::Debug for Proto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl Default for Proto {
    fn default() -> Self {
        Self::empty()
    }
}

impl Proto {
    pub fn empty() -> Self {
        Proto(Rc::from(Vec::new()))
    }

    pub fn new(widths: impl Into<Vec<usize>>) -> Self {
        Proto(Rc::from(widths.into()))
    }

    pub fn numeric(n: usize) -> Self {
        Proto::new(vec![0; n])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn width(&self, idx: usize) -> usize {
        self.0[idx]
    }

    pub fn widths(&self) -> &[usize] {
        &self.0
    }

    pub fn n_strings(&self) -> usize {
        self.0.iter().filter(|w| **w > 0).count()
    }

    /// A new prototype with one more field of `width` at the end.
    pub fn with_width(&self, width: usize) -> Proto {
        let mut v = self.0.to_vec();
        v.push(width);
        Proto::new(v)
    }

    /// A prototype of the selected fields, in the given order.
    pub fn project(&self, fields: &[usize]) -> Proto {
        Proto::new(fields.iter().map(|i| self.0[*i]).collect::<Vec<_>>())
    }

    /// Approximate bytes per record, for workspace accounting.
    pub fn cost(&self) -> usize {
        (1 + self.len() + 3 * self.n_strings()) * std::mem::size_of::<Value>()
    }

    /// True if every field the two prototypes have in common has the same
    /// width, so one can be resized into the other without retyping.
    pub fn is_conformable(&self, other: &Proto) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }
}
