use crate::RecordBody;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyField {
    pub index: usize,
    pub width: usize,
    pub direction: Direction,
}

/// An ordered list of fields to compare records on, lexicographically.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySpec {
    fields: Vec<KeyField>,
}

impl KeySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(index: usize, width: usize) -> Self {
        let mut k = KeySpec::new();
        k.add(index, width, Direction::Ascending);
        k
    }

    pub fn add(&mut self, index: usize, width: usize, direction: Direction) {
        self.fields.push(KeyField {
            index,
            width,
            direction,
        });
    }

    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn compare(&self, a: &RecordBody, b: &RecordBody) -> Ordering {
        for f in self.fields.iter() {
            let ord = a.value(f.index).compare(b.value(f.index));
            let ord = match f.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn equal(&self, a: &RecordBody, b: &RecordBody) -> bool {
        self.fields
            .iter()
            .all(|f| a.value(f.index).compare(b.value(f.index)) == Ordering::Equal)
    }
}
