use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The system-missing numeric value. It is the most negative finite double,
/// so it sorts below every real value.
pub const SYSMIS: f64 = -f64::MAX;

/// One field of a record. Width 0 fields hold `Num`, the rest hold `Str` of
/// exactly the field's width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Num(f64),
    Str(Box<[u8]>),
}

impl Value {
    /// The value a freshly created record holds: system-missing, or spaces.
    pub fn missing(width: usize) -> Value {
        if width == 0 {
            Value::Num(SYSMIS)
        } else {
            Value::Str(vec![b' '; width].into_boxed_slice())
        }
    }

    /// The value resizing fills new fields with.
    pub fn zero(width: usize) -> Value {
        if width == 0 {
            Value::Num(0.0)
        } else {
            Value::Str(vec![0u8; width].into_boxed_slice())
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Value::Num(_) => 0,
            Value::Str(s) => s.len(),
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Str(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Num(_) => None,
            Value::Str(s) => Some(s),
        }
    }

    pub fn is_sysmis(&self) -> bool {
        matches!(self, Value::Num(n) if *n == SYSMIS)
    }

    /// Total order used by sorting and grouping. Numbers compare through
    /// `OrderedFloat`, strings byte-wise. Mixing the two is a usage fault.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => OrderedFloat(*a).cmp(&OrderedFloat(*b)),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => panic!("comparing numeric and string values"),
        }
    }
}

/// Copies `src` into a field of `width` bytes, padding with spaces or
/// truncating.
pub fn pad_bytes(src: &[u8], width: usize) -> Box<[u8]> {
    let mut v = vec![b' '; width];
    let n = src.len().min(width);
    v[..n].copy_from_slice(&src[..n]);
    v.into_boxed_slice()
}
