// Records are copy-on-write. `Record` is a shared, read-only handle; cloning
// it only bumps a count. `RecordMut` is the unique handle, and the only one
// with setters. Going from one to the other is `unshare` (which copies the
// body only when some other handle still shares it) and `freeze` (free).

use crate::{value::pad_bytes, Proto, Value};
use std::{fmt, ops::Deref, rc::Rc};

#[derive(Clone, PartialEq)]
pub struct RecordBody {
    proto: Proto,
    values: Vec<Value>,
}

impl fmt::Debug for RecordBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl RecordBody {
    pub fn proto(&self) -> &Proto {
        &self.proto
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, idx: usize) -> &Value {
        &self.values[idx]
    }

    /// The numeric field at `idx`. Panics if the field is a string.
    pub fn num(&self, idx: usize) -> f64 {
        match &self.values[idx] {
            Value::Num(n) => *n,
            Value::Str(_) => panic!("field {idx} is a string field"),
        }
    }

    /// The string field at `idx`. Panics if the field is numeric.
    pub fn str(&self, idx: usize) -> &[u8] {
        match &self.values[idx] {
            Value::Str(s) => s,
            Value::Num(_) => panic!("field {idx} is a numeric field"),
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Record(Rc<RecordBody>);

pub struct RecordMut(Rc<RecordBody>);

impl Deref for Record {
    type Target = RecordBody;
    fn deref(&self) -> &RecordBody {
        &self.0
    }
}

impl Deref for RecordMut {
    type Target = RecordBody;
    fn deref(&self) -> &RecordBody {
        &self.0
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for RecordMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Record {
    /// A record of the given shape with every numeric field system-missing
    /// and every string field blank.
    pub fn new(proto: &Proto) -> Record {
        RecordMut::new(proto).freeze()
    }

    pub fn from_values(proto: &Proto, values: Vec<Value>) -> Record {
        assert_eq!(proto.len(), values.len(), "record/prototype length mismatch");
        for (i, v) in values.iter().enumerate() {
            assert_eq!(v.width(), proto.width(i), "field {i} width mismatch");
        }
        Record(Rc::new(RecordBody {
            proto: proto.clone(),
            values,
        }))
    }

    /// An all-numeric record.
    pub fn numbers(nums: &[f64]) -> Record {
        let proto = Proto::numeric(nums.len());
        Record::from_values(&proto, nums.iter().map(|n| Value::Num(*n)).collect())
    }

    pub fn is_shared(&self) -> bool {
        Rc::strong_count(&self.0) > 1
    }

    /// A copy that shares nothing with `self`.
    pub fn deep_clone(&self) -> Record {
        Record(Rc::new((*self.0).clone()))
    }

    pub fn unshare(self) -> RecordMut {
        let mut rc = self.0;
        Rc::make_mut(&mut rc);
        RecordMut(rc)
    }

    pub fn unshare_and_resize(self, proto: &Proto) -> RecordMut {
        let mut m = self.unshare();
        m.resize(proto);
        m
    }

    /// Unshares, applies `f`, and hands back a shared handle.
    pub fn modify(self, f: impl FnOnce(&mut RecordMut)) -> Record {
        let mut m = self.unshare();
        f(&mut m);
        m.freeze()
    }
}

impl RecordMut {
    pub fn new(proto: &Proto) -> RecordMut {
        let values = proto.widths().iter().map(|w| Value::missing(*w)).collect();
        RecordMut(Rc::new(RecordBody {
            proto: proto.clone(),
            values,
        }))
    }

    pub fn freeze(self) -> Record {
        Record(self.0)
    }

    fn body(&mut self) -> &mut RecordBody {
        Rc::make_mut(&mut self.0)
    }

    pub fn set_num(&mut self, idx: usize, n: f64) {
        *self.num_mut(idx) = n;
    }

    pub fn num_mut(&mut self, idx: usize) -> &mut f64 {
        match &mut self.body().values[idx] {
            Value::Num(n) => n,
            Value::Str(_) => panic!("field {idx} is a string field"),
        }
    }

    pub fn str_mut(&mut self, idx: usize) -> &mut [u8] {
        match &mut self.body().values[idx] {
            Value::Str(s) => s,
            Value::Num(_) => panic!("field {idx} is a numeric field"),
        }
    }

    /// Stores `s` into a string field, space-padded or truncated to fit.
    pub fn set_str(&mut self, idx: usize, s: &[u8]) {
        let width = self.proto.width(idx);
        assert!(width > 0, "field {idx} is a numeric field");
        self.body().values[idx] = Value::Str(pad_bytes(s, width));
    }

    pub fn set_value(&mut self, idx: usize, v: Value) {
        assert_eq!(v.width(), self.proto.width(idx), "field {idx} width mismatch");
        self.body().values[idx] = v;
    }

    pub fn set_missing(&mut self, idx: usize) {
        let width = self.proto.width(idx);
        self.body().values[idx] = Value::missing(width);
    }

    /// Reshapes to `proto`. Leading fields whose width is unchanged keep
    /// their values; new or retyped fields are zeroed and surplus fields
    /// are dropped.
    pub fn resize(&mut self, proto: &Proto) {
        if self.proto == *proto {
            return;
        }
        let body = self.body();
        let old = std::mem::take(&mut body.values);
        let old_proto = std::mem::replace(&mut body.proto, proto.clone());
        let mut old = old.into_iter();
        body.values = proto
            .widths()
            .iter()
            .enumerate()
            .map(|(i, w)| match old.next() {
                Some(v) if i < old_proto.len() && old_proto.width(i) == *w => v,
                _ => Value::zero(*w),
            })
            .collect();
    }

    /// Copies the listed fields from `other`, which must have the same
    /// widths there.
    pub fn copy_from(&mut self, other: &RecordBody, fields: &[usize]) {
        for i in fields {
            let v = other.value(*i).clone();
            self.set_value(*i, v);
        }
    }
}

impl Default for RecordMut {
    fn default() -> Self {
        RecordMut::new(&Proto::empty())
    }
}
