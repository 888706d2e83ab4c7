// The slice of the variable catalog the row machinery needs: field widths,
// missing-value rules, which fields survive between generated records, and
// which variables play the weight, filter and split roles.

use crate::{KeySpec, Proto, Value, SYSMIS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingClass {
    /// Only user-declared missing values.
    User,
    /// Only the system-missing value.
    System,
    Any,
}

impl MissingClass {
    fn includes_user(self) -> bool {
        matches!(self, MissingClass::User | MissingClass::Any)
    }
    fn includes_system(self) -> bool {
        matches!(self, MissingClass::System | MissingClass::Any)
    }
}

/// User-missing values of one variable: up to three discrete values, or
/// (numeric only) one closed range plus at most one discrete value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MissingValues {
    width: usize,
    discrete: Vec<Value>,
    range: Option<(f64, f64)>,
}

impl MissingValues {
    pub fn new(width: usize) -> Self {
        MissingValues {
            width,
            discrete: Vec::new(),
            range: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.range.is_none()
    }

    fn capacity(&self) -> usize {
        if self.range.is_some() {
            1
        } else {
            3
        }
    }

    /// Adds a discrete value. Returns false, leaving the set unchanged, if
    /// there is no room or the value has the wrong width.
    pub fn add_value(&mut self, v: Value) -> bool {
        if v.width() != self.width || self.discrete.len() >= self.capacity() {
            return false;
        }
        self.discrete.push(v);
        true
    }

    /// Adds the range `lo..=hi`. Only numeric variables have ranges, and at
    /// most one discrete value may accompany one.
    pub fn add_range(&mut self, lo: f64, hi: f64) -> bool {
        if self.width != 0 || self.range.is_some() || self.discrete.len() > 1 || lo > hi {
            return false;
        }
        self.range = Some((lo, hi));
        true
    }

    pub fn is_user_missing(&self, v: &Value) -> bool {
        if self.discrete.iter().any(|d| d == v) {
            return true;
        }
        match (self.range, v) {
            (Some((lo, hi)), Value::Num(n)) => *n >= lo && *n <= hi,
            _ => false,
        }
    }

    pub fn is_missing(&self, v: &Value, class: MissingClass) -> bool {
        match v {
            Value::Num(n) if *n == SYSMIS => class.includes_system(),
            _ => class.includes_user() && self.is_user_missing(v),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Variable {
    pub name: String,
    pub index: usize,
    pub width: usize,
    pub missing: MissingValues,
    /// Keeps its value from one generated record to the next instead of
    /// being reinitialised.
    pub leave: bool,
}

impl Variable {
    pub fn is_numeric(&self) -> bool {
        self.width == 0
    }
}

#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    vars: Vec<Variable>,
    weight: Option<usize>,
    filter: Option<usize>,
    case_limit: Option<u64>,
    split: Vec<usize>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a variable and returns its field index. Names are compared
    /// case-insensitively; a duplicate is a usage fault.
    pub fn add_var(&mut self, name: &str, width: usize) -> usize {
        assert!(self.lookup(name).is_none(), "duplicate variable {name}");
        let index = self.vars.len();
        self.vars.push(Variable {
            name: name.to_string(),
            index,
            width,
            missing: MissingValues::new(width),
            leave: false,
        });
        index
    }

    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    pub fn var(&self, idx: usize) -> &Variable {
        &self.vars[idx]
    }

    pub fn var_mut(&mut self, idx: usize) -> &mut Variable {
        &mut self.vars[idx]
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn proto(&self) -> Proto {
        Proto::new(self.vars.iter().map(|v| v.width).collect::<Vec<_>>())
    }

    pub fn set_leave(&mut self, idx: usize, leave: bool) {
        self.vars[idx].leave = leave;
    }

    pub fn leave_fields(&self) -> Vec<usize> {
        self.vars.iter().filter(|v| v.leave).map(|v| v.index).collect()
    }

    pub fn weight(&self) -> Option<usize> {
        self.weight
    }

    pub fn set_weight(&mut self, idx: Option<usize>) {
        if let Some(i) = idx {
            assert!(self.vars[i].is_numeric(), "weight variable must be numeric");
        }
        self.weight = idx;
    }

    /// The weight of a record: 1 when unweighted, otherwise the weight
    /// field if it is a positive finite non-missing number, else 0.
    pub fn case_weight(&self, rec: &crate::RecordBody) -> f64 {
        match self.weight {
            None => 1.0,
            Some(i) => {
                let w = rec.num(i);
                let var = &self.vars[i];
                if var.missing.is_missing(rec.value(i), MissingClass::Any)
                    || !w.is_finite()
                    || w <= 0.0
                {
                    0.0
                } else {
                    w
                }
            }
        }
    }

    pub fn filter(&self) -> Option<usize> {
        self.filter
    }

    pub fn set_filter(&mut self, idx: Option<usize>) {
        if let Some(i) = idx {
            assert!(self.vars[i].is_numeric(), "filter variable must be numeric");
        }
        self.filter = idx;
    }

    pub fn case_limit(&self) -> Option<u64> {
        self.case_limit
    }

    pub fn set_case_limit(&mut self, limit: Option<u64>) {
        self.case_limit = limit;
    }

    pub fn split(&self) -> &[usize] {
        &self.split
    }

    pub fn set_split(&mut self, fields: Vec<usize>) {
        self.split = fields;
    }

    /// Ascending key over the named variables, for SORT CASES and grouping.
    pub fn key_of(&self, fields: &[usize]) -> KeySpec {
        let mut key = KeySpec::new();
        for i in fields {
            key.add(*i, self.vars[*i].width, crate::Direction::Ascending);
        }
        key
    }
}
