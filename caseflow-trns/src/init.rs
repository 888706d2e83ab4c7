use caseflow_data::{Dictionary, Proto, RecordBody, RecordMut, Value};

/// Builds the starting record for each generated case. Ordinary fields start
/// out missing; LEAVE fields carry whatever the previous case left in them,
/// starting from zero (numeric) or blanks (string).
#[derive(Clone, Debug)]
pub struct CaseInit {
    proto: Proto,
    leave: Vec<usize>,
    saved: Vec<Value>,
}

impl CaseInit {
    pub fn new(proto: &Proto, leave: Vec<usize>) -> Self {
        let saved = leave
            .iter()
            .map(|i| match proto.width(*i) {
                0 => Value::Num(0.0),
                w => Value::missing(w),
            })
            .collect();
        CaseInit {
            proto: proto.clone(),
            leave,
            saved,
        }
    }

    pub fn for_dict(dict: &Dictionary) -> Self {
        Self::new(&dict.proto(), dict.leave_fields())
    }

    pub fn proto(&self) -> &Proto {
        &self.proto
    }

    pub fn fresh(&self) -> RecordMut {
        let mut rec = RecordMut::new(&self.proto);
        self.restore(&mut rec);
        rec
    }

    /// Overwrites the LEAVE fields of `rec` with the saved values.
    pub fn restore(&self, rec: &mut RecordMut) {
        for (i, v) in self.leave.iter().zip(self.saved.iter()) {
            rec.set_value(*i, v.clone());
        }
    }

    pub fn save(&mut self, rec: &RecordBody) {
        for (i, v) in self.leave.iter().zip(self.saved.iter_mut()) {
            *v = rec.value(*i).clone();
        }
    }
}
