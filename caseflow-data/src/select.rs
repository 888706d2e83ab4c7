use crate::{CaseNumber, Record, RowProvider, RowSource};
use caseflow_base::Taint;

struct Select {
    upstream: RowSource,
    // Upstream position of the next record.
    pos: CaseNumber,
    start: CaseNumber,
    stop: Option<CaseNumber>,
    step: CaseNumber,
}

impl Select {
    fn next_pos(&self) -> CaseNumber {
        if self.pos <= self.start {
            self.start
        } else {
            let over = (self.pos - self.start) % self.step;
            if over == 0 {
                self.pos
            } else {
                self.pos + (self.step - over)
            }
        }
    }
}

impl RowProvider for Select {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        let want = self.next_pos();
        if self.stop.is_some_and(|stop| want >= stop) {
            return None;
        }
        let gap = want - self.pos;
        if self.upstream.advance(gap) < gap {
            return None;
        }
        self.pos = want;
        let rec = self.upstream.read()?;
        self.pos += 1;
        Some(rec)
    }

    fn fork(&mut self, _taint: &Taint) -> Option<Box<dyn RowProvider>> {
        Some(Box::new(Select {
            upstream: self.upstream.fork(),
            pos: self.pos,
            start: self.start,
            stop: self.stop,
            step: self.step,
        }))
    }
}

/// The records at upstream positions `start`, `start + step`, ... below
/// `stop`.
pub fn select(
    source: RowSource,
    start: CaseNumber,
    stop: Option<CaseNumber>,
    step: CaseNumber,
) -> RowSource {
    assert!(step > 0, "select step must be positive");
    let proto = source.proto().clone();
    let taint = source.taint().clone();
    RowSource::derived(
        &proto,
        &taint,
        Box::new(Select {
            upstream: source,
            pos: 0,
            start,
            stop,
            step,
        }),
    )
}
