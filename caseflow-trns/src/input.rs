// INPUT PROGRAM: a row source whose records are made by running a chain
// over a fresh record and handing it out whenever the chain reaches END
// CASE.

use crate::{CaseInit, Chain, ChainRunner, Pass};
use caseflow_data::{CaseNumber, Record, RowProvider, RowSource};
use caseflow_base::Taint;
use tracing::debug;

struct InputProgram {
    runner: ChainRunner,
    init: CaseInit,
    // 1-based number of the case being built.
    case_nr: CaseNumber,
    eof: bool,
}

impl RowProvider for InputProgram {
    fn read(&mut self, taint: &Taint) -> Option<Record> {
        if self.eof || self.runner.chain().is_empty() {
            self.eof = true;
            return None;
        }
        let mut rec = self.init.fresh();
        loop {
            match self.runner.pass(&mut rec, self.case_nr) {
                Pass::Yielded => {
                    self.case_nr += 1;
                    self.init.save(&rec);
                    return Some(rec.freeze());
                }
                Pass::Finished => {
                    // Wrapped past the last entry: start the chain again on
                    // a new record.
                    self.init.save(&rec);
                    rec = self.init.fresh();
                }
                Pass::Dropped => rec = self.init.fresh(),
                Pass::EndFile => {
                    debug!(target: "caseflow", cases = self.case_nr - 1, "input program finished");
                    self.eof = true;
                    return None;
                }
                Pass::Error => {
                    debug!(target: "caseflow", case = self.case_nr, "input program failed");
                    taint.set();
                    self.eof = true;
                    return None;
                }
            }
        }
    }
}

/// A source driven by `chain`. The chain should end each case with END
/// CASE and stop with END FILE or by exhausting a data source; a chain
/// that does neither never stops. An empty chain yields nothing.
pub fn input_program(chain: Chain, init: CaseInit) -> RowSource {
    let proto = init.proto().clone();
    RowSource::new(
        &proto,
        Box::new(InputProgram {
            runner: ChainRunner::new(chain),
            init,
            case_nr: 1,
            eof: false,
        }),
    )
}
