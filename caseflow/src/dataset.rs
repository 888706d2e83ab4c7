// The active dataset and the procedure cycle.
//
// Transformations accumulate in the permanent chain, or in the temporary
// chain after TEMPORARY. Nothing runs until a procedure opens the dataset:
// the reader it gets pulls each record from the active source, runs the
// permanent chain, writes the result to a replacement sink, runs the
// temporary chain and hands the record over. Committing installs the
// replacement as the new active source and throws both chains away.

use caseflow_base::{Diagnostic, Diagnostics, Settings, Taint};
use caseflow_data::{
    filter_weight, sort, Dictionary, Grouper, KeySpec, Proto, Record, RowProvider, RowSink,
    RowSource,
};
use caseflow_trns::{CaseInit, CaseLimit, Chain, FilterBy, Outcome, Transformation};
use std::{cell::RefCell, collections::VecDeque, rc::Rc};
use tracing::debug;

/// Records already passed through the permanent chain, newest first. Clones
/// share the queue, so a transformation can hold one and look back while
/// the procedure runs.
#[derive(Clone, Debug, Default)]
pub struct Lag(Rc<RefCell<VecDeque<Record>>>);

impl Lag {
    /// The record `n` before the current one, if there was one.
    pub fn get(&self, n: usize) -> Option<Record> {
        if n == 0 {
            return None;
        }
        self.0.borrow().get(n - 1).cloned()
    }

    fn push(&self, rec: Record, depth: usize) {
        let mut q = self.0.borrow_mut();
        q.push_front(rec);
        q.truncate(depth);
    }

    fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

struct ProcRun {
    source: RowSource,
    proto: Proto,
    init: CaseInit,
    permanent: Chain,
    temporary: Option<Chain>,
    sink: Option<RowSink>,
    lag: Lag,
    n_lag: usize,
    cases_written: u64,
    // The reader's own taint, set when a transformation fails.
    taint: Taint,
    ok: bool,
    done: bool,
}

impl ProcRun {
    fn next(&mut self) -> Option<Record> {
        while !self.done {
            let Some(rec) = self.source.read() else {
                self.done = true;
                break;
            };
            let mut rec = rec.unshare_and_resize(&self.proto);
            self.init.restore(&mut rec);

            let case_nr = self.cases_written + 1;
            let outcome = self.permanent.execute(&mut rec, case_nr);
            self.init.save(&rec);
            if !self.proceed(outcome) {
                continue;
            }

            let rec = rec.freeze();
            if self.n_lag > 0 {
                self.lag.push(rec.clone(), self.n_lag);
            }
            self.cases_written += 1;
            if let Some(sink) = self.sink.as_mut() {
                sink.write(rec.clone());
            }

            let Some(temporary) = self.temporary.as_mut() else {
                return Some(rec);
            };
            let mut rec = rec.unshare();
            let outcome = temporary.execute(&mut rec, self.cases_written);
            if self.proceed(outcome) {
                return Some(rec.freeze());
            }
        }
        None
    }

    // Whether the record survives a chain that ended with `outcome`.
    fn proceed(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::Continue | Outcome::Break => true,
            Outcome::DropCase => false,
            Outcome::EndFile => {
                self.done = true;
                false
            }
            Outcome::Error => {
                debug!(target: "caseflow", case = self.cases_written + 1, "transformation failed");
                self.ok = false;
                self.done = true;
                self.taint.set();
                false
            }
            Outcome::EndCase => panic!("END CASE is only valid inside an input program"),
        }
    }
}

struct ProcReader(Rc<RefCell<ProcRun>>);

impl RowProvider for ProcReader {
    fn read(&mut self, _taint: &Taint) -> Option<Record> {
        self.0.borrow_mut().next()
    }
}

impl Drop for ProcReader {
    // The replacement sink has to see every record, read or not.
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let mut run = self.0.borrow_mut();
        let mut drained = 0;
        while run.next().is_some() {
            drained += 1;
        }
        if drained > 0 {
            debug!(target: "caseflow", drained, "procedure reader drained");
        }
    }
}

pub struct Dataset {
    dict: Dictionary,
    source: RowSource,
    permanent: Chain,
    temporary: Option<Chain>,
    n_lag: usize,
    lag: Lag,
    discard_output: bool,
    settings: Settings,
    diags: Diagnostics,
    proc: Option<Rc<RefCell<ProcRun>>>,
}

impl Dataset {
    /// An empty dataset with no variables and no records.
    pub fn new(settings: Settings, diags: Diagnostics) -> Self {
        Dataset {
            dict: Dictionary::new(),
            source: RowSource::empty(&Proto::empty()),
            permanent: Chain::new(),
            temporary: None,
            n_lag: 0,
            lag: Lag::default(),
            discard_output: false,
            settings,
            diags,
            proc: None,
        }
    }

    fn assert_idle(&self) {
        assert!(self.proc.is_none(), "a procedure is open on this dataset");
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    pub fn dict_mut(&mut self) -> &mut Dictionary {
        self.assert_idle();
        &mut self.dict
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    pub fn source_mut(&mut self) -> &mut RowSource {
        self.assert_idle();
        &mut self.source
    }

    /// Replaces the active source. Returns false if the new one is already
    /// tainted.
    pub fn set_source(&mut self, source: RowSource) -> bool {
        self.assert_idle();
        self.source = source;
        !self.source.error()
    }

    /// Drops the dictionary, the data and every pending transformation.
    pub fn clear(&mut self) {
        self.assert_idle();
        self.cancel_transformations();
        self.dict = Dictionary::new();
        self.source = RowSource::empty(&Proto::empty());
        self.n_lag = 0;
        self.lag.clear();
    }

    pub fn add_transformation(&mut self, t: impl Transformation + 'static) {
        self.current_chain().push(Box::new(t));
    }

    /// Appends an already-built chain, such as one from a `ChainBuilder`.
    pub fn add_chain(&mut self, chain: Chain) {
        self.current_chain().splice(chain);
    }

    fn current_chain(&mut self) -> &mut Chain {
        self.assert_idle();
        match self.temporary.as_mut() {
            Some(t) => t,
            None => &mut self.permanent,
        }
    }

    /// True if there are transformations waiting for a procedure.
    pub fn has_transformations(&self) -> bool {
        !self.permanent.is_empty() || self.temporary.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// TEMPORARY: transformations added from now on last for one procedure.
    /// The case limit in force when TEMPORARY starts stays permanent.
    pub fn set_temporary(&mut self) {
        self.assert_idle();
        if self.temporary.is_none() {
            self.add_case_limit();
            self.temporary = Some(Chain::new());
        }
    }

    fn add_case_limit(&mut self) {
        if let Some(n) = self.dict.case_limit() {
            self.current_chain().push(Box::new(CaseLimit::new(n)));
            self.dict.set_case_limit(None);
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    pub fn make_temporary_permanent(&mut self) {
        self.assert_idle();
        if let Some(t) = self.temporary.take() {
            self.permanent.splice(t);
        }
    }

    pub fn cancel_temporary(&mut self) -> bool {
        match self.temporary.take() {
            Some(mut t) => t.clear(),
            None => true,
        }
    }

    pub fn cancel_transformations(&mut self) -> bool {
        let ok = self.cancel_temporary();
        self.permanent.clear() && ok
    }

    /// Keeps at least `n` previous records for `lagged`.
    pub fn need_lag(&mut self, n: usize) {
        self.n_lag = self.n_lag.max(n);
    }

    /// A handle on the lag queue for transformations that look back.
    pub fn lag(&self) -> Lag {
        self.lag.clone()
    }

    /// The record `n` before the current one in the open procedure.
    pub fn lagged(&self, n: usize) -> Option<Record> {
        self.lag.get(n)
    }

    /// The next procedure won't replace the active source; the caller
    /// installs one itself after committing.
    pub fn discard_output(&mut self) {
        self.discard_output = true;
    }

    /// Opens a procedure with the filter variable honored.
    pub fn open(&mut self) -> RowSource {
        self.open_filtering(true)
    }

    /// Opens a procedure. Only one may be open at a time, and it must be
    /// committed before anything else is done to the dataset.
    pub fn open_filtering(&mut self, filter: bool) -> RowSource {
        self.assert_idle();

        self.add_case_limit();
        if filter {
            if let Some(f) = self.dict.filter() {
                let missing = self.dict.var(f).missing.clone();
                self.set_temporary();
                self.current_chain().push(Box::new(FilterBy::new(f, missing)));
            }
        }

        let proto = self.dict.proto();
        let source = std::mem::replace(&mut self.source, RowSource::empty(&proto));
        let taint = Taint::new();
        source.taint().propagate(&taint);
        let sink = if std::mem::take(&mut self.discard_output) {
            None
        } else {
            let sink = RowSink::autopaging(&proto, &self.settings);
            source.taint().propagate(sink.taint());
            Some(sink)
        };
        self.lag.clear();
        debug!(
            target: "caseflow",
            permanent = self.permanent.len(),
            temporary = self.temporary.as_ref().map(|t| t.len()),
            "procedure opened"
        );

        let run = Rc::new(RefCell::new(ProcRun {
            source,
            proto: proto.clone(),
            init: CaseInit::for_dict(&self.dict),
            permanent: std::mem::take(&mut self.permanent),
            temporary: self.temporary.take(),
            sink,
            lag: self.lag.clone(),
            n_lag: self.n_lag,
            cases_written: 0,
            taint: taint.clone(),
            ok: true,
            done: false,
        }));
        self.proc = Some(run.clone());
        RowSource::with_taint(&proto, taint, Box::new(ProcReader(run)))
    }

    /// Finishes the open procedure. The reader must already be gone. The
    /// replacement data becomes the active source, both chains are
    /// discarded, and the result is false if reading, a transformation or
    /// writing failed.
    pub fn commit(&mut self) -> bool {
        let Some(run) = self.proc.take() else {
            panic!("commit without an open procedure");
        };
        let run = match Rc::try_unwrap(run) {
            Ok(run) => run.into_inner(),
            Err(_) => panic!("commit while the procedure reader is still open"),
        };
        let ProcRun {
            source,
            mut permanent,
            temporary,
            sink,
            cases_written,
            ok,
            ..
        } = run;

        let mut ok = ok;
        ok = source.destroy() && ok;
        ok = permanent.clear() && ok;
        if let Some(mut t) = temporary {
            ok = t.clear() && ok;
        }
        self.lag.clear();
        self.source = match sink {
            Some(sink) => {
                ok = !sink.error() && ok;
                sink.seal()
            }
            None => RowSource::empty(&self.dict.proto()),
        };
        debug!(target: "caseflow", cases_written, ok, "procedure committed");
        ok
    }

    /// Runs pending transformations with no procedure consuming the data.
    pub fn execute(&mut self) -> bool {
        drop(self.open());
        self.commit()
    }

    /// SORT CASES. Filtered-out records are sorted too.
    pub fn sort_cases(&mut self, key: &KeySpec) -> bool {
        self.discard_output();
        let reader = self.open_filtering(false);
        let sorted = sort(reader, key, &self.settings);
        let ok = self.commit();
        self.set_source(sorted) && ok
    }

    /// Groups a procedure's records by the split variables. With none set
    /// the whole input is one group.
    pub fn split_groups(&self, reader: RowSource) -> Grouper {
        Grouper::by_vars(reader, self.dict.split())
    }

    /// Drops records with an unusable weight, warning once, when a weight
    /// variable is set.
    pub fn weight_filtered(&self, reader: RowSource) -> RowSource {
        filter_weight(reader, &self.dict, None, &self.diags, None)
    }

    /// Called between commands. A tainted active source can't be trusted,
    /// so the dataset is cleared and false returned.
    pub fn end_of_command(&mut self) -> bool {
        self.assert_idle();
        if self.source.error() {
            self.diags.emit(Diagnostic::error(
                "the active dataset was discarded after an error reading it",
            ));
            self.clear();
            return false;
        }
        self.source.taint().reset_successor_taint();
        true
    }
}
