// A RowSink accepts records of one prototype and, once sealed, turns into a
// RowSource replaying them in write order. Sealing consumes the sink; a
// sink dropped unsealed discards what it held, temp files included.

use crate::{
    ioutil::{FileWriter, MemWriter, Writer},
    Proto, Record, RowSource,
};
use caseflow_base::{Settings, Taint, TempFileProvider};
use std::{fmt, rc::Rc};
use tracing::{debug, warn};

pub trait SinkProvider {
    /// Stores a record. A fault sets `taint`.
    fn write(&mut self, rec: Record, taint: &Taint);

    /// Finishes writing. The returned source's taint must follow `taint`.
    fn into_source(self: Box<Self>, proto: &Proto, taint: &Taint) -> RowSource;
}

pub struct RowSink {
    proto: Proto,
    taint: Taint,
    provider: Box<dyn SinkProvider>,
}

impl fmt::Debug for RowSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowSink")
            .field("proto", &self.proto)
            .field("taint", &self.taint)
            .finish()
    }
}

impl RowSink {
    pub fn new(proto: &Proto, provider: Box<dyn SinkProvider>) -> Self {
        RowSink {
            proto: proto.clone(),
            taint: Taint::new(),
            provider,
        }
    }

    pub fn memory(proto: &Proto) -> Self {
        Self::new(proto, Box::new(WriterSink(MemWriter::new())))
    }

    /// A sink that writes straight to a temporary file.
    pub fn tmpfile(proto: &Proto, settings: &Settings) -> Self {
        match FileWriter::create(proto, &*settings.temp_files) {
            Ok(w) => Self::new(proto, Box::new(WriterSink(w))),
            Err(e) => {
                warn!(target: "caseflow", "can't create spill file: {}", e);
                let sink = Self::memory(proto);
                sink.taint.set();
                sink
            }
        }
    }

    /// A sink that stays in memory until it holds more records than fit in
    /// the workspace, then moves everything to a temporary file.
    pub fn autopaging(proto: &Proto, settings: &Settings) -> Self {
        let limit = settings.workspace_records(proto.cost()) as u64;
        Self::new(
            proto,
            Box::new(AutoPaging {
                proto: proto.clone(),
                limit,
                temp_files: settings.temp_files.clone(),
                mem: MemWriter::new(),
                file: None,
            }),
        )
    }

    pub fn proto(&self) -> &Proto {
        &self.proto
    }

    pub fn taint(&self) -> &Taint {
        &self.taint
    }

    pub fn error(&self) -> bool {
        self.taint.is_tainted()
    }

    pub fn force_error(&mut self) {
        self.taint.set();
    }

    /// Appends a record. Its shape must match the sink's prototype.
    pub fn write(&mut self, rec: Record) {
        assert_eq!(
            rec.proto().widths(),
            self.proto.widths(),
            "record does not match sink prototype"
        );
        self.provider.write(rec, &self.taint);
    }

    /// Finishes the sink and returns a source over what was written.
    pub fn seal(self) -> RowSource {
        let RowSink {
            proto,
            taint,
            provider,
        } = self;
        provider.into_source(&proto, &taint)
    }

    /// Drops the sink and everything written to it, returning false if it
    /// was tainted.
    pub fn destroy(self) -> bool {
        !self.taint.is_tainted()
    }
}

struct WriterSink<W: Writer>(W);

impl<W: Writer + 'static> SinkProvider for WriterSink<W> {
    fn write(&mut self, rec: Record, taint: &Taint) {
        if let Err(e) = self.0.write_record(&rec) {
            warn!(target: "caseflow", "write failed: {}", e);
            taint.set();
        }
    }

    fn into_source(self: Box<Self>, proto: &Proto, taint: &Taint) -> RowSource {
        let out = Taint::new();
        taint.propagate(&out);
        match self.0.try_into_reader() {
            Ok(r) => RowSource::from_reader(proto, out, r),
            Err(e) => {
                warn!(target: "caseflow", "can't reopen written records: {}", e);
                out.set();
                RowSource::empty_with_taint(proto, out)
            }
        }
    }
}

struct AutoPaging {
    proto: Proto,
    limit: u64,
    temp_files: Rc<dyn TempFileProvider>,
    mem: MemWriter,
    file: Option<FileWriter>,
}

impl AutoPaging {
    fn page_out(&mut self, taint: &Taint) {
        debug!(target: "caseflow", records = self.mem.len(), "sink paging to disk");
        match FileWriter::create(&self.proto, &*self.temp_files) {
            Ok(mut w) => {
                for rec in self.mem.drain() {
                    if let Err(e) = w.write_record(&rec) {
                        warn!(target: "caseflow", "write failed: {}", e);
                        taint.set();
                        break;
                    }
                }
                self.file = Some(w);
            }
            Err(e) => {
                // Keep going in memory; the data is intact, only the budget
                // is exceeded.
                warn!(target: "caseflow", "can't page to disk: {}", e);
                self.limit = u64::MAX;
            }
        }
    }
}

impl SinkProvider for AutoPaging {
    fn write(&mut self, rec: Record, taint: &Taint) {
        if self.file.is_none() && self.mem.len() >= self.limit {
            self.page_out(taint);
        }
        let res = match &mut self.file {
            Some(w) => w.write_record(&rec),
            None => self.mem.write_record(&rec),
        };
        if let Err(e) = res {
            warn!(target: "caseflow", "write failed: {}", e);
            taint.set();
        }
    }

    fn into_source(self: Box<Self>, proto: &Proto, taint: &Taint) -> RowSource {
        let this = *self;
        match this.file {
            Some(w) => Box::new(WriterSink(w)).into_source(proto, taint),
            None => Box::new(WriterSink(this.mem)).into_source(proto, taint),
        }
    }
}
