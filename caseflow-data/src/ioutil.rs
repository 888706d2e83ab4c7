// Record-level storage underneath sinks and sources. A `Writer` appends
// records and turns into its paired `Reader`; readers can be cloned into
// independent cursors cheaply. Memory-backed pairs share one immutable
// slice, file-backed pairs share one temporary file and reopen it.

use crate::{Proto, Record, Value};
use caseflow_base::{err, Result, TempFileProvider};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Seek, SeekFrom, Write},
    rc::Rc,
};
use tempfile::NamedTempFile;
use tracing::trace;

pub trait Reader: Sized {
    /// The next record, `Ok(None)` at the end.
    fn read_record(&mut self) -> Result<Option<Record>>;
    fn try_clone_independent(&mut self) -> Result<Self>;
    /// Records left to read.
    fn remaining(&self) -> u64;
}

pub trait Writer: Sized {
    type PairedReader: Reader;
    fn write_record(&mut self, rec: &Record) -> Result<()>;
    fn len(&self) -> u64;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn try_into_reader(self) -> Result<Self::PairedReader>;
}

// MemReader

pub struct MemReader {
    recs: Rc<[Record]>,
    pos: usize,
}

impl MemReader {
    pub fn new(recs: Rc<[Record]>) -> Self {
        MemReader { recs, pos: 0 }
    }
}

impl From<Vec<Record>> for MemReader {
    fn from(vec: Vec<Record>) -> Self {
        Self::new(Rc::from(vec))
    }
}

impl Reader for MemReader {
    fn read_record(&mut self) -> Result<Option<Record>> {
        let rec = self.recs.get(self.pos).cloned();
        if rec.is_some() {
            self.pos += 1;
        }
        Ok(rec)
    }

    fn try_clone_independent(&mut self) -> Result<Self> {
        Ok(MemReader {
            recs: self.recs.clone(),
            pos: self.pos,
        })
    }

    fn remaining(&self) -> u64 {
        (self.recs.len() - self.pos) as u64
    }
}

// MemWriter

#[derive(Default)]
pub struct MemWriter {
    recs: Vec<Record>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Record> {
        self.recs.drain(..)
    }
}

impl Writer for MemWriter {
    type PairedReader = MemReader;

    fn write_record(&mut self, rec: &Record) -> Result<()> {
        self.recs.push(rec.clone());
        Ok(())
    }

    fn len(&self) -> u64 {
        self.recs.len() as u64
    }

    fn try_into_reader(self) -> Result<MemReader> {
        Ok(MemReader::from(self.recs))
    }
}

// FileReader

/// Reads back records a `FileWriter` spilled. Each record is one
/// MessagePack-encoded sequence of field values.
pub struct FileReader {
    proto: Proto,
    file: Rc<NamedTempFile>,
    input: BufReader<File>,
    remaining: u64,
}

impl Reader for FileReader {
    fn read_record(&mut self) -> Result<Option<Record>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let values: Vec<Value> = rmp_serde::decode::from_read(&mut self.input)?;
        if values.len() != self.proto.len()
            || values
                .iter()
                .zip(self.proto.widths())
                .any(|(v, w)| v.width() != *w)
        {
            return Err(err("spilled record does not match its prototype"));
        }
        self.remaining -= 1;
        Ok(Some(Record::from_values(&self.proto, values)))
    }

    fn try_clone_independent(&mut self) -> Result<Self> {
        let pos = self.input.stream_position()?;
        let mut file = self.file.reopen()?;
        file.seek(SeekFrom::Start(pos))?;
        Ok(FileReader {
            proto: self.proto.clone(),
            file: self.file.clone(),
            input: BufReader::new(file),
            remaining: self.remaining,
        })
    }

    fn remaining(&self) -> u64 {
        self.remaining
    }
}

// FileWriter

pub struct FileWriter {
    proto: Proto,
    file: NamedTempFile,
    output: BufWriter<File>,
    count: u64,
}

impl FileWriter {
    pub fn create(proto: &Proto, temp_files: &dyn TempFileProvider) -> Result<Self> {
        let file = temp_files.create()?;
        let output = BufWriter::new(file.as_file().try_clone()?);
        Ok(FileWriter {
            proto: proto.clone(),
            file,
            output,
            count: 0,
        })
    }
}

impl Writer for FileWriter {
    type PairedReader = FileReader;

    fn write_record(&mut self, rec: &Record) -> Result<()> {
        rmp_serde::encode::write(&mut self.output, rec.values())?;
        self.count += 1;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.count
    }

    fn try_into_reader(mut self) -> Result<FileReader> {
        self.output.flush()?;
        trace!(
            target: "caseflow",
            path = ?self.file.path(),
            records = self.count,
            "spill file sealed"
        );
        let mut input = self.file.reopen()?;
        input.seek(SeekFrom::Start(0))?;
        Ok(FileReader {
            proto: self.proto,
            file: Rc::new(self.file),
            input: BufReader::new(input),
            remaining: self.count,
        })
    }
}
