// Assembles chains from a flat sequence of commands, the way a command
// parser sees them: DO IF ... ELSE IF ... END IF, LOOP ... END LOOP, INPUT
// PROGRAM ... END INPUT PROGRAM. The nesting context lives here rather than
// in process-wide flags, so independent builders never see each other.

use crate::{
    Break, Chain, Clause, DoIf, EndCase, EndFile, Expr, IndexClause, Loop, ReadFrom,
    Transformation,
};
use caseflow_base::{err, Diagnostics, Result, Settings};
use caseflow_data::RowSource;
use tracing::trace;

enum Frame {
    DoIf {
        done: Vec<Clause>,
        cond: Option<Expr>,
        body: Chain,
        seen_else: bool,
    },
    Loop {
        index: Option<IndexClause>,
        loop_if: Option<Expr>,
        body: Chain,
    },
    Input {
        body: Chain,
        seen_end_case: bool,
        seen_end_file: bool,
        seen_source: bool,
    },
}

impl Frame {
    fn body(&mut self) -> &mut Chain {
        match self {
            Frame::DoIf { body, .. } | Frame::Loop { body, .. } | Frame::Input { body, .. } => body,
        }
    }

    fn command(&self) -> &'static str {
        match self {
            Frame::DoIf { .. } => "DO IF",
            Frame::Loop { .. } => "LOOP",
            Frame::Input { .. } => "INPUT PROGRAM",
        }
    }
}

pub struct ChainBuilder {
    top: Chain,
    stack: Vec<Frame>,
    mxloops: u64,
}

impl ChainBuilder {
    pub fn new(settings: &Settings) -> Self {
        ChainBuilder {
            top: Chain::new(),
            stack: Vec::new(),
            mxloops: settings.mxloops,
        }
    }

    fn current(&mut self) -> &mut Chain {
        match self.stack.last_mut() {
            Some(f) => f.body(),
            None => &mut self.top,
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn in_loop(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Loop { .. }))
    }

    pub fn in_input_program(&self) -> bool {
        self.stack.iter().any(|f| matches!(f, Frame::Input { .. }))
    }

    pub fn add(&mut self, t: impl Transformation + 'static) {
        self.current().push(Box::new(t));
    }

    pub fn add_boxed(&mut self, t: Box<dyn Transformation>) {
        self.current().push(t);
    }

    pub fn do_if(&mut self, cond: Expr) {
        self.stack.push(Frame::DoIf {
            done: Vec::new(),
            cond: Some(cond),
            body: Chain::new(),
            seen_else: false,
        });
    }

    fn next_clause(&mut self, what: &str, next: Option<Expr>) -> Result<()> {
        let Some(Frame::DoIf {
            done,
            cond,
            body,
            seen_else,
        }) = self.stack.last_mut()
        else {
            return Err(err(format!("{what} without DO IF")));
        };
        if *seen_else {
            return Err(err(format!("{what} follows ELSE")));
        }
        *seen_else = next.is_none();
        done.push(Clause {
            condition: std::mem::replace(cond, next),
            body: std::mem::take(body),
        });
        Ok(())
    }

    pub fn else_if(&mut self, cond: Expr) -> Result<()> {
        self.next_clause("ELSE IF", Some(cond))
    }

    pub fn else_(&mut self) -> Result<()> {
        self.next_clause("ELSE", None)
    }

    pub fn end_if(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::DoIf {
                mut done,
                cond,
                body,
                ..
            }) => {
                done.push(Clause {
                    condition: cond,
                    body,
                });
                trace!(target: "caseflow", clauses = done.len(), "DO IF closed");
                self.add(DoIf::new(done));
                Ok(())
            }
            Some(other) => {
                let what = other.command();
                self.stack.push(other);
                Err(err(format!("END IF inside unclosed {what}")))
            }
            None => Err(err("END IF without DO IF")),
        }
    }

    pub fn loop_(&mut self, index: Option<IndexClause>, loop_if: Option<Expr>) {
        self.stack.push(Frame::Loop {
            index,
            loop_if,
            body: Chain::new(),
        });
    }

    pub fn end_loop(&mut self, end_if: Option<Expr>) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Loop {
                index,
                loop_if,
                body,
            }) => {
                let mxloops = self.mxloops;
                self.add(Loop::new(index, loop_if, end_if, body, mxloops));
                Ok(())
            }
            Some(other) => {
                let what = other.command();
                self.stack.push(other);
                Err(err(format!("END LOOP inside unclosed {what}")))
            }
            None => Err(err("END LOOP without LOOP")),
        }
    }

    pub fn brk(&mut self) -> Result<()> {
        if !self.in_loop() {
            return Err(err("BREAK is only allowed inside LOOP"));
        }
        self.add(Break);
        Ok(())
    }

    pub fn input_program(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(err("INPUT PROGRAM must not be nested"));
        }
        self.stack.push(Frame::Input {
            body: Chain::new(),
            seen_end_case: false,
            seen_end_file: false,
            seen_source: false,
        });
        Ok(())
    }

    fn input_frame(&mut self, what: &str) -> Result<&mut Frame> {
        match self.stack.first_mut() {
            Some(f @ Frame::Input { .. }) => Ok(f),
            _ => Err(err(format!("{what} is only allowed inside INPUT PROGRAM"))),
        }
    }

    pub fn end_case(&mut self) -> Result<()> {
        if let Frame::Input { seen_end_case, .. } = self.input_frame("END CASE")? {
            *seen_end_case = true;
        }
        self.add(EndCase);
        Ok(())
    }

    pub fn end_file(&mut self) -> Result<()> {
        if let Frame::Input { seen_end_file, .. } = self.input_frame("END FILE")? {
            *seen_end_file = true;
        }
        self.add(EndFile);
        Ok(())
    }

    /// Reads records from `source` into the case being built, copying each
    /// `(from, to)` field pair.
    pub fn data_source(
        &mut self,
        source: RowSource,
        fields: Vec<(usize, usize)>,
        diags: Diagnostics,
    ) -> Result<()> {
        if let Frame::Input { seen_source, .. } = self.input_frame("a data source")? {
            *seen_source = true;
        }
        self.add(ReadFrom::new(source, fields, diags));
        Ok(())
    }

    /// Closes the input program and returns its chain, ready for
    /// `input_program`.
    pub fn end_input_program(&mut self) -> Result<Chain> {
        match self.stack.pop() {
            Some(Frame::Input {
                mut body,
                seen_end_case,
                seen_end_file,
                seen_source,
            }) => {
                if !seen_end_file && !seen_source {
                    return Err(err(
                        "input program contains neither a data source nor END FILE",
                    ));
                }
                if !seen_end_case {
                    body.push(Box::new(EndCase));
                }
                Ok(body)
            }
            Some(other) => {
                let what = other.command();
                self.stack.push(other);
                Err(err(format!("END INPUT PROGRAM inside unclosed {what}")))
            }
            None => Err(err("END INPUT PROGRAM without INPUT PROGRAM")),
        }
    }

    /// The finished top-level chain. Fails if a block is still open.
    pub fn finish(mut self) -> Result<Chain> {
        if let Some(f) = self.stack.last() {
            return Err(err(format!("{} is not closed", f.command())));
        }
        Ok(std::mem::take(&mut self.top))
    }
}
