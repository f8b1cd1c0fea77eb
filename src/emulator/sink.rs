use std::io::Write;

/// Receives every line printed by SAY and SHOW.
pub trait Sink {
    fn emit(&mut self, line: &str) -> std::io::Result<()>;
}

/// Collects output in memory.
impl Sink for Vec<String> {
    fn emit(&mut self, line: &str) -> std::io::Result<()> {
        self.push(line.into());
        Ok(())
    }
}

/// Writes each line, followed by a newline, to the wrapped writer.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> WriterSink<W> {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }
}
