//! Line sources for the command harness.

use std::io::BufRead;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::Result;

/// Produces one command line at a time.
pub trait LineReader {
    /// Next line without its terminator, or `None` once input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads lines from a pipe, a file, or an in-memory string.
///
/// The prompt is not written: nobody is watching the input side. Bytes that
/// are not UTF-8 are replaced, so a bad line fails as a command instead of
/// ending the input.
pub struct StreamReader<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> StreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineReader for StreamReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

/// The parts of a line editor the harness uses.
pub trait LineEditor {
    fn readline(&mut self, prompt: &str) -> rustyline::Result<String>;
    fn add_history_entry(&mut self, line: &str);
}

impl LineEditor for DefaultEditor {
    fn readline(&mut self, prompt: &str) -> rustyline::Result<String> {
        DefaultEditor::readline(self, prompt)
    }

    fn add_history_entry(&mut self, line: &str) {
        let _ = DefaultEditor::add_history_entry(self, line);
    }
}

/// Terminal line editor with in-memory history.
///
/// Ctrl-C and Ctrl-D end input like end-of-file does.
pub struct EditorReader<E = DefaultEditor> {
    editor: E,
}

impl EditorReader<DefaultEditor> {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl<E: LineEditor> EditorReader<E> {
    pub fn with_editor(editor: E) -> Self {
        Self { editor }
    }
}

impl<E: LineEditor> LineReader for EditorReader<E> {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
