//! Streaming line reader
//!
//! Lazily yields raw record lines from a shard file, reading in small
//! fixed-size chunks rather than loading the whole file into memory.
//! The reader makes no assumption about line content — a malformed line
//! fails at the decode step, not here.

use std::collections::VecDeque;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Lazy, finite, non-restartable iterator over the trimmed, non-empty
/// lines of a file.
///
/// Lines split across chunk boundaries are reassembled: the trailing
/// partial fragment of each chunk is retained and prepended to the next.
/// A final line with no trailing newline is still yielded.
pub struct LineReader {
    file: File,
    chunk_size: usize,
    /// Bytes after the last newline seen so far (partial line)
    carry: Vec<u8>,
    /// Complete lines ready to be handed out
    pending: VecDeque<String>,
    eof: bool,
}

impl LineReader {
    /// Open a file for streaming line reads
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            file,
            chunk_size: chunk_size.max(1),
            carry: Vec::new(),
            pending: VecDeque::new(),
            eof: false,
        })
    }

    /// Read one more chunk and slice completed lines out of the carry
    fn fill(&mut self) -> std::io::Result<()> {
        let mut chunk = vec![0u8; self.chunk_size];
        let n = self.file.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            return Ok(());
        }
        self.carry.extend_from_slice(&chunk[..n]);

        // Everything up to the last newline is complete; the rest carries
        // over to the next chunk.
        if let Some(last_newline) = self.carry.iter().rposition(|&b| b == b'\n') {
            let rest = self.carry.split_off(last_newline + 1);
            let complete = std::mem::replace(&mut self.carry, rest);
            for raw in complete.split(|&b| b == b'\n') {
                Self::push_line(&mut self.pending, raw);
            }
        }
        Ok(())
    }

    fn push_line(pending: &mut VecDeque<String>, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            pending.push_back(trimmed.to_string());
        }
    }
}

impl Iterator for LineReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(Ok(line));
            }
            if self.eof {
                // Unterminated final line
                if self.carry.is_empty() {
                    return None;
                }
                let rest = std::mem::take(&mut self.carry);
                Self::push_line(&mut self.pending, &rest);
                continue;
            }
            if let Err(e) = self.fill() {
                self.eof = true;
                return Some(Err(e.into()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn collect_lines(path: &Path, chunk_size: usize) -> Vec<String> {
        LineReader::open(path, chunk_size)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data1.json");
        std::fs::write(&path, "first line\nsecond line\nthird\n").unwrap();

        // Chunk size far smaller than any line
        let lines = collect_lines(&path, 4);
        assert_eq!(lines, vec!["first line", "second line", "third"]);
    }

    #[test]
    fn test_final_line_without_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data1.json");
        std::fs::write(&path, "one\ntwo").unwrap();

        let lines = collect_lines(&path, 8);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data1.json");
        std::fs::write(&path, "a\n\n\nb\n   \nc\n").unwrap();

        let lines = collect_lines(&path, 16);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data1.json");
        std::fs::write(&path, "").unwrap();

        let mut reader = LineReader::open(&path, 32).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_large_file_streams_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data1.json");

        let mut file = std::fs::File::create(&path).unwrap();
        for i in 0..1000 {
            writeln!(file, "{{\"n\":{}}}", i).unwrap();
        }
        drop(file);

        let lines = collect_lines(&path, 64);
        assert_eq!(lines.len(), 1000);
        assert_eq!(lines[0], "{\"n\":0}");
        assert_eq!(lines[999], "{\"n\":999}");
    }
}
