use crate::domain::model::Frame;
use crate::domain::ports::{FrameSource, PayloadDecoder};
use crate::utils::error::{PointsError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};

pub const STDIN_SOURCE: &str = "stdin";

/// Longest accepted line, excluding the line terminator.
pub const MAX_FRAME_BYTES: usize = 4096;

/// A line-oriented scanner: keyboard-wedge and serial barcode readers emit one
/// line per code, and piped input works the same way.
///
/// Lines longer than the frame limit are discarded up to their newline.
pub struct LineScanner<R> {
    reader: R,
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            max_frame_bytes: MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }

    /// Consumes input up to and including the next newline. Returns the
    /// number of bytes skipped.
    async fn skip_line(&mut self) -> Result<usize> {
        let mut skipped = 0;
        loop {
            let chunk = self.reader.fill_buf().await?;
            if chunk.is_empty() {
                return Ok(skipped);
            }
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.reader.consume(end + 1);
                    return Ok(skipped + end + 1);
                }
                None => {
                    let len = chunk.len();
                    self.reader.consume(len);
                    skipped += len;
                }
            }
        }
    }
}

pub type BoxedScanner = LineScanner<Box<dyn AsyncBufRead + Unpin + Send>>;

/// Opens `stdin` or a file/device path. A path that cannot be opened is a
/// [`PointsError::CaptureUnavailable`].
pub async fn open_scanner(source: &str) -> Result<BoxedScanner> {
    if source == STDIN_SOURCE {
        tracing::info!("📷 Reading scans from stdin");
        let reader: Box<dyn AsyncBufRead + Unpin + Send> =
            Box::new(BufReader::new(tokio::io::stdin()));
        return Ok(LineScanner::new(reader));
    }

    let file = tokio::fs::File::open(Path::new(source))
        .await
        .map_err(|e| PointsError::CaptureUnavailable {
            message: format!("{}: {}", source, e),
        })?;
    tracing::info!("📷 Reading scans from {}", source);
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(BufReader::new(file));
    Ok(LineScanner::new(reader))
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for LineScanner<R> {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        // Room for the content plus "\r\n".
        let limit = self.max_frame_bytes as u64 + 2;
        loop {
            self.buffer.clear();
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buffer)
                .await?;
            if read == 0 {
                return Ok(None);
            }

            let mut skipped = 0;
            if read as u64 == limit && self.buffer.last() != Some(&b'\n') {
                skipped = self.skip_line().await?;
            }
            while matches!(self.buffer.last(), Some(b'\n' | b'\r')) {
                self.buffer.pop();
            }

            if self.buffer.len() > self.max_frame_bytes {
                tracing::warn!(
                    "⚠️ Dropping {}-byte line over the {}-byte frame limit",
                    self.buffer.len() + skipped,
                    self.max_frame_bytes
                );
                continue;
            }
            return Ok(Some(Frame::new(self.buffer.as_slice())));
        }
    }
}

/// Treats each frame as one UTF-8 payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDecoder;

impl PayloadDecoder for TextDecoder {
    fn decode(&self, frame: &Frame) -> Vec<String> {
        match std::str::from_utf8(&frame.bytes) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => vec![text.to_string()],
            Err(e) => {
                tracing::warn!("⚠️ Dropping frame that is not valid UTF-8: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_lines_become_frames() {
        let input: &[u8] = b"{\"userId\":\"U1\"}\r\nsecond\n\nlast";
        let mut scanner = LineScanner::new(input);

        let mut frames = Vec::new();
        while let Some(frame) = scanner.next_frame().await.unwrap() {
            frames.push(frame);
        }

        assert_eq!(
            frames,
            vec![
                Frame::new(&b"{\"userId\":\"U1\"}"[..]),
                Frame::new(&b"second"[..]),
                Frame::new(&b""[..]),
                Frame::new(&b"last"[..]),
            ]
        );
    }

    #[tokio::test]
    async fn test_payload_split_across_reads_is_one_frame() {
        let device = tokio_test::io::Builder::new()
            .read(b"{\"userId\":")
            .read(b"\"U1\"}\n")
            .build();
        let mut scanner = LineScanner::new(tokio::io::BufReader::new(device));

        let frame = scanner.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.bytes, b"{\"userId\":\"U1\"}");
        assert!(scanner.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_line_is_dropped() {
        let input: &[u8] = b"12345678\r\n123456789012345678901234\nshort\n";
        let mut scanner = LineScanner::new(input).with_max_frame_bytes(8);

        let first = scanner.next_frame().await.unwrap().unwrap();
        assert_eq!(first.bytes, b"12345678");
        let next = scanner.next_frame().await.unwrap().unwrap();
        assert_eq!(next.bytes, b"short");
        assert!(scanner.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_endless_line_does_not_grow_the_buffer() {
        let device = tokio_test::io::Builder::new()
            .read(&[b'x'; 64])
            .read(&[b'x'; 64])
            .read(b"x\nok\n")
            .build();
        let mut scanner =
            LineScanner::new(tokio::io::BufReader::new(device)).with_max_frame_bytes(16);

        let frame = scanner.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.bytes, b"ok");
        assert!(scanner.buffer.capacity() < 64);
    }

    #[tokio::test]
    async fn test_open_scanner_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ORD-PAYLOAD").unwrap();

        let mut scanner = open_scanner(file.path().to_str().unwrap()).await.unwrap();
        let frame = scanner.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.bytes, b"ORD-PAYLOAD");
        assert!(scanner.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_missing_device_is_capture_unavailable() {
        let err = open_scanner("/nonexistent/scanner0").await.err().unwrap();
        assert!(matches!(err, PointsError::CaptureUnavailable { .. }));
    }

    #[test]
    fn test_decoder_skips_blank_and_invalid_frames() {
        let decoder = TextDecoder;
        assert_eq!(decoder.decode(&Frame::new("  ")), Vec::<String>::new());
        assert_eq!(decoder.decode(&Frame::new(vec![0xff, 0xfe])), Vec::<String>::new());
        assert_eq!(decoder.decode(&Frame::new("abc")), vec!["abc".to_string()]);
    }
}
