//! Line-by-line reader for image pull progress

use crate::Result;
use futures_util::TryStreamExt;
use std::io;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::io::StreamReader;

/// Progress output of an image pull
///
/// The Docker API answers `images/create` with newline-delimited JSON events.
/// Lines are handed out as they arrive, unparsed, until the response ends.
pub struct PullProgress {
    lines: Lines<Pin<Box<dyn AsyncBufRead + Send>>>,
}

impl PullProgress {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let reader: Pin<Box<dyn AsyncBufRead + Send>> = Box::pin(StreamReader::new(body));

        Self {
            lines: reader.lines(),
        }
    }

    /// Next progress line, or `None` once the server closed the stream
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Drain the stream, handing every line to `sink`. Returns the line count.
    pub async fn forward(mut self, mut sink: impl FnMut(&str)) -> Result<usize> {
        let mut count = 0;
        while let Some(line) = self.next_line().await? {
            sink(&line);
            count += 1;
        }
        Ok(count)
    }
}
