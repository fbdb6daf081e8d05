//! Requester workers: one per input file, feeding hostnames into the queue.

use crate::error::LookupError;
use crate::queue::BoundedQueue;
use crate::types::WorkItem;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// What a requester reports back to the coordinator when it finishes.
#[derive(Debug)]
pub(crate) struct RequesterOutcome {
    pub index: usize,
    pub path: PathBuf,
    pub enqueued: u64,
    pub error: Option<LookupError>,
}

impl RequesterOutcome {
    pub(crate) fn new(index: usize, path: &Path) -> Self {
        Self {
            index,
            path: path.to_path_buf(),
            enqueued: 0,
            error: None,
        }
    }
}

/// Read every hostname from the file at `path` into `queue`.
///
/// A file that cannot be opened, or fails partway through, ends this worker
/// only. Hostnames enqueued before a read error stay in the queue.
pub(crate) fn run(queue: &BoundedQueue<WorkItem>, index: usize, path: &Path) -> RequesterOutcome {
    let mut outcome = RequesterOutcome::new(index, path);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "error opening input file, skipping it");
            outcome.error = Some(LookupError::input_file(path.to_string_lossy(), e.to_string()));
            return outcome;
        }
    };

    tracing::debug!(path = %path.display(), index, "requester started");
    read_from(queue, outcome, BufReader::new(file))
}

/// Drain an already opened input into `queue`, recording a read error in
/// the outcome instead of propagating it.
pub(crate) fn read_from<R: BufRead>(
    queue: &BoundedQueue<WorkItem>,
    mut outcome: RequesterOutcome,
    reader: R,
) -> RequesterOutcome {
    let path = outcome.path.clone();
    if let Err(e) = enqueue_tokens(reader, outcome.index, queue, &mut outcome.enqueued) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            enqueued = outcome.enqueued,
            "error reading input file, stopping early"
        );
        outcome.error = Some(LookupError::input_file(path.to_string_lossy(), e.to_string()));
    }

    tracing::debug!(path = %path.display(), enqueued = outcome.enqueued, "requester finished");
    outcome
}

/// Enqueue each whitespace-separated token of `reader`, in order.
///
/// Lines are decoded lossily so a stray invalid byte does not cost the
/// rest of the file.
pub(crate) fn enqueue_tokens<R: BufRead>(
    mut reader: R,
    index: usize,
    queue: &BoundedQueue<WorkItem>,
    enqueued: &mut u64,
) -> io::Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }

        for token in String::from_utf8_lossy(&line).split_whitespace() {
            queue.enqueue(WorkItem::new(token, index));
            *enqueued += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use tempfile::NamedTempFile;

    fn drain(queue: &BoundedQueue<WorkItem>) -> Vec<WorkItem> {
        queue.signal_shutdown();
        std::iter::from_fn(|| queue.dequeue()).collect()
    }

    #[test]
    fn test_tokens_across_lines_and_spaces() {
        let queue = BoundedQueue::new(16).unwrap();
        let input = "a.com  b.com\n\n\tc.com\r\nd.com";
        let mut count = 0;

        enqueue_tokens(Cursor::new(input), 3, &queue, &mut count).unwrap();

        assert_eq!(count, 4);
        let items = drain(&queue);
        let names: Vec<&str> = items.iter().map(|w| w.hostname.as_str()).collect();
        assert_eq!(names, ["a.com", "b.com", "c.com", "d.com"]);
        assert!(items.iter().all(|w| w.source_file_index == 3));
    }

    #[test]
    fn test_invalid_utf8_does_not_stop_reading() {
        let queue = BoundedQueue::new(16).unwrap();
        let input: &[u8] = b"good.com bad\xff.com\nlast.com\n";
        let mut count = 0;

        enqueue_tokens(Cursor::new(input), 0, &queue, &mut count).unwrap();

        assert_eq!(count, 3);
        let items = drain(&queue);
        assert_eq!(items[0].hostname, "good.com");
        assert_eq!(items[2].hostname, "last.com");
    }

    /// Reader that fails on every call
    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device went away"))
        }
    }

    #[test]
    fn test_read_error_keeps_enqueued_items() {
        let queue = BoundedQueue::new(8).unwrap();
        let reader = BufReader::new(Cursor::new("a.example b.example\nc.example\n").chain(Broken));
        let path = Path::new("flaky.txt");

        let outcome = read_from(&queue, RequesterOutcome::new(2, path), reader);

        assert_eq!(outcome.enqueued, 3);
        assert!(matches!(
            outcome.error,
            Some(LookupError::InputFile { ref path, .. }) if path == "flaky.txt"
        ));
        let names: Vec<String> = drain(&queue).into_iter().map(|w| w.hostname).collect();
        assert_eq!(names, ["a.example", "b.example", "c.example"]);
    }

    #[test]
    fn test_run_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "one.example two.example").unwrap();
        writeln!(file, "three.example").unwrap();
        file.flush().unwrap();

        let queue = BoundedQueue::new(8).unwrap();
        let outcome = run(&queue, 1, file.path());

        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.enqueued, 3);
        assert!(outcome.error.is_none());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_run_missing_file() {
        let queue = BoundedQueue::new(8).unwrap();
        let outcome = run(&queue, 0, Path::new("/definitely/not/here/names.txt"));

        assert_eq!(outcome.enqueued, 0);
        assert!(matches!(outcome.error, Some(LookupError::InputFile { .. })));
        assert!(queue.is_empty());
    }
}
