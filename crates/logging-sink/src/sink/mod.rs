//! crates/logging-sink/src/sink/mod.rs
//! The serialized multi-destination writer.

mod destination;

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub use destination::{Destination, DestinationId, DestinationKind};

use crate::console::{Console, ConsoleTarget};
use crate::error::SinkError;
use crate::policy::RotationPolicy;
use crate::rotate::RotatingFile;

/// What happened while writing one line.
///
/// Writing never fails from the caller's point of view. The report exists so
/// the layer above can escalate the one event that changes the sink's shape: a
/// destination that had to be abandoned.
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Set when a failing destination was removed during this write. Each
    /// removed destination is reported exactly once.
    pub degraded: Option<SinkError>,
    /// Archives produced by rotations triggered by this write.
    pub archived: Vec<PathBuf>,
}

struct SinkState {
    entries: Vec<(DestinationId, Destination)>,
    next_id: u64,
    file_policy: RotationPolicy,
    fallback: Box<dyn Write + Send>,
}

impl SinkState {
    fn push(&mut self, destination: Destination) -> DestinationId {
        let id = DestinationId(self.next_id);
        self.next_id += 1;
        if let Destination::File(file) = &destination {
            self.file_policy = file.policy().clone();
        }
        self.entries.push((id, destination));
        id
    }

    fn report(&mut self, error: &SinkError) {
        let _ = writeln!(self.fallback, "hooklog: {error}");
        let _ = self.fallback.flush();
    }

    /// Removes the destinations whose write of `line` failed, keeping the list
    /// non-empty, and returns the first failure.
    fn abandon(&mut self, abandoned: Vec<(usize, SinkError)>, line: &[u8]) -> Option<SinkError> {
        let mut lost_file = false;
        let mut lost_stdout = false;
        for (index, _) in abandoned.iter().rev() {
            match self.entries.remove(*index).1 {
                Destination::File(_) => lost_file = true,
                Destination::Console(console) => {
                    lost_stdout |= console.target() == ConsoleTarget::Stdout;
                }
                Destination::Writer(_) => {}
            }
        }

        let has_console = self.entries.iter().any(|(_, d)| d.is_console());
        if self.entries.is_empty() || (lost_file && !has_console) {
            let target = if lost_stdout {
                ConsoleTarget::Stderr
            } else {
                ConsoleTarget::Stdout
            };
            let console = Console::new(target);
            self.push(console.into());
            if let Err(source) = console.write_line(line) {
                let error = SinkError::Write {
                    destination: target.to_string(),
                    source,
                };
                self.report(&error);
            }
        }

        for (_, error) in &abandoned {
            self.report_removed(error);
        }
        abandoned.into_iter().map(|(_, error)| error).next()
    }

    fn report_removed(&mut self, error: &SinkError) {
        let _ = writeln!(self.fallback, "hooklog: {error}; destination removed");
        let _ = self.fallback.flush();
    }
}

/// Line-oriented writer fanning out to an ordered list of destinations.
///
/// All destination state sits behind one mutex: a call to
/// [`write_line`](Self::write_line) writes the complete line to every
/// destination before the next caller is admitted, so lines from concurrent
/// threads never interleave. Compressing and pruning archives after a rotation
/// happens under a second lock, after the first one is released. A destination
/// whose write fails is dropped and described once on the fallback stream
/// (stderr unless replaced with [`with_fallback`](Self::with_fallback));
/// nothing is returned to the writer as an error.
///
/// The destination list is never empty. Operations that would empty it either
/// refuse ([`remove_destination`](Self::remove_destination)) or install a
/// console in its place ([`close`](Self::close), write or rotation failure).
///
/// # Examples
///
/// ```
/// use logging_sink::{Destination, OutputSink};
///
/// let sink = OutputSink::new(vec![Destination::writer(Vec::new())]);
/// let report = sink.write_line(b"ready\n");
/// assert!(report.degraded.is_none());
/// assert_eq!(sink.destinations().len(), 1);
/// ```
pub struct OutputSink {
    state: Mutex<SinkState>,
    archiving: Mutex<()>,
}

impl OutputSink {
    /// Creates a sink over `destinations`, or a stdout console when empty.
    pub fn new(destinations: Vec<Destination>) -> Self {
        let mut state = SinkState {
            entries: Vec::with_capacity(destinations.len().max(1)),
            next_id: 0,
            file_policy: RotationPolicy::default(),
            fallback: Box::new(io::stderr()),
        };
        for destination in destinations {
            state.push(destination);
        }
        state.ensure_console_if_empty();
        Self {
            state: Mutex::new(state),
            archiving: Mutex::new(()),
        }
    }

    /// Stdout console plus a rotating file governed by `policy`.
    pub fn console_and_file(policy: RotationPolicy) -> Result<Self, SinkError> {
        Ok(Self::new(vec![
            Destination::console(ConsoleTarget::Stdout),
            Destination::file(policy)?,
        ]))
    }

    /// Replaces the last-resort stream used to describe I/O failures.
    #[must_use]
    pub fn with_fallback<W>(self, fallback: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.lock().fallback = Box::new(fallback);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Writes `line` to every destination in order.
    ///
    /// A destination whose write fails is removed from the sink and described
    /// once on the fallback stream; the first such failure is also returned in
    /// [`WriteReport::degraded`]. Losing a file brings in a stdout console when
    /// no console remains, and losing the last destination of any kind brings
    /// in a console too, so the line is still delivered somewhere.
    ///
    /// Compression and retention after a rotation run once the sink lock is
    /// released, so other writers are not held up by them.
    pub fn write_line(&self, line: &[u8]) -> WriteReport {
        let mut report = WriteReport::default();
        let mut state = self.lock();
        let mut abandoned = Vec::new();
        let mut jobs = Vec::new();

        for (index, (_, destination)) in state.entries.iter_mut().enumerate() {
            let result = match destination {
                Destination::Console(console) => console
                    .write_line(line)
                    .map_err(|source| destination.write_error(source)),
                Destination::File(file) => file
                    .write_line_deferred(line)
                    .map(|job| jobs.extend(job)),
                Destination::Writer(writer) => writer
                    .write_all(line)
                    .and_then(|()| writer.flush())
                    .map_err(|source| destination.write_error(source)),
            };
            if let Err(error) = result {
                abandoned.push((index, error));
            }
        }

        if !abandoned.is_empty() {
            report.degraded = state.abandon(abandoned, line);
        }
        drop(state);

        if jobs.is_empty() {
            return report;
        }
        let warnings = {
            let _archiving = self.archiving.lock().unwrap_or_else(PoisonError::into_inner);
            let mut warnings = Vec::new();
            for job in jobs {
                let outcome = job.run();
                report.archived.extend(outcome.archived);
                warnings.extend(outcome.warnings);
            }
            warnings
        };
        if !warnings.is_empty() {
            let mut state = self.lock();
            for error in &warnings {
                state.report(error);
            }
        }
        report
    }

    /// Replaces every destination with `writer`.
    ///
    /// This is a full replacement: console and file destinations are dropped
    /// (and their files closed) unless the caller adds them back.
    pub fn set_output<W>(&self, writer: W)
    where
        W: Write + Send + 'static,
    {
        let mut state = self.lock();
        let previous = std::mem::take(&mut state.entries);
        state.push(Destination::writer(writer));
        drop(state);
        drop(previous);
    }

    /// Appends a destination and returns its identifier.
    pub fn add_destination(&self, destination: Destination) -> DestinationId {
        self.lock().push(destination)
    }

    /// Removes and returns a destination.
    pub fn remove_destination(&self, id: DestinationId) -> Result<Destination, SinkError> {
        let mut state = self.lock();
        let index = state
            .entries
            .iter()
            .position(|(candidate, _)| *candidate == id)
            .ok_or(SinkError::UnknownDestination(id))?;
        if state.entries.len() == 1 {
            return Err(SinkError::LastDestination);
        }
        Ok(state.entries.remove(index).1)
    }

    /// Lists destinations in write order.
    pub fn destinations(&self) -> Vec<(DestinationId, DestinationKind)> {
        self.lock()
            .entries
            .iter()
            .map(|(id, destination)| (*id, destination.kind()))
            .collect()
    }

    /// Points the file destination at `path`, closing the previous file.
    ///
    /// When no file destination is present (for example after
    /// [`set_output`](Self::set_output) or [`close`](Self::close)), a new one is
    /// appended using the most recent rotation settings.
    pub fn set_filename(&self, path: impl AsRef<Path>) -> Result<(), SinkError> {
        let mut state = self.lock();
        let policy = state.file_policy.clone().with_path(path.as_ref());
        Self::apply_policy(&mut state, policy)
    }

    /// Replaces the rotation policy of the file destination.
    pub fn set_rotation_policy(&self, policy: RotationPolicy) -> Result<(), SinkError> {
        let mut state = self.lock();
        Self::apply_policy(&mut state, policy)
    }

    fn apply_policy(state: &mut SinkState, policy: RotationPolicy) -> Result<(), SinkError> {
        let existing = state.entries.iter_mut().find_map(|(_, d)| match d {
            Destination::File(file) => Some(file),
            _ => None,
        });
        if let Some(file) = existing {
            file.reconfigure(policy.clone())?;
        } else {
            let file = RotatingFile::open(policy.clone())?;
            state.push(file.into());
        }
        state.file_policy = policy;
        Ok(())
    }

    /// Returns the active file path, if a file destination exists.
    pub fn filename(&self) -> Option<PathBuf> {
        self.lock()
            .entries
            .iter()
            .find_map(|(_, destination)| match destination {
                Destination::File(file) => Some(file.path().to_path_buf()),
                _ => None,
            })
    }

    /// Flushes every destination, describing failures on the fallback stream.
    pub fn flush(&self) {
        let mut state = self.lock();
        let mut failures = Vec::new();
        for (_, destination) in &mut state.entries {
            if let Err(error) = destination.flush() {
                failures.push(error);
            }
        }
        for error in &failures {
            state.report(error);
        }
    }

    /// Flushes everything and closes file destinations.
    ///
    /// File destinations are removed; if nothing else remains, a stdout
    /// console takes over. The first flush failure is returned.
    pub fn close(&self) -> Result<(), SinkError> {
        let mut state = self.lock();
        let mut first_error = None;
        let mut kept = Vec::with_capacity(state.entries.len());
        for (id, mut destination) in std::mem::take(&mut state.entries) {
            let result = match &mut destination {
                Destination::File(file) => file.close(),
                other => other.flush(),
            };
            if let Err(error) = result {
                first_error.get_or_insert(error);
            }
            if !matches!(destination, Destination::File(_)) {
                kept.push((id, destination));
            }
        }
        state.entries = kept;
        state.ensure_console_if_empty();
        first_error.map_or(Ok(()), Err)
    }
}

impl SinkState {
    fn ensure_console_if_empty(&mut self) {
        if self.entries.is_empty() {
            self.push(Destination::Console(Console::stdout()));
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("destinations", &self.destinations())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use test_support::{FailingWriter, SharedBuffer};

    fn sink_with(buffer: &SharedBuffer) -> OutputSink {
        OutputSink::new(vec![Destination::writer(buffer.clone())])
    }

    #[test]
    fn empty_list_gets_stdout_console() {
        let sink = OutputSink::new(Vec::new());
        let destinations = sink.destinations();
        assert_eq!(destinations.len(), 1);
        assert_eq!(destinations[0].1, DestinationKind::Console(ConsoleTarget::Stdout));
    }

    #[test]
    fn write_line_reaches_every_destination() {
        let first = SharedBuffer::new();
        let second = SharedBuffer::new();
        let sink = OutputSink::new(vec![
            Destination::writer(first.clone()),
            Destination::writer(second.clone()),
        ]);
        sink.write_line(b"hello\n");
        assert_eq!(first.contents(), "hello\n");
        assert_eq!(second.contents(), "hello\n");
    }

    #[test]
    fn failing_destination_is_dropped_and_reported_once() {
        let good = SharedBuffer::new();
        let fallback = SharedBuffer::new();
        let sink = OutputSink::new(vec![
            Destination::writer(FailingWriter::new()),
            Destination::writer(good.clone()),
        ])
        .with_fallback(fallback.clone());

        let first = sink.write_line(b"still delivered\n");
        assert!(matches!(first.degraded, Some(SinkError::Write { .. })));
        for _ in 0..2 {
            assert!(sink.write_line(b"again\n").degraded.is_none());
        }

        assert_eq!(good.lines(), vec!["still delivered", "again", "again"]);
        assert_eq!(fallback.lines().len(), 1);
        assert!(fallback.contents().contains("failed to write to custom writer"));
        assert_eq!(sink.destinations().len(), 1);
    }

    #[test]
    fn losing_only_writer_brings_in_console() {
        let fallback = SharedBuffer::new();
        let sink = OutputSink::new(vec![Destination::writer(FailingWriter::new())])
            .with_fallback(fallback.clone());

        assert!(sink.write_line(b"lost writer\n").degraded.is_some());
        let kinds: Vec<_> = sink.destinations().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec![DestinationKind::Console(ConsoleTarget::Stdout)]);
        assert_eq!(fallback.lines().len(), 1);
    }

    #[test]
    fn set_output_replaces_everything() {
        let first = SharedBuffer::new();
        let replacement = SharedBuffer::new();
        let sink = sink_with(&first);
        sink.add_destination(Destination::console(ConsoleTarget::Stderr));

        sink.set_output(replacement.clone());
        sink.write_line(b"after\n");

        assert_eq!(first.contents(), "");
        assert_eq!(replacement.contents(), "after\n");
        let kinds: Vec<_> = sink.destinations().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec![DestinationKind::Writer]);
    }

    #[test]
    fn add_and_remove_destinations() {
        let first = SharedBuffer::new();
        let second = SharedBuffer::new();
        let sink = sink_with(&first);
        let id = sink.add_destination(Destination::writer(second.clone()));

        sink.write_line(b"both\n");
        sink.remove_destination(id).expect("remove");
        sink.write_line(b"first only\n");

        assert_eq!(first.contents(), "both\nfirst only\n");
        assert_eq!(second.contents(), "both\n");
    }

    #[test]
    fn removing_last_destination_is_refused() {
        let sink = sink_with(&SharedBuffer::new());
        let (id, _) = sink.destinations()[0].clone();
        assert!(matches!(
            sink.remove_destination(id),
            Err(SinkError::LastDestination)
        ));
        assert_eq!(sink.destinations().len(), 1);
    }

    #[test]
    fn removing_unknown_destination_fails() {
        let sink = sink_with(&SharedBuffer::new());
        assert!(matches!(
            sink.remove_destination(DestinationId(999)),
            Err(SinkError::UnknownDestination(_))
        ));
    }

    #[test]
    fn set_filename_adds_file_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let buffer = SharedBuffer::new();
        let sink = sink_with(&buffer);
        let path = dir.path().join("late.log");

        sink.set_filename(&path).expect("set filename");
        sink.write_line(b"to both\n");

        assert_eq!(sink.filename(), Some(path.clone()));
        assert_eq!(fs::read_to_string(&path).expect("read"), "to both\n");
        assert_eq!(buffer.contents(), "to both\n");
    }

    #[test]
    fn set_filename_moves_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        let sink = OutputSink::new(vec![
            Destination::file(RotationPolicy::new(&first).with_compress(false)).expect("file"),
        ]);

        sink.write_line(b"one\n");
        sink.set_filename(&second).expect("set filename");
        sink.write_line(b"two\n");

        assert_eq!(fs::read_to_string(&first).expect("read"), "one\n");
        assert_eq!(fs::read_to_string(&second).expect("read"), "two\n");
        assert_eq!(sink.destinations().len(), 1);
    }

    #[test]
    fn close_removes_files_and_keeps_sink_usable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        let sink = OutputSink::new(vec![Destination::file(RotationPolicy::new(&path)).expect("file")]);
        sink.write_line(b"before close\n");

        sink.close().expect("close");
        let kinds: Vec<_> = sink.destinations().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec![DestinationKind::Console(ConsoleTarget::Stdout)]);
        assert_eq!(fs::read_to_string(&path).expect("read"), "before close\n");
    }

    #[test]
    fn open_failure_degrades_to_console_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not dir").expect("write");
        let fallback = SharedBuffer::new();
        let sink = OutputSink::new(vec![
            Destination::file(RotationPolicy::new(blocker.join("app.log"))).expect("file"),
        ])
        .with_fallback(fallback.clone());

        let first = sink.write_line(b"triggering line\n");
        assert!(matches!(first.degraded, Some(SinkError::Open { .. })));
        let kinds: Vec<_> = sink.destinations().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, vec![DestinationKind::Console(ConsoleTarget::Stdout)]);

        let second = sink.write_line(b"next line\n");
        assert!(second.degraded.is_none());
    }

    #[test]
    fn reopen_failure_during_rotation_falls_back_to_console() {
        let dir = tempfile::tempdir().expect("tempdir");
        let policy = RotationPolicy::new(dir.path().join("app.log"))
            .with_max_size(8)
            .with_compress(false);
        let file = RotatingFile::new(policy)
            .expect("file")
            .with_opener(crate::rotate::refuse_after_archive);
        let buffer = SharedBuffer::new();
        let fallback = SharedBuffer::new();
        let sink = OutputSink::new(vec![Destination::writer(buffer.clone()), file.into()])
            .with_fallback(fallback.clone());

        assert!(sink.write_line(b"archived\n").degraded.is_none());
        let crossing = sink.write_line(b"crossing\n");
        assert!(matches!(crossing.degraded, Some(SinkError::Rotate { .. })));
        assert!(sink.write_line(b"after\n").degraded.is_none());

        let kinds: Vec<_> = sink.destinations().into_iter().map(|(_, k)| k).collect();
        assert_eq!(
            kinds,
            vec![
                DestinationKind::Writer,
                DestinationKind::Console(ConsoleTarget::Stdout),
            ]
        );
        assert_eq!(buffer.lines(), vec!["archived", "crossing", "after"]);
        assert_eq!(fallback.lines().len(), 1);
        assert!(fallback.contents().contains("failed to rotate log file"));

        let archives: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(archives.len(), 1);
        assert!(archives[0].starts_with("app-"));
        let archived = fs::read_to_string(dir.path().join(&archives[0])).expect("read");
        assert_eq!(archived, "archived\n");
    }

    #[test]
    fn archiving_does_not_block_other_writers() {
        use std::sync::Arc;
        use std::thread;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        let policy = RotationPolicy::new(&active).with_max_size(15);
        let sink = Arc::new(OutputSink::new(vec![Destination::file(policy).expect("file")]));
        sink.write_line(b"aaaaaaaaa\n");

        let archiving = sink.archiving.lock().expect("archive lock");
        let rotating = {
            let sink = Arc::clone(&sink);
            thread::spawn(move || sink.write_line(b"bbbbbbbbb\n"))
        };
        let deadline = Instant::now() + Duration::from_secs(5);
        while fs::read(&active).unwrap_or_default() != b"bbbbbbbbb\n" {
            assert!(Instant::now() < deadline, "rotation never happened");
            thread::sleep(Duration::from_millis(5));
        }

        let report = sink.write_line(b"c\n");
        assert!(report.archived.is_empty());
        assert!(!rotating.is_finished());

        drop(archiving);
        let rotated = rotating.join().expect("rotating writer");
        assert_eq!(rotated.archived.len(), 1);
        assert!(rotated.archived[0].to_string_lossy().ends_with(".log.gz"));
        assert_eq!(fs::read(&active).expect("read"), b"bbbbbbbbb\nc\n");
    }

    #[test]
    fn debug_lists_destinations() {
        let sink = sink_with(&SharedBuffer::new());
        assert!(format!("{sink:?}").contains("Writer"));
    }
}
