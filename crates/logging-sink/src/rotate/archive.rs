//! crates/logging-sink/src/rotate/archive.rs
//! Naming, compression and retention of rotated log files.
//!
//! An active file `logs/app.log` is archived as
//! `logs/app-2024-05-01T10-20-30.123.log`, optionally followed by `.gz` once
//! compressed. Name collisions within the same millisecond append a counter
//! before the extension (`app-2024-05-01T10-20-30.123.1.log`).

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::SinkError;
use crate::policy::RotationPolicy;

const ARCHIVE_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]-[minute]-[second].[subsecond digits:3]");

/// Length of a rendered [`ARCHIVE_TIMESTAMP`].
const TIMESTAMP_LEN: usize = "2006-01-02T15-04-05.000".len();

const GZIP_SUFFIX: &str = ".gz";

/// An archived log file discovered next to the active file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Archive {
    pub(crate) path: PathBuf,
    pub(crate) created: OffsetDateTime,
    pub(crate) sequence: u32,
}

/// Splits the active path into its directory, stem and extension (with dot).
fn split(active: &Path) -> (PathBuf, String, String) {
    let dir = match active.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let stem = active
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = active
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (dir, stem, ext)
}

fn render_timestamp(at: OffsetDateTime) -> String {
    at.format(ARCHIVE_TIMESTAMP)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Picks an unused archive path for `active`, rotated at `at`.
pub(crate) fn archive_path(active: &Path, at: OffsetDateTime) -> PathBuf {
    let (dir, stem, ext) = split(active);
    let stamp = render_timestamp(at.to_offset(time::UtcOffset::UTC));

    // Counters only grow within one timestamp so a pruned slot is never reused
    // by a newer archive, which would then sort as the oldest.
    let mut sequence = list_archives(active)
        .unwrap_or_default()
        .into_iter()
        .filter(|archive| render_timestamp(archive.created) == stamp)
        .map(|archive| archive.sequence + 1)
        .max()
        .unwrap_or(0);
    loop {
        let name = if sequence == 0 {
            format!("{stem}-{stamp}{ext}")
        } else {
            format!("{stem}-{stamp}.{sequence}{ext}")
        };
        let candidate = dir.join(&name);
        let compressed = dir.join(format!("{name}{GZIP_SUFFIX}"));
        if !candidate.exists() && !compressed.exists() {
            return candidate;
        }
        sequence += 1;
    }
}

/// Parses an archive file name belonging to `active`.
fn parse_archive_name(name: &str, stem: &str, ext: &str) -> Option<(OffsetDateTime, u32)> {
    let rest = name.strip_prefix(stem)?.strip_prefix('-')?;
    let rest = rest.strip_suffix(GZIP_SUFFIX).unwrap_or(rest);
    let rest = rest.strip_suffix(ext)?;
    if rest.len() < TIMESTAMP_LEN || !rest.is_char_boundary(TIMESTAMP_LEN) {
        return None;
    }
    let (stamp, counter) = rest.split_at(TIMESTAMP_LEN);
    let created = PrimitiveDateTime::parse(stamp, ARCHIVE_TIMESTAMP)
        .ok()?
        .assume_utc();
    let sequence = match counter {
        "" => 0,
        counter => counter.strip_prefix('.')?.parse().ok()?,
    };
    Some((created, sequence))
}

/// Lists archives of `active`, newest first.
pub(crate) fn list_archives(active: &Path) -> io::Result<Vec<Archive>> {
    let (dir, stem, ext) = split(active);
    let mut archives = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let Ok(entry) = entry else { continue };
        let name: OsString = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some((created, sequence)) = parse_archive_name(name, &stem, &ext) {
            archives.push(Archive {
                path: entry.path(),
                created,
                sequence,
            });
        }
    }
    archives.sort_by(|a, b| {
        b.created
            .cmp(&a.created)
            .then_with(|| b.sequence.cmp(&a.sequence))
    });
    Ok(archives)
}

fn gzip_file(source: &Path, target: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(source)?);
    let output = BufWriter::new(File::create(target)?);
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()
}

/// Compresses `path` into `path.gz` and removes the original.
///
/// On failure the partially written `.gz` file is removed and the original
/// archive stays in place.
pub(crate) fn compress(path: &Path) -> Result<PathBuf, SinkError> {
    let mut target = path.as_os_str().to_owned();
    target.push(GZIP_SUFFIX);
    let target = PathBuf::from(target);

    if let Err(source) = gzip_file(path, &target) {
        let _ = fs::remove_file(&target);
        return Err(SinkError::Compress {
            path: path.to_path_buf(),
            source,
        });
    }
    fs::remove_file(path).map_err(|source| SinkError::Compress {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(target)
}

/// Outcome of a retention pass.
#[derive(Debug, Default)]
pub(crate) struct Pruned {
    pub(crate) removed: Vec<PathBuf>,
    pub(crate) failures: Vec<SinkError>,
}

/// Removes archives beyond `max_backups` and older than `max_age_days`.
pub(crate) fn prune(active: &Path, policy: &RotationPolicy, now: OffsetDateTime) -> Pruned {
    let mut pruned = Pruned::default();
    if policy.max_backups == 0 && policy.max_age_days == 0 {
        return pruned;
    }

    let archives = match list_archives(active) {
        Ok(archives) => archives,
        Err(source) => {
            pruned.failures.push(SinkError::Prune {
                path: split(active).0,
                source,
            });
            return pruned;
        }
    };

    let cutoff = (policy.max_age_days > 0)
        .then(|| now - Duration::days(i64::from(policy.max_age_days)));

    for (index, archive) in archives.into_iter().enumerate() {
        let over_count = policy.max_backups > 0 && index >= policy.max_backups;
        let too_old = cutoff.is_some_and(|cutoff| archive.created < cutoff);
        if !over_count && !too_old {
            continue;
        }
        match fs::remove_file(&archive.path) {
            Ok(()) => pruned.removed.push(archive.path),
            Err(source) => pruned.failures.push(SinkError::Prune {
                path: archive.path,
                source,
            }),
        }
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use time::macros::datetime;

    #[test]
    fn archive_name_embeds_utc_timestamp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        let path = archive_path(&active, datetime!(2024-05-01 10:20:30.123 UTC));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("app-2024-05-01T10-20-30.123.log")
        );
    }

    #[test]
    fn archive_name_adds_counter_on_collision() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        let at = datetime!(2024-05-01 10:20:30.123 UTC);
        fs::write(dir.path().join("app-2024-05-01T10-20-30.123.log.gz"), b"").expect("write");
        let path = archive_path(&active, at);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("app-2024-05-01T10-20-30.123.1.log")
        );
    }

    #[test]
    fn archive_counter_never_reuses_pruned_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        let at = datetime!(2024-05-01 10:20:30.123 UTC);
        fs::write(dir.path().join("app-2024-05-01T10-20-30.123.2.log"), b"").expect("write");
        let path = archive_path(&active, at);
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("app-2024-05-01T10-20-30.123.3.log")
        );
    }

    #[test]
    fn parse_accepts_plain_compressed_and_counted_names() {
        let parsed = parse_archive_name("app-2024-05-01T10-20-30.123.log", "app", ".log");
        assert_eq!(parsed, Some((datetime!(2024-05-01 10:20:30.123 UTC), 0)));

        let parsed = parse_archive_name("app-2024-05-01T10-20-30.123.log.gz", "app", ".log");
        assert_eq!(parsed, Some((datetime!(2024-05-01 10:20:30.123 UTC), 0)));

        let parsed = parse_archive_name("app-2024-05-01T10-20-30.123.4.log", "app", ".log");
        assert_eq!(parsed, Some((datetime!(2024-05-01 10:20:30.123 UTC), 4)));
    }

    #[test]
    fn parse_rejects_foreign_files() {
        assert_eq!(parse_archive_name("app.log", "app", ".log"), None);
        assert_eq!(parse_archive_name("other-2024-05-01T10-20-30.123.log", "app", ".log"), None);
        assert_eq!(parse_archive_name("app-notatimestamp-at-all.log", "app", ".log"), None);
        assert_eq!(parse_archive_name("app-2024-05-01T10-20-30.123.x.log", "app", ".log"), None);
    }

    #[test]
    fn list_archives_sorts_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        for name in [
            "app-2024-01-01T00-00-00.000.log",
            "app-2024-03-01T00-00-00.000.log.gz",
            "app-2024-02-01T00-00-00.000.log",
            "unrelated.txt",
        ] {
            fs::write(dir.path().join(name), b"x").expect("write");
        }
        let archives = list_archives(&active).expect("list");
        let names: Vec<_> = archives
            .iter()
            .filter_map(|a| a.path.file_name().and_then(|n| n.to_str()).map(str::to_owned))
            .collect();
        assert_eq!(
            names,
            vec![
                "app-2024-03-01T00-00-00.000.log.gz",
                "app-2024-02-01T00-00-00.000.log",
                "app-2024-01-01T00-00-00.000.log",
            ]
        );
    }

    #[test]
    fn compress_replaces_archive_with_gzip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("app-2024-01-01T00-00-00.000.log");
        fs::write(&archive, b"line one\nline two\n").expect("write");

        let compressed = compress(&archive).expect("compress");
        assert!(!archive.exists());
        assert!(compressed.to_string_lossy().ends_with(".log.gz"));

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(&compressed).expect("open"))
            .read_to_string(&mut decoded)
            .expect("decode");
        assert_eq!(decoded, "line one\nline two\n");
    }

    #[test]
    fn compress_missing_file_reports_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("gone.log");
        let error = compress(&missing).expect_err("missing file");
        assert!(matches!(error, SinkError::Compress { .. }));
        assert!(!dir.path().join("gone.log.gz").exists());
    }

    #[test]
    fn prune_keeps_newest_backups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        for day in 1..=4 {
            fs::write(
                dir.path().join(format!("app-2024-01-0{day}T00-00-00.000.log")),
                b"x",
            )
            .expect("write");
        }
        let policy = RotationPolicy::new(&active).with_max_backups(2);
        let pruned = prune(&active, &policy, datetime!(2024-01-05 00:00 UTC));
        assert!(pruned.failures.is_empty());
        assert_eq!(pruned.removed.len(), 2);
        assert!(dir.path().join("app-2024-01-04T00-00-00.000.log").exists());
        assert!(dir.path().join("app-2024-01-03T00-00-00.000.log").exists());
        assert!(!dir.path().join("app-2024-01-02T00-00-00.000.log").exists());
        assert!(!dir.path().join("app-2024-01-01T00-00-00.000.log").exists());
    }

    #[test]
    fn prune_removes_expired_archives() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        fs::write(dir.path().join("app-2024-01-01T00-00-00.000.log"), b"x").expect("write");
        fs::write(dir.path().join("app-2024-01-09T00-00-00.000.log"), b"x").expect("write");
        let policy = RotationPolicy::new(&active).with_max_age_days(3);
        let pruned = prune(&active, &policy, datetime!(2024-01-10 00:00 UTC));
        assert_eq!(pruned.removed.len(), 1);
        assert!(!dir.path().join("app-2024-01-01T00-00-00.000.log").exists());
        assert!(dir.path().join("app-2024-01-09T00-00-00.000.log").exists());
    }

    #[test]
    fn prune_unlimited_policy_keeps_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        let active = dir.path().join("app.log");
        fs::write(dir.path().join("app-2000-01-01T00-00-00.000.log"), b"x").expect("write");
        let policy = RotationPolicy::new(&active);
        let pruned = prune(&active, &policy, OffsetDateTime::now_utc());
        assert!(pruned.removed.is_empty());
        assert!(dir.path().join("app-2000-01-01T00-00-00.000.log").exists());
    }
}
