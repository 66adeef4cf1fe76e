//! Capacity check for the embedded store.

use std::io;

use cap_std::fs::Dir;

use crate::domain::Error;

use super::atomic_io::is_temp_file;

/// Default store capacity: 5 MiB.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Share of the quota a write may fill, in percent.
const THRESHOLD_PERCENT: u64 = 90;

/// Size limit of the embedded store.
///
/// Writes that would grow the store past 90% of the limit fail fast with
/// [`crate::domain::FailureKind::QuotaExceeded`]. Nothing is ever evicted.
///
/// # Examples
/// ```
/// use budget_sync::outbound::persistence::StoreQuota;
///
/// let quota = StoreQuota::new(1_000);
/// assert_eq!(quota.threshold_bytes(), 900);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreQuota {
    limit_bytes: u64,
}

impl StoreQuota {
    pub fn new(limit_bytes: u64) -> Self {
        Self { limit_bytes }
    }

    pub fn limit_bytes(&self) -> u64 {
        self.limit_bytes
    }

    /// Largest store size a write may produce.
    pub fn threshold_bytes(&self) -> u64 {
        self.limit_bytes.saturating_mul(THRESHOLD_PERCENT) / 100
    }

    /// Check that replacing `file_name` with `new_len` bytes keeps the store
    /// under the threshold.
    ///
    /// Writes that do not grow the store are always allowed, so data can be
    /// removed from a store that is already full.
    pub(super) fn check(&self, dir: &Dir, file_name: &str, new_len: u64) -> Result<(), Error> {
        let usage = StoreUsage::measure(dir, file_name).map_err(|err| {
            Error::unknown(format!("failed to measure embedded store usage: {err}"))
        })?;
        let projected = usage.others.saturating_add(new_len);
        let current = usage.others.saturating_add(usage.target);
        if projected > self.threshold_bytes() && projected > current {
            return Err(Error::quota_exceeded(format!(
                "write of {new_len} bytes would grow the store to {projected} bytes, above \
                 {THRESHOLD_PERCENT}% of the {} byte quota",
                self.limit_bytes
            )));
        }
        Ok(())
    }
}

impl Default for StoreQuota {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_BYTES)
    }
}

struct StoreUsage {
    /// Bytes used by `file_name` today.
    target: u64,
    /// Bytes used by every other document.
    others: u64,
}

impl StoreUsage {
    fn measure(dir: &Dir, file_name: &str) -> io::Result<Self> {
        let mut usage = Self {
            target: 0,
            others: 0,
        };
        for entry in dir.entries()? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_temp_file(&name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            if name == file_name {
                usage.target = metadata.len();
            } else {
                usage.others = usage.others.saturating_add(metadata.len());
            }
        }
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use cap_std::ambient_authority;
    use rstest::rstest;

    fn store_with(files: &[(&str, usize)]) -> (tempfile::TempDir, Dir) {
        let tmp = crate::test_support::temp_store_dir();
        let dir = Dir::open_ambient_dir(tmp.path(), ambient_authority()).expect("open");
        for (name, len) in files {
            dir.write(name, vec![b'x'; *len]).expect("seed file");
        }
        (tmp, dir)
    }

    #[rstest]
    #[case(&[], 900, true)]
    #[case(&[], 901, false)]
    #[case(&[("other.json", 500)], 400, true)]
    #[case(&[("other.json", 500)], 401, false)]
    #[case(&[("doc.json", 300), ("other.json", 500)], 400, true)]
    fn rejects_growth_past_ninety_percent(
        #[case] files: &[(&str, usize)],
        #[case] new_len: u64,
        #[case] allowed: bool,
    ) {
        let (_tmp, dir) = store_with(files);
        let outcome = StoreQuota::new(1_000).check(&dir, "doc.json", new_len);
        assert_eq!(outcome.is_ok(), allowed, "{outcome:?}");
        if let Err(err) = outcome {
            assert_eq!(err.kind(), FailureKind::QuotaExceeded);
        }
    }

    #[test]
    fn shrinking_writes_pass_even_when_full() {
        let (_tmp, dir) = store_with(&[("doc.json", 20), ("other.json", 950)]);
        assert!(StoreQuota::new(1_000).check(&dir, "doc.json", 10).is_ok());
        assert!(StoreQuota::new(1_000).check(&dir, "doc.json", 21).is_err());
    }
}
