use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::{read_all, CancelToken, FetchError, Fetcher};

const VERSIONS_FILE: &str = "versions";

/// A `vMAJOR.MINOR.PATCH[-PRE]` entry from a distribution's `versions` file.
///
/// Build metadata (`+...`) is not recognised; such lines fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl DistVersion {
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some()
    }
}

impl FromStr for DistVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let (core, pre) = match body.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(format!("empty prerelease in {:?}", s)),
            None => (body, None),
        };

        let mut numbers = core.split('.').map(|n| n.parse::<u64>());
        let (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch)), None) = (
            numbers.next(),
            numbers.next(),
            numbers.next(),
            numbers.next(),
        ) else {
            return Err(format!("not a version: {:?}", s));
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl fmt::Display for DistVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Ord for DistVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // a release sorts after its prereleases
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => cmp_prerelease(a, b),
            })
    }
}

/// Semver prerelease precedence: dot-separated identifiers compared left to
/// right, numeric ones numerically and below alphanumeric ones, with a
/// shorter run of equal identifiers sorting first.
fn cmp_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        let ord = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match (x.parse::<u64>(), y.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => x.cmp(y),
            },
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

impl PartialOrd for DistVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// List the versions published for `dist`, sorted ascending or descending.
///
/// Lines that do not parse as versions are skipped.
pub async fn dist_versions(
    fetcher: &dyn Fetcher,
    cancel: &CancelToken,
    dist: &str,
    sort_desc: bool,
) -> Result<Vec<DistVersion>, FetchError> {
    let path = format!("{}/{}", dist.trim_end_matches('/'), VERSIONS_FILE);
    let stream = fetcher.fetch(cancel, &path).await?;
    let body = read_all(stream).await?;

    let mut versions: Vec<DistVersion> = String::from_utf8_lossy(&body)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match line.parse::<DistVersion>() {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::debug!(dist, error = %e, "skipping versions entry");
                None
            }
        })
        .collect();

    if versions.is_empty() {
        return Err(FetchError::NoVersions(dist.to_string()));
    }

    versions.sort();
    if sort_desc {
        versions.reverse();
    }
    Ok(versions)
}

/// The newest published version of `dist`, skipping prereleases when `stable_only`.
pub async fn latest_dist_version(
    fetcher: &dyn Fetcher,
    cancel: &CancelToken,
    dist: &str,
    stable_only: bool,
) -> Result<DistVersion, FetchError> {
    dist_versions(fetcher, cancel, dist, true)
        .await?
        .into_iter()
        .find(|v| !stable_only || !v.is_prerelease())
        .ok_or_else(|| FetchError::NoVersions(dist.to_string()))
}
