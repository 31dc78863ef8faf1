use semver::Version;
use tracing::warn;

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "5" or "5.1" by padding with zeros and
/// strips a leading `v`.
///
/// Examples:
/// - "5" -> Version(5, 0, 0)
/// - "5.1" -> Version(5, 1, 0)
/// - "v5.0.13" -> Version(5, 0, 13)
pub fn parse_version(version: &str) -> Option<Version> {
    parse_partial(version).map(|(version, _)| version)
}

/// Parse a possibly partial version, also returning how many components
/// were written (1 for "5", 2 for "5.1", 3 for "5.1.0").
pub fn parse_partial(version: &str) -> Option<(Version, usize)> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);

    // Only the release part counts toward precision
    let release = version.split(['-', '+']).next().unwrap_or(version);
    let precision = release.split('.').count();

    let normalized = match precision {
        1 => format!("{}.0.0{}", release, &version[release.len()..]),
        2 => format!("{}.0{}", release, &version[release.len()..]),
        _ => version.to_string(),
    };

    Version::parse(&normalized).ok().map(|v| (v, precision.min(3)))
}

/// Parse and sort catalog entries from highest to lowest.
///
/// Entries that are not valid versions are skipped. Duplicates are removed.
pub fn sort_descending(versions: &[String]) -> Vec<Version> {
    let mut parsed: Vec<Version> = versions
        .iter()
        .filter_map(|v| {
            let parsed = parse_version(v);
            if parsed.is_none() {
                warn!("Skipping invalid catalog version '{}'", v);
            }
            parsed
        })
        .collect();

    parsed.sort_by(|a, b| b.cmp(a));
    parsed.dedup();
    parsed
}

/// Find the semantically maximum stable version from a list.
///
/// Pre-releases are ignored. Invalid versions are skipped.
pub fn find_semantic_max(versions: &[String]) -> Option<String> {
    versions
        .iter()
        .filter_map(|v| parse_version(v).map(|parsed| (v, parsed)))
        .filter(|(_, parsed)| parsed.pre.is_empty())
        .max_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(original, _)| original.clone())
}
