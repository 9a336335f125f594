//! Excluded-path matching
//!
//! Decides whether a request path requires authentication at all.
//! Paths are normalized to end with `/` before matching.

use serde::{Deserialize, Serialize};

/// How excluded-path entries are matched against request paths
///
/// Two policies exist in the wild for otherwise-identical deployments;
/// configuration selects one, they are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Normalized path must equal a list entry
    #[default]
    Exact,
    /// Entries are prefixes; a trailing `*` is stripped before matching
    WildcardPrefix,
}

/// Check whether authentication is required to access `path`
///
/// Fail-secure: an empty path or an empty exclusion list means auth is
/// required.
pub fn requires_auth(path: &str, excluded_paths: &[String], policy: MatchPolicy) -> bool {
    if path.is_empty() || excluded_paths.is_empty() {
        return true;
    }
    let normalized = if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    };

    let exempt = match policy {
        MatchPolicy::Exact => excluded_paths.iter().any(|entry| *entry == normalized),
        MatchPolicy::WildcardPrefix => excluded_paths
            .iter()
            .any(|entry| normalized.starts_with(entry.trim_end_matches('*'))),
    };
    !exempt
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn excluded(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("/api/v1/status/", &["/api/v1/status/"], false)]
    #[case("/api/v1/status", &["/api/v1/status/"], false)] // trailing slash appended
    #[case("/api/v1/users/", &["/api/v1/status/"], true)]
    #[case("/api/v1/users", &[], true)]
    fn test_exact_policy(
        #[case] path: &str,
        #[case] entries: &[&str],
        #[case] expected: bool,
    ) {
        assert_eq!(
            requires_auth(path, &excluded(entries), MatchPolicy::Exact),
            expected
        );
    }

    #[rstest]
    #[case("/api/v1/users/1", &["/api/v1/*"], false)]
    #[case("/api/v1/status", &["/api/v1/status/"], false)]
    #[case("/api/v2/users", &["/api/v1/*"], true)]
    #[case("/api/v1/stat", &["/api/v1/status/"], true)]
    fn test_wildcard_prefix_policy(
        #[case] path: &str,
        #[case] entries: &[&str],
        #[case] expected: bool,
    ) {
        assert_eq!(
            requires_auth(path, &excluded(entries), MatchPolicy::WildcardPrefix),
            expected
        );
    }

    #[test]
    fn test_empty_path_requires_auth() {
        let entries = excluded(&["/api/v1/status/"]);
        assert!(requires_auth("", &entries, MatchPolicy::Exact));
        assert!(requires_auth("", &entries, MatchPolicy::WildcardPrefix));
    }

    #[test]
    fn test_wildcard_entry_not_honored_under_exact_policy() {
        let entries = excluded(&["/api/v1/*"]);
        assert!(requires_auth("/api/v1/users/1", &entries, MatchPolicy::Exact));
    }
}
