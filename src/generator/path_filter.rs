//! Source path filters.
//!
//! A filter naming `dir/...` (or just `...`) accepts everything beneath
//! `dir`. A bare `dir` accepts only files directly inside it. An empty filter
//! set accepts every path.

use camino::Utf8Path;

const RECURSIVE_MARKER: &str = "...";

/// Compiled path filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    recursive: Vec<String>,
    direct: Vec<String>,
}

impl PathFilter {
    /// Compile workspace-relative filters; `//` prefixes are ignored.
    #[must_use]
    pub fn new<'a, I>(filters: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut filter = Self::default();
        for raw in filters {
            let trimmed = raw.trim().trim_start_matches("//");
            if let Some(dir) = trimmed.strip_suffix(RECURSIVE_MARKER) {
                filter.recursive.push(dir.trim_end_matches('/').to_owned());
            } else {
                filter.direct.push(trimmed.trim_end_matches('/').to_owned());
            }
        }
        filter
    }

    /// Whether no filter was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recursive.is_empty() && self.direct.is_empty()
    }

    /// Whether a workspace-relative file passes.
    #[must_use]
    pub fn accepts_file(&self, path: &str) -> bool {
        let directory = Utf8Path::new(path).parent().map_or("", Utf8Path::as_str);
        self.accepts_directory(directory)
    }

    /// Whether files directly inside `directory` pass.
    #[must_use]
    pub fn accepts_directory(&self, directory: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let directory = directory.trim_end_matches('/');
        self.direct.iter().any(|dir| dir == directory)
            || self
                .recursive
                .iter()
                .any(|dir| dir.is_empty() || is_within(directory, dir))
    }
}

fn is_within(directory: &str, ancestor: &str) -> bool {
    directory == ancestor
        || directory
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filter(raw: &[&str]) -> PathFilter {
        let owned: Vec<String> = raw.iter().map(|s| (*s).to_owned()).collect();
        PathFilter::new(&owned)
    }

    #[rstest]
    #[case(&["app/..."], "app/main.m", true)]
    #[case(&["app/..."], "app/sub/deep/x.m", true)]
    #[case(&["app/..."], "application/x.m", false)]
    #[case(&["app"], "app/main.m", true)]
    #[case(&["app"], "app/sub/x.m", false)]
    #[case(&["//app"], "app/main.m", true)]
    #[case(&["..."], "anything/at/all.m", true)]
    #[case(&[], "unfiltered.m", true)]
    #[case(&["lib"], "app/main.m", false)]
    fn filters_files(#[case] raw: &[&str], #[case] path: &str, #[case] expected: bool) {
        assert_eq!(filter(raw).accepts_file(path), expected);
    }

    #[rstest]
    fn build_file_follows_its_package_directory() {
        let filter = filter(&["app"]);
        assert!(filter.accepts_file("app/BUILD"));
        assert!(!filter.accepts_file("app/sub/BUILD"));
    }
}
