use std::fmt;
use std::str::FromStr;

/// A `/`-separated location inside a bucket.
///
/// Empty segments are dropped on parse, so `"/a//b/"` and `"a/b"` are the
/// same path. Segments are otherwise kept verbatim, `..` included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StoragePath {
    segments: Vec<String>,
}

impl StoragePath {
    pub fn new(path: &str) -> Self {
        Self::from_segments(path.split('/'))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.is_empty())
            .collect();
        Self { segments }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Appends the segments of `other`, which may itself contain slashes.
    pub fn join(&self, other: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.split('/').filter(|s| !s.is_empty()).map(String::from));
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self {
                segments: rest.to_vec(),
            }),
            _ => None,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// True when `key` is this path itself or lies beneath it.
    ///
    /// Matching is segment aware: `a/b` matches `a/b` and `a/b/c.txt`
    /// but never `a/bc.txt`. The root path matches every key.
    pub fn contains_key(&self, key: &str) -> bool {
        if self.is_root() {
            return true;
        }
        let prefix = self.to_string();
        match key.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for StoragePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for StoragePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StoragePath {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// Builds the backend key for a name inside an optional path. The root path
/// adds nothing, so `(Some(root), name)` and `(None, name)` give the same key.
pub fn join_key(path: Option<&StoragePath>, name: Option<&str>) -> String {
    let path = path.filter(|path| !path.is_root());
    match (path, name) {
        (None, Some(name)) => name.to_string(),
        (Some(path), None) => path.to_string(),
        (Some(path), Some(name)) => format!("{path}/{name}"),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parse_drops_empty_segments() {
        let path = StoragePath::new("/folder//abc/");
        assert_eq!(path.segments(), ["folder", "abc"]);
        assert_eq!(path.to_string(), "folder/abc");
        assert_eq!(path, StoragePath::from_segments(["folder", "abc"]));
    }

    #[test]
    fn dot_segments_pass_through() {
        let path = StoragePath::new("a/../b");
        assert_eq!(path.to_string(), "a/../b");
    }

    #[test]
    fn parent_and_file_name() {
        let path = StoragePath::new("a/b/c.txt");
        assert_eq!(path.file_name(), Some("c.txt"));
        assert_eq!(path.parent(), Some(StoragePath::new("a/b")));
        assert_eq!(StoragePath::new("c.txt").parent(), None);
        assert_eq!(StoragePath::root().file_name(), None);
    }

    #[rstest]
    #[case(None, Some("file1.txt"), "file1.txt")]
    #[case(Some("folder/abc"), None, "folder/abc")]
    #[case(Some("folder/abc"), Some("file1.txt"), "folder/abc/file1.txt")]
    #[case(None, None, "")]
    #[case(Some(""), Some("file1.txt"), "file1.txt")]
    #[case(Some("/"), Some("file1.txt"), "file1.txt")]
    #[case(Some(""), None, "")]
    fn join_key_rules(
        #[case] path: Option<&str>,
        #[case] name: Option<&str>,
        #[case] expected: &str,
    ) {
        let path = path.map(StoragePath::new);
        assert_eq!(join_key(path.as_ref(), name), expected);
    }

    #[rstest]
    #[case("a/b", "a/b", true)]
    #[case("a/b", "a/b/c.txt", true)]
    #[case("a/b", "a/b/c/d.txt", true)]
    #[case("a/b", "a/bc.txt", false)]
    #[case("folder", "folder2/x.txt", false)]
    #[case("a/b", "a", false)]
    #[case("", "anything.txt", true)]
    fn prefix_policy_is_segment_aware(
        #[case] path: &str,
        #[case] key: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(StoragePath::new(path).contains_key(key), expected);
    }
}
