//! Classification of a requested version against the latest known version

/// Status of the requested version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatestClass {
    /// Requested version is the latest
    Latest,
    /// A newer version exists
    NotLatest,
    /// Latest version could not be determined
    Unknown,
}

impl LatestClass {
    /// CSS class substituted into version badges
    pub fn css_class(self) -> &'static str {
        match self {
            LatestClass::Latest => "DetailsHeader-badge--latest",
            LatestClass::NotLatest => "DetailsHeader-badge--goToLatest",
            LatestClass::Unknown => "DetailsHeader-badge--unknown",
        }
    }
}

/// Classifies `requested` against `latest`, where an empty `latest` means
/// the latest version is unknown.
///
/// Versions are compared as exact strings: `v1.2.3+build` and `v1.2.3` are
/// different versions here.
pub fn classify(requested: &str, latest: &str) -> LatestClass {
    if latest.is_empty() {
        LatestClass::Unknown
    } else if latest == requested {
        LatestClass::Latest
    } else {
        LatestClass::NotLatest
    }
}
