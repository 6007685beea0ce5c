use std::fmt;

/// Dotted version string, e.g. a driver version `441.22` or a backend
/// release `2.7.1`. Missing components parse as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            patch: 0,
        }
    }

    /// Parses `major[.minor[.patch]]`, tolerating a leading `v`.
    /// Returns `None` for anything else; callers decide whether that is
    /// a hard error or a diagnostic.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_start_matches(['v', 'V']);
        if trimmed.is_empty() {
            return None;
        }

        let mut parts = trimmed.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(part) => part.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// The (major, minor) pair. Release series comparisons ignore the
    /// patch component.
    pub fn series(self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_and_three_component_forms() {
        assert_eq!(Version::parse("441.22"), Some(Version::new(441, 22)));
        assert_eq!(
            Version::parse("2.7.1"),
            Some(Version {
                major: 2,
                minor: 7,
                patch: 1
            })
        );
        assert_eq!(Version::parse("v0.5"), Some(Version::new(0, 5)));
        assert_eq!(Version::parse("3"), Some(Version::new(3, 0)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(Version::parse(""), None);
        assert_eq!(Version::parse("abc"), None);
        assert_eq!(Version::parse("1.2.3.4"), None);
        assert_eq!(Version::parse("1.x"), None);
    }

    #[test]
    fn orders_lexicographically() {
        assert!(Version::new(384, 0) < Version::new(411, 31));
        assert!(Version::new(2, 7) < Version::new(2, 8));
        assert!(Version::parse("2.7.9").unwrap() < Version::parse("2.8.0").unwrap());
    }

    #[test]
    fn series_ignores_patch() {
        assert_eq!(Version::parse("2.8.4").unwrap().series(), (2, 8));
        assert_eq!(Version::new(2, 8).series(), (2, 8));
    }
}
