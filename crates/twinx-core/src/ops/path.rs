use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, TwinError};

/// One step of an idShort path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Child by idShort
    IdShort(String),
    /// Child of a Submodel Element List by position
    Index(usize),
}

/// Parsed dot-separated element address, e.g. `sensors.list[2].value`
///
/// The empty path addresses the root container of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IdShortPath {
    segments: Vec<PathSegment>,
}

impl IdShortPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path string
    ///
    /// # Errors
    /// * `InvalidPath` - empty segment, unbalanced bracket or non-numeric index
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self::root());
        }

        let invalid = |reason: &str| TwinError::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        for part in raw.split('.') {
            if part.is_empty() {
                return Err(invalid("empty segment"));
            }

            let (name, mut rest) = match part.find('[') {
                Some(i) => part.split_at(i),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(invalid("index without a list idShort"));
            }
            if name.contains(']') {
                return Err(invalid("unbalanced bracket"));
            }
            segments.push(PathSegment::IdShort(name.to_string()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(|| invalid("unbalanced bracket"))?;
                let digits = rest
                    .get(1..close)
                    .filter(|d| rest.starts_with('[') && !d.is_empty())
                    .ok_or_else(|| invalid("malformed index"))?;
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| invalid("index is not a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of a child addressed by idShort
    pub fn child(&self, id_short: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::IdShort(id_short.into()));
        Self { segments }
    }

    /// Path of a list child addressed by position
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Split into the parent path and the final segment; `None` for the root
    pub fn split_last(&self) -> Option<(IdShortPath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            IdShortPath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }
}

impl fmt::Display for IdShortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::IdShort(id) if i == 0 => f.write_str(id)?,
                PathSegment::IdShort(id) => write!(f, ".{}", id)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl FromStr for IdShortPath {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Check that an idShort can be used as a path segment
///
/// Rules: non-empty, starts with an ASCII letter, only ASCII alphanumerics,
/// `_` and `-`.
///
/// # Errors
/// * `InvalidIdShort` - if any rule is violated
pub fn validate_id_short(id_short: &str) -> Result<()> {
    let invalid = |reason: &str| TwinError::InvalidIdShort {
        id_short: id_short.to_string(),
        reason: reason.to_string(),
    };

    let first = id_short
        .chars()
        .next()
        .ok_or_else(|| invalid("idShort cannot be empty"))?;
    if !first.is_ascii_alphabetic() {
        return Err(invalid("idShort must start with a letter"));
    }
    if let Some(bad) = id_short
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(invalid(&format!("character '{}' is not allowed", bad)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_root() {
        let p = IdShortPath::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.to_string(), "");
    }

    #[test]
    fn test_parse_dotted() {
        let p = IdShortPath::parse("a.b.c").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::IdShort("a".into()),
                PathSegment::IdShort("b".into()),
                PathSegment::IdShort("c".into()),
            ]
        );
        assert_eq!(p.to_string(), "a.b.c");
    }

    #[test]
    fn test_parse_list_indices() {
        let p = IdShortPath::parse("list[2][0].x").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::IdShort("list".into()),
                PathSegment::Index(2),
                PathSegment::Index(0),
                PathSegment::IdShort("x".into()),
            ]
        );
        assert_eq!(p.to_string(), "list[2][0].x");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["a..b", ".a", "a.", "[0]", "a[", "a[x]", "a[]", "a]b", "a[1]x"] {
            assert!(
                matches!(IdShortPath::parse(bad), Err(TwinError::InvalidPath { .. })),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_split_last() {
        let p = IdShortPath::parse("a.b").unwrap();
        let (parent, last) = p.split_last().unwrap();
        assert_eq!(parent.to_string(), "a");
        assert_eq!(last, &PathSegment::IdShort("b".into()));
        assert!(IdShortPath::root().split_last().is_none());
    }

    #[test]
    fn test_validate_id_short() {
        assert!(validate_id_short("temperature_1").is_ok());
        assert!(validate_id_short("max-speed").is_ok());
        assert!(validate_id_short("").is_err());
        assert!(validate_id_short("1abc").is_err());
        assert!(validate_id_short("a.b").is_err());
        assert!(validate_id_short("a[0]").is_err());
    }
}
