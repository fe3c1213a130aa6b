use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::ChapterKey;
use crate::error::{Error, ErrorKind};

/// Stable identity binding a package entry to optional in-memory bytes.
///
/// A slot id is derived from the chapter key and, for extra files, the
/// extra file's `key`. It is never derived from a file name or URL, so
/// editing those fields keeps previously bound bytes attached.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotId {
    /// `<chapter>:data_file`
    DataFile { chapter: ChapterKey },
    /// `<chapter>:extra:<key>`
    Extra { chapter: ChapterKey, key: String },
    /// `icon`
    Icon,
}
impl SlotId {
    pub fn data_file(chapter: impl Into<ChapterKey>) -> Self {
        Self::DataFile { chapter: chapter.into() }
    }

    pub fn extra(chapter: impl Into<ChapterKey>, key: impl Into<String>) -> Self {
        Self::Extra { chapter: chapter.into(), key: key.into() }
    }

    pub fn chapter(&self) -> Option<&ChapterKey> {
        match self {
            Self::DataFile { chapter } | Self::Extra { chapter, .. } => Some(chapter),
            Self::Icon => None,
        }
    }
}
impl FromStr for SlotId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "icon" {
            return Ok(Self::Icon);
        }
        let invalid = || ErrorKind::ParseError {
            field: "slot",
            value: s.to_string(),
        };
        let Some((chapter, role)) = s.split_once(':') else {
            exn::bail!(invalid());
        };
        if chapter.is_empty() {
            exn::bail!(invalid());
        }
        match role {
            "data_file" => Ok(Self::data_file(chapter)),
            _ => match role.strip_prefix("extra:") {
                Some(key) if !key.is_empty() => Ok(Self::extra(chapter, key)),
                _ => exn::bail!(invalid()),
            },
        }
    }
}
impl Display for SlotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::DataFile { chapter } => write!(f, "{chapter}:data_file"),
            Self::Extra { chapter, key } => write!(f, "{chapter}:extra:{key}"),
            Self::Icon => write!(f, "icon"),
        }
    }
}
