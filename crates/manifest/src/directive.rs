use std::fmt::{Display, Formatter};

use deltahub_model::ChapterKey;
use deltahub_model::paths::{basename, normalize};

/// How a directive's source is applied to its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchKind {
    /// Binary delta applied to the chapter's main data file.
    Xdelta,
    /// Wholesale replacement of a game file.
    Override,
    /// Anything else; the converter ignores these.
    Other(String),
}
impl PatchKind {
    /// Parses a manifest `type` attribute, case-insensitively.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "xdelta" | "vcdiff" => Self::Xdelta,
            "override" | "replace" => Self::Override,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    /// Infers the kind of a directive that does not declare one.
    ///
    /// Targets naming a main data file, or delta-encoded sources, are
    /// xdelta patches; everything else replaces the target.
    pub fn infer(source: &str, target: &str) -> Self {
        let target = basename(target).to_lowercase();
        let source = source.to_lowercase();
        if matches!(target.as_str(), "data.win" | "game.ios" | "game.unx" | "game.droid")
            || source.ends_with(".xdelta")
            || source.ends_with(".vcdiff")
        {
            Self::Xdelta
        } else {
            Self::Override
        }
    }
}
impl Display for PatchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xdelta => f.write_str("xdelta"),
            Self::Override => f.write_str("override"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// One *"apply `source` to `target`"* instruction from a foreign manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDirective {
    /// Explicit chapter attribute. Only consulted when the target path
    /// itself names no chapter.
    pub chapter: Option<ChapterKey>,
    /// Path of the patch payload inside the foreign archive.
    pub source: String,
    /// Path of the patched file inside the game installation.
    pub target: String,
    pub kind: PatchKind,
}
impl PatchDirective {
    pub fn new(source: impl AsRef<str>, target: impl AsRef<str>, kind: PatchKind) -> Self {
        Self {
            chapter: None,
            source: normalize(source.as_ref()),
            target: normalize(target.as_ref()),
            kind,
        }
    }

    /// Builds a directive from raw manifest attributes, inferring the kind
    /// when `kind` is missing or blank.
    pub(crate) fn from_attributes(
        chapter: Option<&str>,
        source: Option<&str>,
        target: Option<&str>,
        kind: Option<&str>,
    ) -> Self {
        let source = source.unwrap_or_default();
        let target = target.unwrap_or_default();
        let kind = match kind.map(str::trim).filter(|kind| !kind.is_empty()) {
            Some(kind) => PatchKind::parse(kind),
            None => PatchKind::infer(source, target),
        };
        Self {
            chapter: chapter.map(str::trim).filter(|chapter| !chapter.is_empty()).map(ChapterKey::new),
            ..Self::new(source, target, kind)
        }
    }
}
