//! Target path resolution.
//!
//! Foreign manifests address patched files by their path inside the game
//! installation (`chapter2_windows/sprites/a.png`). The canonical model
//! only cares about which chapter owns the file and where the file sits
//! relative to that chapter's root.

use deltahub_model::ChapterKey;
use deltahub_model::paths::{basename, dirname, normalize};

use crate::consts::{CHAPTER_ROOT_REGEX, CHAPTER_TOKEN_REGEX};

/// Location of a foreign target path in chapter terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Owning chapter, or `None` when the path names no file at all.
    pub chapter: Option<ChapterKey>,
    /// Directory relative to the chapter root, with a trailing `/`; empty
    /// when the file sits directly under the chapter root.
    pub relative_dir: String,
    pub filename: String,
}
impl ResolvedPath {
    /// Path relative to the chapter root (`relative_dir + filename`).
    pub fn relative_path(&self) -> String {
        format!("{}{}", self.relative_dir, self.filename)
    }

    /// Flat identifier for an override payload: the relative path with
    /// every separator (and the extension dot) replaced by `_`.
    ///
    /// ```
    /// use deltahub_manifest::resolve;
    /// assert_eq!(resolve("chapter1_windows/sprites/x.png").archive_key(), "sprites_x_png");
    /// ```
    pub fn archive_key(&self) -> String {
        let key = self.relative_path().replace(['/', '\\', '.'], "_");
        match key.is_empty() {
            true => self.filename.clone(),
            false => key,
        }
    }
}

/// Resolves a foreign target path; see [`resolve_with_hint`].
pub fn resolve(target: &str) -> ResolvedPath {
    resolve_with_hint(target, None)
}

/// Resolves a foreign target path into chapter, relative directory and
/// file name.
///
/// Chapter detection, in order:
/// 1. any case-insensitive `demo` in the path selects the demo chapter,
/// 2. the first `chapterN` token selects chapter `N`,
/// 3. otherwise `hint` (an explicit chapter attribute on the directive)
///    or the root chapter `"0"`.
///
/// Everything up to and including the chapter root directory (for example
/// `chapter2_windows/`) is then stripped before splitting the remainder at
/// its last `/`.
///
/// ```
/// use deltahub_manifest::resolve;
/// use deltahub_model::ChapterKey;
///
/// let resolved = resolve("chapter2_windows/sprites/a.png");
/// assert_eq!(resolved.chapter, Some(ChapterKey::new("2")));
/// assert_eq!(resolved.relative_dir, "sprites/");
/// assert_eq!(resolved.filename, "a.png");
///
/// let resolved = resolve("loose.png");
/// assert_eq!(resolved.chapter, Some(ChapterKey::root()));
/// assert_eq!(resolved.relative_dir, "");
/// ```
pub fn resolve_with_hint(target: &str, hint: Option<&ChapterKey>) -> ResolvedPath {
    let path = normalize(target);
    let chapter = if path.to_lowercase().contains("demo") {
        Some(ChapterKey::demo())
    } else if let Some(number) = chapter_token(&path) {
        Some(ChapterKey::numbered(number))
    } else {
        Some(hint.cloned().unwrap_or_else(ChapterKey::root))
    };
    let stripped = CHAPTER_ROOT_REGEX.replace(&path, "");
    let filename = basename(&stripped).to_string();
    if filename.is_empty() {
        return ResolvedPath {
            chapter: None,
            relative_dir: String::new(),
            filename,
        };
    }
    ResolvedPath {
        chapter,
        relative_dir: dirname(&stripped).to_string(),
        filename,
    }
}

fn chapter_token(path: &str) -> Option<u32> {
    CHAPTER_TOKEN_REGEX.captures(path).and_then(|captures| captures.get(1)).and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("chapter2_windows/sprites/a.png", Some("2"), "sprites/", "a.png")]
    #[case("./chapter2_windows/sprites/a.png", Some("2"), "sprites/", "a.png")]
    #[case("chapter2_windows\\sprites\\a.png", Some("2"), "sprites/", "a.png")]
    #[case("demo/data.win", Some("demo"), "", "data.win")]
    #[case("DEMO_windows/lang/en.json", Some("demo"), "lang/", "en.json")]
    #[case("loose.png", Some("0"), "", "loose.png")]
    #[case("chapter1_windows/data.win", Some("1"), "", "data.win")]
    #[case("game/Chapter3_Mac/mus/song.ogg", Some("3"), "mus/", "song.ogg")]
    #[case("chapter4/data.win", Some("4"), "", "data.win")]
    #[case("lang/en.json", Some("0"), "lang/", "en.json")]
    // First chapter token wins.
    #[case("chapter1_windows/chapter2/x.png", Some("1"), "chapter2/", "x.png")]
    fn test_resolve(
        #[case] target: &str,
        #[case] chapter: Option<&str>,
        #[case] relative_dir: &str,
        #[case] filename: &str,
    ) {
        let resolved = resolve(target);
        assert_eq!(resolved.chapter, chapter.map(ChapterKey::new));
        assert_eq!(resolved.relative_dir, relative_dir);
        assert_eq!(resolved.filename, filename);
    }

    #[rstest]
    #[case("")]
    #[case("./")]
    #[case("chapter1_windows/")]
    fn test_unresolvable(#[case] target: &str) {
        assert_eq!(resolve(target).chapter, None);
    }

    #[test]
    fn test_hint_only_replaces_default() {
        let hint = ChapterKey::new("3");
        assert_eq!(resolve_with_hint("lang/en.json", Some(&hint)).chapter, Some(hint.clone()));
        assert_eq!(resolve_with_hint("chapter1_windows/x.png", Some(&hint)).chapter, Some(ChapterKey::new("1")));
    }

    #[rstest]
    #[case("chapter1_windows/sprites/x.png", "sprites_x_png")]
    #[case("chapter1_windows/data.win", "data_win")]
    #[case("a/b/c.d.e", "a_b_c_d_e")]
    fn test_archive_key(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(resolve(target).archive_key(), expected);
    }
}
