use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::Game;

/// Key of a chapter inside [`ModPackage::files`](crate::ModPackage::files).
///
/// Numbered chapters are stored as their decimal number (`"0"` is the
/// root/menu chapter); named chapters (`"demo"`, single-chapter titles) keep
/// their name. Construction normalizes the common spellings found in the
/// wild, so `"menu"`, `"chapter0"` and `"00"` all become `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChapterKey(String);
impl ChapterKey {
    pub const DEMO: &'static str = "demo";
    pub const ROOT: &'static str = "0";

    pub fn new(key: impl AsRef<str>) -> Self {
        let trimmed = key.as_ref().trim();
        let lowered = trimmed.to_lowercase();
        if lowered == "menu" || lowered == "root" {
            return Self::root();
        }
        let digits = lowered.strip_prefix("chapter").map(|s| s.trim_start_matches(['_', ' '])).unwrap_or(lowered.as_str());
        match digits.parse::<u32>() {
            Ok(number) => Self::numbered(number),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn numbered(number: u32) -> Self {
        Self(number.to_string())
    }

    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn demo() -> Self {
        Self(Self::DEMO.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the chapter number for numbered chapters.
    pub fn number(&self) -> Option<u32> {
        self.0.parse().ok()
    }

    /// Folder that holds this chapter's files inside a packed archive.
    ///
    /// Named chapters use their literal name, numbered chapters use
    /// `chapter_<n>`; the root chapter of a single-chapter title uses that
    /// title's folder instead.
    ///
    /// ```
    /// use deltahub_model::{ChapterKey, Game};
    /// assert_eq!(ChapterKey::new("2").folder_name(Game::Deltarune), "chapter_2");
    /// assert_eq!(ChapterKey::new("0").folder_name(Game::Deltarune), "chapter_0");
    /// assert_eq!(ChapterKey::new("0").folder_name(Game::Undertale), "undertale");
    /// assert_eq!(ChapterKey::new("demo").folder_name(Game::DeltaruneDemo), "demo");
    /// ```
    pub fn folder_name(&self, game: Game) -> String {
        match self.number() {
            Some(0) => match game.root_folder() {
                Some(folder) => folder.to_string(),
                None => "chapter_0".to_string(),
            },
            Some(n) => format!("chapter_{n}"),
            None => self.0.clone(),
        }
    }
}
impl From<String> for ChapterKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
impl From<&str> for ChapterKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<ChapterKey> for String {
    fn from(value: ChapterKey) -> Self {
        value.0
    }
}
impl AsRef<str> for ChapterKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Display for ChapterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}
