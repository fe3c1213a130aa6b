use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Category tag attached to a mod package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    /// Text and dialogue edits
    TextEdit,
    /// Cosmetic changes (sprites, music, fonts)
    Customization,
    /// Gameplay changes
    Gameplay,
    /// Anything else
    Other,
}
impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextEdit => "textedit",
            Self::Customization => "customization",
            Self::Gameplay => "gameplay",
            Self::Other => "other",
        }
    }

    /// Deserializes a tag list, silently dropping values this model does
    /// not know about.
    pub(crate) fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<Tag>, D::Error> {
        let raw = Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(raw.iter().filter_map(|s| s.parse().ok()).collect())
    }
}
impl FromStr for Tag {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "textedit" | "text" | "translation" => Self::TextEdit,
            "customization" | "customisation" | "cosmetic" => Self::Customization,
            "gameplay" => Self::Gameplay,
            "other" => Self::Other,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "tags",
                value: format!("unknown tag: {}", s)
            }),
        })
    }
}
impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("textedit", Tag::TextEdit)]
    #[case("Text Edit", Tag::TextEdit)]
    #[case("customization", Tag::Customization)]
    #[case("GAMEPLAY", Tag::Gameplay)]
    #[case("other", Tag::Other)]
    fn test_from_str(#[case] input: &str, #[case] expected: Tag) {
        assert_eq!(input.parse::<Tag>().unwrap(), expected);
    }

    #[test]
    fn test_from_str_invalid() {
        assert!("nsfw".parse::<Tag>().is_err());
    }
}
