use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Title a mod package targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    /// DELTARUNE (full release, chapters 0 through 4)
    #[default]
    Deltarune,
    /// DELTARUNE Chapter 1&2 demo
    DeltaruneDemo,
    /// UNDERTALE
    Undertale,
    /// Undertale Yellow
    UndertaleYellow,
    /// Pizza Tower
    PizzaTower,
}
impl Game {
    /// Returns the canonical identifier used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deltarune => "deltarune",
            Self::DeltaruneDemo => "deltarunedemo",
            Self::Undertale => "undertale",
            Self::UndertaleYellow => "undertaleyellow",
            Self::PizzaTower => "pizzatower",
        }
    }

    /// Chapter keys a package for this game may populate, in display order.
    pub fn chapters(&self) -> &'static [&'static str] {
        match self {
            Self::Deltarune => &["0", "1", "2", "3", "4"],
            Self::DeltaruneDemo => &["demo"],
            Self::Undertale => &["undertale"],
            Self::UndertaleYellow => &["undertaleyellow"],
            Self::PizzaTower => &["pizzatower"],
        }
    }

    /// Folder used for the root chapter (`"0"`) of single-chapter titles.
    ///
    /// Multi-chapter titles return `None` and use the generic `chapter_0`.
    pub fn root_folder(&self) -> Option<&'static str> {
        match self {
            Self::Deltarune | Self::DeltaruneDemo => None,
            Self::Undertale | Self::UndertaleYellow | Self::PizzaTower => Some(self.as_str()),
        }
    }
}
impl FromStr for Game {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "deltarune" => Self::Deltarune,
            "deltarunedemo" | "demo" => Self::DeltaruneDemo,
            "undertale" => Self::Undertale,
            "undertaleyellow" | "uty" => Self::UndertaleYellow,
            "pizzatower" => Self::PizzaTower,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "game",
                value: s.to_string()
            }),
        })
    }
}
impl Display for Game {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
