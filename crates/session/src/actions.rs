//! One-click canned questions.

use std::str::FromStr;

use docchat_core::Error;

/// A fixed question offered in place of free text.
///
/// Running an action is exactly the same as typing its [`question`](Self::question).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedAction {
    Roast,
    Score,
    KeyImprovements,
}

impl CannedAction {
    pub const ALL: [CannedAction; 3] = [Self::Roast, Self::Score, Self::KeyImprovements];

    /// The literal question sent as the user turn.
    pub fn question(self) -> &'static str {
        match self {
            Self::Roast => "Roast this resume ruthlessly. Tell me why I won't get hired.",
            Self::Score => {
                "Rate this resume out of 100 based on internship standards and explain the score."
            }
            Self::KeyImprovements => "What are the top 3 specific things I must change to get hired?",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Roast => "Roast My Resume",
            Self::Score => "Probability Score",
            Self::KeyImprovements => "Key Improvements",
        }
    }

    /// The short name used on the command line and as a slash command.
    pub fn command(self) -> &'static str {
        match self {
            Self::Roast => "roast",
            Self::Score => "score",
            Self::KeyImprovements => "improve",
        }
    }
}

impl FromStr for CannedAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "roast" => Ok(Self::Roast),
            "score" | "probability" => Ok(Self::Score),
            "improve" | "improvements" | "key-improvements" => Ok(Self::KeyImprovements),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl std::fmt::Display for CannedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
