use serde::{Deserialize, Serialize};

/// How the question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionFormat {
    /// Pick one of four options - strict matching
    MultipleChoice,
    /// Type the missing word into a sentence - lenient matching
    FillInTheBlank,
}

impl QuestionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::FillInTheBlank => "fill-in-the-blank",
        }
    }
}

impl std::fmt::Display for QuestionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuestionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(Self::MultipleChoice),
            "fill-in-the-blank" => Ok(Self::FillInTheBlank),
            _ => Err(format!("Invalid question format: {}", s)),
        }
    }
}

/// Which language the prompt shows and which one is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    LatinToEnglish,
    EnglishToLatin,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatinToEnglish => "latin-to-english",
            Self::EnglishToLatin => "english-to-latin",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "latin-to-english" => Ok(Self::LatinToEnglish),
            "english-to-latin" => Ok(Self::EnglishToLatin),
            _ => Err(format!("Invalid direction: {}", s)),
        }
    }
}

/// A generated question, ready to be serialized to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub format: QuestionFormat,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub question_text: String,
    /// The Latin form being asked about (always present so answers can be submitted)
    pub latin_word: String,
    /// English cue shown in english-to-latin questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_word: Option<String>,
    pub correct_answer: String,
    /// Cloze sentence for fill-in-the-blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    /// Exactly four entries for multiple-choice, empty otherwise
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub latin_sentence: String,
    pub english_sentence: String,
}
