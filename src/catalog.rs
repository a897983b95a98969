use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// The bundled question battery, embedded into the binary at compile time.
const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Neuroticism,
    Extraversion,
    Conscientiousness,
    Agreeableness,
    Openness,
}

impl Category {
    /// All five traits in display order.
    pub const ALL: [Category; 5] = [
        Category::Neuroticism,
        Category::Extraversion,
        Category::Conscientiousness,
        Category::Agreeableness,
        Category::Openness,
    ];

    /// Return the string representation matching the serde serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Neuroticism => "neuroticism",
            Category::Extraversion => "extraversion",
            Category::Conscientiousness => "conscientiousness",
            Category::Agreeableness => "agreeableness",
            Category::Openness => "openness",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Neuroticism => "Neuroticism",
            Category::Extraversion => "Extraversion",
            Category::Conscientiousness => "Conscientiousness",
            Category::Agreeableness => "Agreeableness",
            Category::Openness => "Openness",
        }
    }

    /// Color name used for this trait's badge, bar and radar axis.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Neuroticism => "magenta",
            Category::Extraversion => "green",
            Category::Conscientiousness => "blue",
            Category::Agreeableness => "pink",
            Category::Openness => "yellow",
        }
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub category: Category,
    /// Carried for display only. Inversion belongs to the scoring service.
    pub is_reverse: bool,
}

// ---------------------------------------------------------------------------
// Likert scale
// ---------------------------------------------------------------------------

/// One of the five answer choices shown under every question.
pub struct LikertOption {
    pub value: u8,
    pub label: &'static str,
    pub description: &'static str,
}

pub const LIKERT_OPTIONS: [LikertOption; 5] = [
    LikertOption {
        value: 1,
        label: "Strongly disagree",
        description: "Not like me at all",
    },
    LikertOption {
        value: 2,
        label: "Disagree",
        description: "Not much like me",
    },
    LikertOption {
        value: 3,
        label: "Neutral",
        description: "Neither",
    },
    LikertOption {
        value: 4,
        label: "Agree",
        description: "Somewhat like me",
    },
    LikertOption {
        value: 5,
        label: "Strongly agree",
        description: "Very much like me",
    },
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Ordered, immutable list of questions. Loaded once at startup.
#[derive(Clone, Debug)]
pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    /// Build a catalog, rejecting empty lists, blank texts and duplicate ids.
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            bail!("question catalog is empty");
        }

        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                bail!("duplicate question id {} in catalog", q.id);
            }
            if q.text.trim().is_empty() {
                bail!("question {} has no text", q.id);
            }
        }

        Ok(Self { questions })
    }

    /// The battery shipped with the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_QUESTIONS).context("bundled question catalog is invalid")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(raw)?;
        Self::new(questions)
    }

    /// Load a replacement catalog from a JSON file (an array of questions).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid catalog {}", path.display()))
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.questions.iter().map(|q| q.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
