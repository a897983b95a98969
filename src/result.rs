use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Maximum value on the scoring scale.
pub const SCALE_MAX: f64 = 5.0;

/// Trait scores as returned by the scoring service. Every field is required;
/// a body missing any of them is a malformed response.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ResultSet {
    pub neuroticism: f64,
    pub extraversion: f64,
    pub conscientiousness: f64,
    pub agreeableness: f64,
    pub openness: f64,
}

impl ResultSet {
    pub fn score(&self, category: Category) -> f64 {
        match category {
            Category::Neuroticism => self.neuroticism,
            Category::Extraversion => self.extraversion,
            Category::Conscientiousness => self.conscientiousness,
            Category::Agreeableness => self.agreeableness,
            Category::Openness => self.openness,
        }
    }

    /// `(trait, raw score)` pairs in display order.
    pub fn scores(&self) -> [(Category, f64); 5] {
        Category::ALL.map(|c| (c, self.score(c)))
    }
}

/// Fraction of the scale a score fills, clamped for display widgets.
pub fn magnitude(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    (score / SCALE_MAX).clamp(0.0, 1.0)
}

/// Format a score the way the result panel shows it.
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Plain-text rendition of the scores for stdout: label, value and a bar of
/// `#` characters, one per half point.
pub fn summary_lines(result: &ResultSet) -> Vec<String> {
    let width = Category::ALL
        .iter()
        .map(|c| c.label().len())
        .max()
        .unwrap_or(0);
    result
        .scores()
        .iter()
        .map(|(category, score)| {
            let filled = (magnitude(*score) * 10.0).round() as usize;
            format!(
                "{:<width$}  {:>4}  [{}{}]",
                category.label(),
                format_score(*score),
                "#".repeat(filled),
                " ".repeat(10 - filled),
                width = width
            )
        })
        .collect()
}

/// Radar chart vertices on a unit circle, one axis per trait, starting at
/// 12 o'clock and going clockwise.
pub fn radar_vertices(result: &ResultSet) -> [(f64, f64); 5] {
    let scores = result.scores();
    let mut out = [(0.0, 0.0); 5];
    for (i, (_, score)) in scores.iter().enumerate() {
        let (x, y) = axis_direction(i);
        let r = magnitude(*score);
        out[i] = (x * r, y * r);
    }
    out
}

/// Unit vector of radar axis `i` (0..5).
pub fn axis_direction(i: usize) -> (f64, f64) {
    let angle = std::f64::consts::FRAC_PI_2 - (i as f64) * std::f64::consts::TAU / 5.0;
    (angle.cos(), angle.sin())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
