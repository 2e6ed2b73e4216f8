use serde::Serialize;
use std::fmt;

/// Qualitative band for a 0–1 network score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreLabel {
    Good,
    Average,
    Poor,
}

impl ScoreLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreLabel::Good => "Good",
            ScoreLabel::Average => "Average",
            ScoreLabel::Poor => "Poor",
        }
    }
}

impl fmt::Display for ScoreLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a score into a label. Total over all inputs; values outside
/// 0–1 use the same thresholds and NaN is `Poor`.
///
/// | Range   | Label   |
/// |---------|---------|
/// | >= 0.65 | Good    |
/// | >= 0.45 | Average |
/// | < 0.45  | Poor    |
pub fn score_label(score: f64) -> ScoreLabel {
    match score {
        s if s >= 0.65 => ScoreLabel::Good,
        s if s >= 0.45 => ScoreLabel::Average,
        _ => ScoreLabel::Poor,
    }
}
