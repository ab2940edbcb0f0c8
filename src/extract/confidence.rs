use super::Fields;

pub const BASE: f64 = 0.35;
pub const TITLE_WEIGHT: f64 = 0.25;
pub const COMPANY_WEIGHT: f64 = 0.25;
pub const LOCATION_WEIGHT: f64 = 0.15;
pub const CAP: f64 = 0.9;

/// Heuristic confidence from field presence alone.
pub fn score(fields: &Fields) -> f64 {
    let mut score = BASE;
    if !fields.job_title.is_empty() {
        score += TITLE_WEIGHT;
    }
    if !fields.company.is_empty() {
        score += COMPANY_WEIGHT;
    }
    if !fields.location.is_empty() {
        score += LOCATION_WEIGHT;
    }
    score.min(CAP)
}
