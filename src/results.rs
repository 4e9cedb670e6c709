//! Results aggregation: enriches a completed run's payload for the results page
//! (synthetic leaderboard, strengths/weaknesses tags).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::assessment::{AssessmentResult, DetailedResult};
use crate::catalog::{subject, DEFAULT_SCORE_PROFILE};

const LEADERBOARD_NAMES: [&str; 12] = [
    "Alex Thompson", "Jordan Lee", "Taylor Morgan", "Casey Wilson",
    "Jamie Rivera", "Riley Johnson", "Quinn Brown", "Avery Garcia",
    "Morgan Chen", "Jordan Parker", "Sam Patel", "Drew Johnson",
];

const MIN_SCORE: i64 = 40;
const MAX_SCORE: i64 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u32,
    pub subject: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicTags {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// What the results page needs for one completed run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub topic: String,
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
    pub detailed_results: Vec<DetailedResult>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// Synthetic leaderboard: top ranks near the subject's base score, lower ranks
/// spread by its variation, ±5 jitter, clamped and sorted descending.
pub fn leaderboard<R: Rng>(subject_name: &str, rng: &mut R) -> Vec<LeaderboardEntry> {
    let (base, variation) = subject(subject_name)
        .map(|s| (s.base_score, s.variation))
        .unwrap_or(DEFAULT_SCORE_PROFILE);
    let n = LEADERBOARD_NAMES.len() as f64;

    let mut entries: Vec<LeaderboardEntry> = LEADERBOARD_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let jitter = rng.gen::<f64>() * 10.0 - 5.0;
            let raw = (base - variation * (i as f64 / n) + jitter).round() as i64;
            LeaderboardEntry {
                name: name.to_string(),
                score: raw.clamp(MIN_SCORE, MAX_SCORE) as u32,
                subject: subject_name.to_string(),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

/// Fixed strengths/weaknesses per topic; unknown topics get generic tags.
pub fn topic_tags(topic: &str) -> TopicTags {
    let (strengths, weaknesses): (&[&str], &[&str]) = match topic {
        "Mechanical Engineering" => (&["Thermodynamics", "Machine Design"], &["Fluid Mechanics", "Material Science"]),
        "Electrical Engineering" => (&["Circuit Theory", "Signal Processing"], &["Power Systems", "Digital Electronics"]),
        "Civil Engineering" => (&["Structural Analysis", "Construction Materials"], &["Soil Mechanics", "Hydraulics"]),
        "Computer Engineering" => (&["Computer Architecture", "Digital Logic"], &["Computer Networks", "Operating Systems"]),
        "Chemical Engineering" => (&["Process Design", "Chemical Kinetics"], &["Thermodynamics", "Unit Operations"]),
        "Aerospace Engineering" => (&["Aerodynamics", "Aircraft Structures"], &["Propulsion Systems", "Flight Dynamics"]),
        "Biomedical Engineering" => (&["Medical Imaging", "Biomaterials"], &["Biomechanics", "Biosignals"]),
        "Industrial Engineering" => (&["Operations Research", "Manufacturing Processes"], &["Quality Control", "Ergonomics"]),
        "Software Engineering" => (&["Software Design", "Algorithm Analysis"], &["Software Testing", "System Architecture"]),
        "Materials Science" => (&["Material Properties", "Crystallography"], &["Polymer Science", "Corrosion"]),
        "Math" => (&["Algebra", "Statistics"], &["Calculus", "Geometry"]),
        "Science" => (&["Biology", "Chemistry"], &["Physics", "Astronomy"]),
        "History" => (&["Modern History", "European History"], &["Ancient History", "Asian History"]),
        _ => (&["General Knowledge"], &["Specialized Topics"]),
    };
    TopicTags {
        strengths: strengths.iter().map(|s| s.to_string()).collect(),
        weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
    }
}

/// Consume a completion payload and build the report.
pub fn build_report<R: Rng>(result: AssessmentResult, topic: &str, rng: &mut R) -> ResultsReport {
    let percentage = result.percentage();
    let TopicTags { strengths, weaknesses } = topic_tags(topic);
    ResultsReport {
        topic: topic.to_string(),
        score: result.score,
        total: result.total,
        percentage,
        detailed_results: result.detailed_results,
        leaderboard: leaderboard(topic, rng),
        strengths,
        weaknesses,
    }
}
