//! Static catalog data: engineering subjects (with prompt guidance and
//! leaderboard score profiles) and the mock student profile endpoints.

use serde::Serialize;

/// One engineering subject offered on the dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct Subject {
  pub id: &'static str,
  pub name: &'static str,
  pub icon: &'static str,
  pub description: &'static str,
  /// Focus areas injected into the question generation prompt.
  #[serde(skip)]
  pub guidance: &'static str,
  /// Leaderboard distribution: top score and spread across ranks.
  #[serde(skip)]
  pub base_score: f64,
  #[serde(skip)]
  pub variation: f64,
}

pub const SUBJECTS: &[Subject] = &[
  Subject {
    id: "ME", name: "Mechanical Engineering", icon: "🔧",
    description: "Study of mechanical systems, thermodynamics, and manufacturing",
    guidance: "Focus on thermodynamics, fluid mechanics, machine design, material strength, and dynamics.",
    base_score: 75.0, variation: 20.0,
  },
  Subject {
    id: "EE", name: "Electrical Engineering", icon: "⚡",
    description: "Study of electrical systems, electronics, and power generation",
    guidance: "Focus on circuit theory, electromagnetic fields, power systems, signal processing, and electronic devices.",
    base_score: 70.0, variation: 25.0,
  },
  Subject {
    id: "CE", name: "Civil Engineering", icon: "🏗️",
    description: "Study of design and construction of physical structures and infrastructure",
    guidance: "Focus on structural analysis, soil mechanics, hydraulics, construction materials, and transportation systems.",
    base_score: 78.0, variation: 18.0,
  },
  Subject {
    id: "CMP", name: "Computer Engineering", icon: "💻",
    description: "Study of computer hardware, software, and systems integration",
    guidance: "Focus on computer architecture, digital design, networking, operating systems, and embedded systems.",
    base_score: 82.0, variation: 15.0,
  },
  Subject {
    id: "CHE", name: "Chemical Engineering", icon: "🧪",
    description: "Study of chemical processes and product development",
    guidance: "Focus on thermodynamics, reactor design, mass transfer, fluid flow, and process control.",
    base_score: 73.0, variation: 22.0,
  },
  Subject {
    id: "AE", name: "Aerospace Engineering", icon: "🚀",
    description: "Study of aircraft and spacecraft design and production",
    guidance: "Focus on aerodynamics, propulsion, aircraft structures, flight dynamics, and control systems.",
    base_score: 68.0, variation: 28.0,
  },
  Subject {
    id: "BME", name: "Biomedical Engineering", icon: "🩺",
    description: "Application of engineering principles to medicine and biology",
    guidance: "",
    base_score: 76.0, variation: 19.0,
  },
  Subject {
    id: "IE", name: "Industrial Engineering", icon: "🏭",
    description: "Study of process optimization and efficiency in production systems",
    guidance: "",
    base_score: 80.0, variation: 16.0,
  },
  Subject {
    id: "SE", name: "Software Engineering", icon: "📱",
    description: "Application of engineering principles to software development",
    guidance: "Focus on software design principles, algorithms, data structures, software testing, and system architecture.",
    base_score: 85.0, variation: 12.0,
  },
  Subject {
    id: "MS", name: "Materials Science", icon: "🔬",
    description: "Study of properties and applications of various materials",
    guidance: "",
    base_score: 72.0, variation: 23.0,
  },
];

/// Score profile for subjects outside the catalog.
pub const DEFAULT_SCORE_PROFILE: (f64, f64) = (80.0, 20.0);

pub fn subject(name: &str) -> Option<&'static Subject> {
  SUBJECTS.iter().find(|s| s.name == name)
}

/// Prompt guidance for a topic; empty when the topic has no specific focus areas.
pub fn guidance_for(topic: &str) -> &'static str {
  subject(topic).map(|s| s.guidance).unwrap_or("")
}

//
// Mock profile data (no persistence exists)
//

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
  pub id: &'static str,
  pub name: &'static str,
  pub email: &'static str,
  pub grade: &'static str,
  pub joined_date: &'static str,
  pub profile_image: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
  pub id: &'static str,
  pub subject: &'static str,
  pub score: u32,
  pub date: &'static str,
  pub total_questions: u32,
  pub correct_answers: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Achievement {
  pub id: &'static str,
  pub name: &'static str,
  pub description: &'static str,
  pub icon: &'static str,
  pub date: &'static str,
}

pub fn student_profile() -> StudentProfile {
  StudentProfile {
    id: "ST12345",
    name: "Alex Johnson",
    email: "alex.johnson@example.com",
    grade: "Engineering Graduate Student",
    joined_date: "2023-01-15",
    profile_image: "https://randomuser.me/api/portraits/people/1.jpg",
  }
}

pub fn assessment_history() -> Vec<AssessmentRecord> {
  vec![
    AssessmentRecord { id: "A001", subject: "Mechanical Engineering", score: 85, date: "2023-11-20", total_questions: 20, correct_answers: 17 },
    AssessmentRecord { id: "A002", subject: "Electrical Engineering", score: 78, date: "2023-12-05", total_questions: 20, correct_answers: 15 },
    AssessmentRecord { id: "A003", subject: "Computer Engineering", score: 92, date: "2024-01-10", total_questions: 25, correct_answers: 23 },
    AssessmentRecord { id: "A004", subject: "Civil Engineering", score: 80, date: "2024-01-25", total_questions: 20, correct_answers: 16 },
    AssessmentRecord { id: "A005", subject: "Software Engineering", score: 88, date: "2024-02-15", total_questions: 25, correct_answers: 22 },
  ]
}

pub fn achievements() -> Vec<Achievement> {
  vec![
    Achievement { id: "ACH001", name: "Engineering Novice", description: "Completed your first engineering assessment", icon: "🔰", date: "2023-11-20" },
    Achievement { id: "ACH002", name: "Perfect Score", description: "Achieved 100% on an assessment", icon: "🏆", date: "2023-12-15" },
    Achievement { id: "ACH003", name: "Study Streak", description: "Completed assessments for 5 days in a row", icon: "🔥", date: "2024-01-05" },
    Achievement { id: "ACH004", name: "Subject Master", description: "Achieved over 90% in 3 different engineering subjects", icon: "🎓", date: "2024-02-10" },
    Achievement { id: "ACH005", name: "Top of the Class", description: "Ranked #1 on the leaderboard for any subject", icon: "👑", date: "2024-02-20" },
  ]
}
