//! Seed data: built-in fallback questions per topic, and the `SeedBank`
//! fallback provider that serves them (after any TOML-configured bank).

use std::collections::HashMap;

use tracing::{debug, error};

use crate::assessment::FallbackProvider;
use crate::config::QuestionCfg;
use crate::domain::{Difficulty, Question, RunRequest};

/// (question, options, correct option, explanation)
type Seed = (&'static str, [&'static str; 4], &'static str, &'static str);

const MECHANICAL: &[Seed] = &[
  ("What is the primary function of a heat exchanger?",
   ["To convert mechanical energy to heat", "To transfer heat between two or more fluids", "To increase fluid pressure", "To reduce fluid velocity"],
   "To transfer heat between two or more fluids",
   "Heat exchangers move heat between fluids across a separating surface without mixing them. Converting energy, raising pressure and restricting flow are the jobs of other components."),
  ("Which law of thermodynamics states that energy cannot be created or destroyed?",
   ["Zeroth Law", "First Law", "Second Law", "Third Law"],
   "First Law",
   "The First Law is conservation of energy. The Zeroth Law covers thermal equilibrium, the Second entropy, and the Third behaviour near absolute zero."),
  ("What does the term 'factor of safety' refer to in mechanical design?",
   ["The ratio of ultimate stress to working stress", "The margin against failure", "The efficiency of a machine", "The operational lifetime of a component"],
   "The ratio of ultimate stress to working stress",
   "The factor of safety is ultimate stress divided by working stress. It covers uncertainty in material properties and loading."),
  ("Which material property describes the ability to deform plastically without fracture?",
   ["Elasticity", "Ductility", "Hardness", "Toughness"],
   "Ductility",
   "Ductility is permanent deformation without fracture. Elasticity is recovery of shape, hardness is resistance to indentation, toughness is energy absorbed before fracture."),
  ("What is the purpose of a flywheel in a mechanical system?",
   ["To reduce friction", "To increase power", "To store rotational energy", "To change direction of motion"],
   "To store rotational energy",
   "A flywheel's moment of inertia stores rotational energy and smooths torque fluctuations in engines and presses."),
];

const ELECTRICAL: &[Seed] = &[
  ("Ohm's Law states the relationship between which quantities?",
   ["Current, voltage, and resistance", "Force, mass, and acceleration", "Energy, power, and time", "Distance, velocity, and time"],
   "Current, voltage, and resistance",
   "Ohm's Law is I = V/R. The other options describe Newton's second law, power and kinematics."),
  ("What is the unit of electrical capacitance?",
   ["Ohm", "Farad", "Henry", "Tesla"],
   "Farad",
   "Capacitance is measured in farads. Ohms measure resistance, henries inductance and teslas magnetic flux density."),
  ("Which semiconductor device is used as a voltage regulator?",
   ["Transistor", "Zener diode", "LED", "Photodiode"],
   "Zener diode",
   "A Zener diode operates in reverse breakdown and holds a nearly constant voltage across a range of currents."),
  ("What does MOSFET stand for?",
   ["Metal Oxide Silicon Field Effect Transistor", "Micro Ohm Silicon Ferrite Transistor", "Metal Oxide Semiconductor Field Effect Transistor", "Multiple Output Silicon Field Emission Transistor"],
   "Metal Oxide Semiconductor Field Effect Transistor",
   "A MOSFET uses an insulated gate whose field controls channel conductivity. It is the building block of modern integrated circuits."),
  ("In a three-phase power system, what is the phase angle difference between consecutive phases?",
   ["90 degrees", "120 degrees", "180 degrees", "360 degrees"],
   "120 degrees",
   "The phases are 120 degrees apart, so instantaneous voltages in a balanced system sum to zero."),
];

const CIVIL: &[Seed] = &[
  ("What is the primary purpose of a retaining wall?",
   ["To prevent soil erosion", "To resist lateral pressure of soil", "To support the roof", "To divide rooms"],
   "To resist lateral pressure of soil",
   "Retaining walls resist the horizontal pressure of soil held at a change in elevation. Erosion control is incidental."),
  ("Which concrete mix ratio (cement:sand:aggregate) is commonly used for structural elements?",
   ["1:2:4", "1:1:1", "2:3:6", "1:4:8"],
   "1:2:4",
   "1:2:4 balances strength, workability and cost for beams, columns and slabs. 1:4:8 is a lean mix for non-structural work."),
  ("What is the function of a column in a building structure?",
   ["To transfer horizontal loads", "To transfer vertical loads", "To provide aesthetic value", "To insulate the building"],
   "To transfer vertical loads",
   "Columns carry compressive vertical loads from upper levels down to the foundation."),
  ("Which of the following is NOT a type of foundation?",
   ["Raft foundation", "Pile foundation", "Beam foundation", "Strip foundation"],
   "Beam foundation",
   "Raft, pile and strip foundations are standard types. Grade beams exist but 'beam foundation' is not a foundation type."),
  ("What does the slump test measure in concrete?",
   ["Strength", "Workability", "Durability", "Density"],
   "Workability",
   "The slump test measures the workability of fresh concrete. Strength is measured by compression tests on hardened specimens."),
];

const COMPUTER: &[Seed] = &[
  ("What is the purpose of a cache memory in a computer system?",
   ["To store the operating system", "To speed up data access", "To increase storage capacity", "To protect against data loss"],
   "To speed up data access",
   "Cache keeps recently and nearby used data close to the CPU, exploiting temporal and spatial locality."),
  ("What does CISC stand for in processor architecture?",
   ["Complex Instruction Set Computing", "Complete Integrated System Chip", "Computer Instruction System Code", "Critical Instruction System Controller"],
   "Complex Instruction Set Computing",
   "CISC architectures such as x86 offer many specialized, variable-length instructions, in contrast to RISC."),
  ("Which logic gate outputs TRUE only when all inputs are TRUE?",
   ["OR gate", "AND gate", "XOR gate", "NOR gate"],
   "AND gate",
   "AND implements logical conjunction. OR needs any input true, XOR an odd number, NOR none."),
  ("In computer networking, what does MAC stand for?",
   ["Machine Access Control", "Multiple Access Control", "Media Access Control", "Memory Access Controller"],
   "Media Access Control",
   "Media Access Control is a sublayer of the data link layer; MAC addresses identify network interfaces on a segment."),
  ("Which of the following is a volatile memory?",
   ["ROM", "Hard Disk", "RAM", "Flash Drive"],
   "RAM",
   "RAM loses its contents without power. ROM, hard disks and flash drives are non-volatile."),
];

/// Topic-agnostic questions; `{topic}` is replaced with the requested topic.
const GENERIC: &[Seed] = &[
  ("In {topic}, what is the SI unit of force?",
   ["Watt", "Newton", "Pascal", "Joule"],
   "Newton",
   "The newton accelerates one kilogram at one metre per second squared. Watts measure power, pascals pressure and joules energy."),
  ("Which principle is fundamental to most {topic} applications?",
   ["Conservation of Energy", "Quantum Theory", "Evolution", "Plate Tectonics"],
   "Conservation of Energy",
   "Conservation of energy underpins system analysis in {topic} and every other engineering discipline."),
  ("What does CAD stand for in {topic}?",
   ["Computer Aided Design", "Computer Assisted Drawing", "Computer Automatic Design", "Calculated Automated Drafting"],
   "Computer Aided Design",
   "Computer Aided Design software is used to create, analyse and document designs in {topic}."),
  ("Which material is commonly used in {topic} for its high strength-to-weight ratio?",
   ["Steel", "Aluminum", "Titanium", "Copper"],
   "Titanium",
   "Titanium combines high strength, low weight and corrosion resistance. Steel is stronger but heavier, aluminium lighter but weaker."),
  ("What is the primary goal of {topic}?",
   ["Solve complex problems using scientific principles", "Maximize profit for corporations", "Reduce computational complexity", "Automate all manual processes"],
   "Solve complex problems using scientific principles",
   "Like every engineering discipline, {topic} applies scientific principles to solve real-world problems; the other options are means, not the goal."),
];

/// Built-in table for a topic; topics without one get the generic table.
fn builtin_for(topic: &str) -> (&'static [Seed], bool) {
  match topic {
    "Mechanical Engineering" => (MECHANICAL, false),
    "Electrical Engineering" => (ELECTRICAL, false),
    "Civil Engineering" => (CIVIL, false),
    "Computer Engineering" => (COMPUTER, false),
    _ => (GENERIC, true),
  }
}

fn seed_to_question(seed: &Seed, topic: &str, templated: bool) -> Question {
  let fill = |s: &str| if templated { s.replace("{topic}", topic) } else { s.to_string() };
  let (text, options, correct, explanation) = *seed;
  Question {
    text: fill(text),
    options: options.iter().map(|o| o.to_string()).collect(),
    correct_option: correct.to_string(),
    explanation: fill(explanation),
    difficulty: Difficulty::Medium,
  }
}

/// Fallback provider: configured bank entries for the topic first, then the
/// built-in table. Deterministic for a given request.
#[derive(Clone, Debug, Default)]
pub struct SeedBank {
  bank: HashMap<String, Vec<BankEntry>>,
}

#[derive(Clone, Debug)]
struct BankEntry {
  question: Question,
  /// Set when the TOML entry names its own difficulty.
  pinned: Option<Difficulty>,
}

impl SeedBank {
  /// Build from TOML bank entries; invalid entries are skipped.
  pub fn from_config(entries: &[QuestionCfg]) -> Self {
    let mut bank: HashMap<String, Vec<BankEntry>> = HashMap::new();
    for entry in entries {
      let q = entry.to_question();
      if let Err(e) = q.validate() {
        error!(target: "assessment", topic = %entry.topic, error = %e, "Skipping bank item: invalid question.");
        continue;
      }
      bank
        .entry(entry.topic.clone())
        .or_default()
        .push(BankEntry { question: q, pinned: entry.difficulty });
    }
    for (topic, qs) in &bank {
      debug!(target: "assessment", %topic, n = qs.len(), "Local question bank loaded");
    }
    Self { bank }
  }

  pub fn bank_size(&self) -> usize {
    self.bank.values().map(Vec::len).sum()
  }
}

impl FallbackProvider for SeedBank {
  fn fallback(&self, request: &RunRequest) -> Vec<Question> {
    let (table, templated) = builtin_for(&request.topic);
    // Time budget follows what the user asked for unless the bank entry pins one.
    let configured = self.bank.get(&request.topic).into_iter().flatten().map(|e| Question {
      difficulty: e.pinned.unwrap_or(request.difficulty),
      ..e.question.clone()
    });
    let builtin = table.iter().map(|s| Question {
      difficulty: request.difficulty,
      ..seed_to_question(s, &request.topic, templated)
    });

    configured.chain(builtin).take(request.count.max(1)).collect()
  }
}
