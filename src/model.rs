use std::fmt;

use serde::{Deserialize, Serialize};

/// One course unit as listed in a curriculum table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discipline {
    pub code: String,
    pub name: String,
    pub class_credits: u32,
    pub work_credits: u32,
    pub workload_hours: u32,
    pub internship_hours: u32,
    pub practical_hours: u32,
    pub advanced_study_hours: u32,
}

impl Discipline {
    pub fn total_credits(&self) -> u32 {
        self.class_credits + self.work_credits
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

/// Program length in semesters. Expected `minimum <= ideal <= maximum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub ideal: u32,
    pub minimum: u32,
    pub maximum: u32,
}

impl Duration {
    /// Used whenever the duration block of a page cannot be read in full.
    pub const FALLBACK: Duration = Duration {
        ideal: 8,
        minimum: 8,
        maximum: 12,
    };
}

impl Default for Duration {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} semesters (ideal: {})",
            self.minimum, self.maximum, self.ideal
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Mandatory,
    FreeElective,
    RestrictedElective,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Mandatory,
        Category::FreeElective,
        Category::RestrictedElective,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Mandatory => "mandatory",
            Category::FreeElective => "free elective",
            Category::RestrictedElective => "restricted elective",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub institution: String,
    pub duration: Duration,
    pub mandatory: Vec<Discipline>,
    pub free_elective: Vec<Discipline>,
    pub restricted_elective: Vec<Discipline>,
}

impl Program {
    /// A program whose curriculum page was not published.
    pub fn without_curriculum(name: &str, institution: &str) -> Self {
        Program {
            name: name.to_string(),
            institution: institution.to_string(),
            duration: Duration::FALLBACK,
            mandatory: Vec::new(),
            free_elective: Vec::new(),
            restricted_elective: Vec::new(),
        }
    }

    /// Mandatory, then free elective, then restricted elective.
    pub fn all_disciplines(&self) -> impl Iterator<Item = &Discipline> {
        self.mandatory
            .iter()
            .chain(&self.free_elective)
            .chain(&self.restricted_elective)
    }

    pub fn list(&self, category: Category) -> &[Discipline] {
        match category {
            Category::Mandatory => &self.mandatory,
            Category::FreeElective => &self.free_elective,
            Category::RestrictedElective => &self.restricted_elective,
        }
    }

    pub fn discipline_count(&self) -> usize {
        self.mandatory.len() + self.free_elective.len() + self.restricted_elective.len()
    }

    pub fn total_credits(&self) -> u32 {
        self.all_disciplines().map(Discipline::total_credits).sum()
    }

    pub fn total_workload(&self) -> u32 {
        self.all_disciplines().map(|d| d.workload_hours).sum()
    }

    pub fn category_of(&self, code: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|&c| self.list(c).iter().any(|d| d.code == code))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.institution)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub programs: Vec<Program>,
}

impl Institution {
    pub fn new(name: &str) -> Self {
        Institution {
            name: name.to_string(),
            programs: Vec::new(),
        }
    }

    /// Text between the last `(` and the last `)` of the name, trimmed.
    /// Empty when either is missing or they are out of order.
    pub fn acronym(&self) -> &str {
        acronym_of(&self.name)
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub fn acronym_of(name: &str) -> &str {
    match (name.rfind('('), name.rfind(')')) {
        (Some(open), Some(close)) if open < close => name[open + 1..close].trim(),
        _ => "",
    }
}
