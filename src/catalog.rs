use std::collections::{BTreeMap, HashMap};

use crate::model::{acronym_of, Category, Discipline, Institution, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProgramRef {
    institution: usize,
    program: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DisciplineRef {
    program: ProgramRef,
    category: Category,
    index: usize,
}

/// A discipline together with the program that lists it.
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<'a> {
    pub discipline: &'a Discipline,
    pub program: &'a Program,
}

#[derive(Debug, Clone, Copy)]
pub struct CreditMatch<'a> {
    pub discipline: &'a Discipline,
    pub program: &'a Program,
    pub institution: &'a Institution,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLoad {
    pub name: String,
    pub total_credits: u32,
    pub total_workload: u32,
    pub mandatory: usize,
    pub free_elective: usize,
    pub restricted_elective: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSummary {
    pub name: String,
    pub disciplines: usize,
    pub workload: u32,
}

impl ProgramSummary {
    fn of(program: &Program) -> Self {
        ProgramSummary {
            name: program.name.clone(),
            disciplines: program.discipline_count(),
            workload: program.total_workload(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionReport {
    pub name: String,
    pub programs: Vec<ProgramSummary>,
    pub total_disciplines: usize,
    pub total_workload: u32,
}

/// Read-only view over a finished collection.
///
/// Every index is derived once in [`Catalog::new`]; replacing the data
/// means building a new catalog. Lookups return `None` or an empty list on
/// a miss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    institutions: Vec<Institution>,
    by_name: HashMap<String, usize>,
    by_acronym: HashMap<String, usize>,
    programs: HashMap<String, ProgramRef>,
    disciplines: BTreeMap<String, Vec<DisciplineRef>>,
}

impl Catalog {
    pub fn new(institutions: Vec<Institution>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_acronym = HashMap::new();
        let mut programs = HashMap::new();
        let mut disciplines: BTreeMap<String, Vec<DisciplineRef>> = BTreeMap::new();

        for (i, institution) in institutions.iter().enumerate() {
            by_name.insert(institution.name.to_lowercase(), i);
            by_acronym.insert(acronym_of(&institution.name).to_string(), i);

            for (p, program) in institution.programs.iter().enumerate() {
                let program_ref = ProgramRef {
                    institution: i,
                    program: p,
                };
                // Later duplicates win.
                programs.insert(program.name.to_lowercase(), program_ref);

                for category in Category::ALL {
                    for (index, discipline) in program.list(category).iter().enumerate() {
                        disciplines
                            .entry(discipline.code.to_uppercase())
                            .or_default()
                            .push(DisciplineRef {
                                program: program_ref,
                                category,
                                index,
                            });
                    }
                }
            }
        }

        Catalog {
            institutions,
            by_name,
            by_acronym,
            programs,
            disciplines,
        }
    }

    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    pub fn institution_names(&self) -> Vec<&str> {
        self.institutions.iter().map(|i| i.name.as_str()).collect()
    }

    /// Full name (any case) first, then acronym as typed, then upper-cased.
    pub fn find_institution(&self, term: &str) -> Option<&Institution> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        self.by_name
            .get(&term.to_lowercase())
            .or_else(|| self.by_acronym.get(term))
            .or_else(|| self.by_acronym.get(&term.to_uppercase()))
            .map(|&i| &self.institutions[i])
    }

    /// Resolved institution name and its program names, in collection order.
    pub fn program_names(&self, institution: &str) -> Option<(&str, Vec<&str>)> {
        let institution = self.find_institution(institution)?;
        let names = institution.programs.iter().map(|p| p.name.as_str()).collect();
        Some((institution.name.as_str(), names))
    }

    pub fn find_program(&self, name: &str) -> Option<&Program> {
        self.programs
            .get(&name.trim().to_lowercase())
            .map(|&r| self.program(r))
    }

    /// Every (discipline, program) pair for a code, matched case-insensitively.
    pub fn find_discipline(&self, code: &str) -> Vec<Occurrence<'_>> {
        self.disciplines
            .get(&code.trim().to_uppercase())
            .map(|refs| self.occurrences(refs))
            .unwrap_or_default()
    }

    /// Codes with more than one occurrence, ordered by code.
    ///
    /// Occurrences are not deduplicated per program, so a code listed twice
    /// in the same program counts as common.
    pub fn common_disciplines(&self) -> Vec<(&str, Vec<Occurrence<'_>>)> {
        self.disciplines
            .iter()
            .filter(|(_, refs)| refs.len() > 1)
            .map(|(code, refs)| (code.as_str(), self.occurrences(refs)))
            .collect()
    }

    pub fn program_load(&self, name: &str) -> Option<ProgramLoad> {
        let program = self.find_program(name)?;
        Some(ProgramLoad {
            name: program.name.clone(),
            total_credits: program.total_credits(),
            total_workload: program.total_workload(),
            mandatory: program.mandatory.len(),
            free_elective: program.free_elective.len(),
            restricted_elective: program.restricted_elective.len(),
        })
    }

    pub fn compare_programs(&self, first: &str, second: &str) -> Option<(ProgramSummary, ProgramSummary)> {
        let a = self.find_program(first)?;
        let b = self.find_program(second)?;
        Some((ProgramSummary::of(a), ProgramSummary::of(b)))
    }

    pub fn institution_report(&self, term: &str) -> Option<InstitutionReport> {
        let institution = self.find_institution(term)?;
        let programs: Vec<ProgramSummary> =
            institution.programs.iter().map(ProgramSummary::of).collect();
        Some(InstitutionReport {
            name: institution.name.clone(),
            total_disciplines: programs.iter().map(|p| p.disciplines).sum(),
            total_workload: programs.iter().map(|p| p.workload).sum(),
            programs,
        })
    }

    /// Disciplines whose total credits reach `min_credits`, in collection order.
    pub fn disciplines_with_min_credits(&self, min_credits: u32) -> Vec<CreditMatch<'_>> {
        let mut out = Vec::new();
        for institution in &self.institutions {
            for program in &institution.programs {
                for discipline in program.all_disciplines() {
                    if discipline.total_credits() >= min_credits {
                        out.push(CreditMatch {
                            discipline,
                            program,
                            institution,
                        });
                    }
                }
            }
        }
        out
    }

    fn program(&self, r: ProgramRef) -> &Program {
        &self.institutions[r.institution].programs[r.program]
    }

    fn occurrences(&self, refs: &[DisciplineRef]) -> Vec<Occurrence<'_>> {
        refs.iter()
            .map(|r| {
                let program = self.program(r.program);
                Occurrence {
                    discipline: &program.list(r.category)[r.index],
                    program,
                }
            })
            .collect()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Duration;

    fn discipline(code: &str, class: u32, work: u32, hours: u32) -> Discipline {
        Discipline {
            code: code.to_string(),
            name: format!("Disciplina {}", code),
            class_credits: class,
            work_credits: work,
            workload_hours: hours,
            internship_hours: 0,
            practical_hours: 0,
            advanced_study_hours: 0,
        }
    }

    fn program(name: &str, institution: &str, mandatory: Vec<Discipline>) -> Program {
        Program {
            name: name.to_string(),
            institution: institution.to_string(),
            duration: Duration::FALLBACK,
            mandatory,
            free_elective: Vec::new(),
            restricted_elective: Vec::new(),
        }
    }

    const EACH: &str = "Escola de Artes, Ciências e Humanidades - ( EACH )";
    const IF: &str = "Instituto de Física (IF)";

    fn each() -> Institution {
        Institution {
            name: EACH.to_string(),
            programs: vec![program(
                "Lic. em Ciências da Natureza",
                EACH,
                vec![Discipline {
                    code: "ACH0001".to_string(),
                    name: "Intro".to_string(),
                    class_credits: 4,
                    work_credits: 2,
                    workload_hours: 90,
                    internship_hours: 0,
                    practical_hours: 0,
                    advanced_study_hours: 0,
                }],
            )],
        }
    }

    fn sample() -> Vec<Institution> {
        let mut physics = program(
            "Bacharelado em Física",
            IF,
            vec![discipline("4300151", 4, 0, 60), discipline("MAT0105", 6, 0, 90)],
        );
        physics.free_elective.push(discipline("4300390", 2, 1, 45));
        physics.restricted_elective.push(discipline("4300415", 4, 2, 120));

        let mut teaching = program(
            "Licenciatura em Física",
            IF,
            vec![discipline("4300151", 4, 0, 60), discipline("EDM0402", 4, 1, 90)],
        );
        teaching.free_elective.push(discipline("MAT0105", 6, 0, 90));

        vec![
            each(),
            Institution {
                name: IF.to_string(),
                programs: vec![physics, teaching],
            },
            Institution {
                name: "Faculdade sem sigla".to_string(),
                programs: Vec::new(),
            },
        ]
    }

    #[test]
    fn discipline_search_is_case_insensitive() {
        let catalog = Catalog::new(vec![each()]);
        let hits = catalog.find_discipline("ach0001");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].program.name, "Lic. em Ciências da Natureza");
        assert_eq!(hits[0].discipline.name, "Intro");
        assert!(catalog.find_discipline("ACH9999").is_empty());
    }

    #[test]
    fn program_load_totals() {
        let catalog = Catalog::new(vec![each()]);
        let load = catalog.program_load("Lic. em Ciências da Natureza").unwrap();
        assert_eq!(
            load,
            ProgramLoad {
                name: "Lic. em Ciências da Natureza".to_string(),
                total_credits: 6,
                total_workload: 90,
                mandatory: 1,
                free_elective: 0,
                restricted_elective: 0,
            }
        );
        assert!(catalog.program_load("Medicina").is_none());
    }

    #[test]
    fn institution_by_name_or_acronym() {
        let catalog = Catalog::new(sample());
        assert_eq!(catalog.find_institution("EACH").unwrap().name, EACH);
        assert_eq!(catalog.find_institution("each").unwrap().name, EACH);
        assert_eq!(catalog.find_institution("  IF ").unwrap().name, IF);
        assert_eq!(
            catalog.find_institution("instituto de física (if)").unwrap().name,
            IF
        );
        assert!(catalog.find_institution("FFLCH").is_none());
        assert!(catalog.find_institution("").is_none());
    }

    #[test]
    fn program_names_follow_collection_order() {
        let catalog = Catalog::new(sample());
        let (name, programs) = catalog.program_names("IF").unwrap();
        assert_eq!(name, IF);
        assert_eq!(programs, ["Bacharelado em Física", "Licenciatura em Física"]);
        assert!(catalog.program_names("nowhere").is_none());
    }

    #[test]
    fn later_duplicate_program_name_wins() {
        let mut institutions = sample();
        institutions[2]
            .programs
            .push(program("BACHARELADO EM FÍSICA", "Faculdade sem sigla", Vec::new()));
        let catalog = Catalog::new(institutions);
        let found = catalog.find_program("bacharelado em física").unwrap();
        assert_eq!(found.institution, "Faculdade sem sigla");
    }

    #[test]
    fn occurrences_across_programs() {
        let catalog = Catalog::new(sample());
        let hits = catalog.find_discipline("MAT0105");
        let programs: Vec<&str> = hits.iter().map(|o| o.program.name.as_str()).collect();
        assert_eq!(programs, ["Bacharelado em Física", "Licenciatura em Física"]);
    }

    #[test]
    fn common_disciplines_need_two_occurrences() {
        let catalog = Catalog::new(sample());
        let common: Vec<&str> = catalog.common_disciplines().iter().map(|(c, _)| *c).collect();
        assert_eq!(common, ["4300151", "MAT0105"]);
    }

    #[test]
    fn repeated_code_in_one_program_counts_as_common() {
        let twice = program(
            "Curso repetido",
            EACH,
            vec![discipline("ACH0500", 2, 0, 30), discipline("ach0500", 2, 0, 30)],
        );
        let catalog = Catalog::new(vec![Institution {
            name: EACH.to_string(),
            programs: vec![twice],
        }]);
        let common = catalog.common_disciplines();
        assert_eq!(common.len(), 1);
        assert_eq!(common[0].0, "ACH0500");
        assert_eq!(common[0].1.len(), 2);
    }

    #[test]
    fn compare_two_programs() {
        let catalog = Catalog::new(sample());
        let (a, b) = catalog
            .compare_programs("Bacharelado em Física", "licenciatura em física")
            .unwrap();
        assert_eq!((a.disciplines, a.workload), (4, 315));
        assert_eq!((b.disciplines, b.workload), (3, 240));
        assert!(catalog.compare_programs("Bacharelado em Física", "Direito").is_none());
    }

    #[test]
    fn institution_report_totals() {
        let catalog = Catalog::new(sample());
        let report = catalog.institution_report("IF").unwrap();
        assert_eq!(report.programs.len(), 2);
        assert_eq!(report.total_disciplines, 7);
        assert_eq!(report.total_workload, 555);

        let empty = catalog.institution_report("Faculdade sem sigla").unwrap();
        assert!(empty.programs.is_empty());
        assert_eq!(empty.total_workload, 0);
    }

    #[test]
    fn credit_threshold_filter() {
        let catalog = Catalog::new(sample());
        let hits = catalog.disciplines_with_min_credits(6);
        let found: Vec<(&str, &str)> = hits
            .iter()
            .map(|m| (m.discipline.code.as_str(), m.program.name.as_str()))
            .collect();
        assert_eq!(
            found,
            [
                ("ACH0001", "Lic. em Ciências da Natureza"),
                ("MAT0105", "Bacharelado em Física"),
                ("4300415", "Bacharelado em Física"),
                ("MAT0105", "Licenciatura em Física"),
            ]
        );
        assert!(hits.iter().all(|m| m.institution.programs.iter().any(|p| p.name == m.program.name)));
        assert!(catalog.disciplines_with_min_credits(100).is_empty());
    }

    #[test]
    fn building_twice_gives_same_indices() {
        assert_eq!(Catalog::new(sample()), Catalog::new(sample()));
    }

    #[test]
    fn empty_catalog_reports_nothing() {
        let catalog = Catalog::new(Vec::new());
        assert!(catalog.institution_names().is_empty());
        assert!(catalog.common_disciplines().is_empty());
        assert!(catalog.find_program("x").is_none());
    }
}
