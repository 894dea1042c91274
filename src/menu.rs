use std::io::{self, BufRead, Write};

use crate::catalog::Catalog;
use crate::model::Category;

const NOT_FOUND: &str = "Not found.";

const OPTIONS: [&str; 10] = [
    "List institutions",
    "List programs of an institution",
    "Program details",
    "Find discipline by code",
    "Disciplines shared by more than one program",
    "Program load analysis",
    "Compare two programs",
    "Disciplines by minimum credits",
    "Institution analysis",
    "Quit",
];

/// Line-oriented query loop over a finished catalog.
pub struct Menu<'a, R, W> {
    catalog: &'a Catalog,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(catalog: &'a Catalog, input: R, out: W) -> Self {
        Menu { catalog, input, out }
    }

    /// Runs until "Quit" or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_options()?;
            let Some(choice) = self.prompt("Option")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.list_institutions()?,
                "2" => self.list_programs()?,
                "3" => self.program_details()?,
                "4" => self.find_discipline()?,
                "5" => self.common_disciplines()?,
                "6" => self.program_load()?,
                "7" => self.compare_programs()?,
                "8" => self.min_credits()?,
                "9" => self.institution_report()?,
                "10" => return Ok(()),
                other => writeln!(self.out, "Invalid option: {}", other)?,
            }
        }
    }

    fn print_options(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n=== Jupiter catalog ===")?;
        for (i, label) in OPTIONS.iter().enumerate() {
            writeln!(self.out, "{:>2}. {}", i + 1, label)?;
        }
        Ok(())
    }

    /// `None` on end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}: ", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn not_found(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", NOT_FOUND)
    }

    fn list_institutions(&mut self) -> io::Result<()> {
        let names = self.catalog.institution_names();
        if names.is_empty() {
            return self.not_found();
        }
        for name in names {
            writeln!(self.out, "- {}", name)?;
        }
        Ok(())
    }

    fn list_programs(&mut self) -> io::Result<()> {
        let Some(term) = self.prompt("Institution (name or acronym)")? else {
            return Ok(());
        };
        let Some((name, programs)) = self.catalog.program_names(&term) else {
            return self.not_found();
        };
        writeln!(self.out, "{} ({} programs)", name, programs.len())?;
        for program in programs {
            writeln!(self.out, "- {}", program)?;
        }
        Ok(())
    }

    fn program_details(&mut self) -> io::Result<()> {
        let Some(term) = self.prompt("Program name")? else {
            return Ok(());
        };
        let Some(program) = self.catalog.find_program(&term) else {
            return self.not_found();
        };
        writeln!(self.out, "{}", program)?;
        writeln!(self.out, "Duration: {}", program.duration)?;
        for category in Category::ALL {
            let list = program.list(category);
            writeln!(self.out, "\n{} ({}):", category.label(), list.len())?;
            for d in list {
                writeln!(
                    self.out,
                    "  {:<8} | {:<40} | {:>2}+{:<2} cr | {:>4} h",
                    d.code,
                    truncate(&d.name, 40),
                    d.class_credits,
                    d.work_credits,
                    d.workload_hours
                )?;
            }
        }
        Ok(())
    }

    fn find_discipline(&mut self) -> io::Result<()> {
        let Some(code) = self.prompt("Discipline code")? else {
            return Ok(());
        };
        let occurrences = self.catalog.find_discipline(&code);
        let Some(first) = occurrences.first() else {
            return self.not_found();
        };
        let d = first.discipline;
        writeln!(self.out, "{}", d)?;
        writeln!(
            self.out,
            "Credits: {} class, {} work | Workload: {} h",
            d.class_credits, d.work_credits, d.workload_hours
        )?;
        writeln!(self.out, "Listed in:")?;
        for occ in &occurrences {
            match occ.program.category_of(&occ.discipline.code) {
                Some(category) => writeln!(self.out, "- {} [{}]", occ.program, category.label())?,
                None => writeln!(self.out, "- {}", occ.program)?,
            }
        }
        Ok(())
    }

    fn common_disciplines(&mut self) -> io::Result<()> {
        let common = self.catalog.common_disciplines();
        if common.is_empty() {
            return self.not_found();
        }
        for (code, occurrences) in common {
            let name = occurrences.first().map(|o| o.discipline.name.as_str()).unwrap_or("");
            writeln!(self.out, "{} - {} ({} programs)", code, name, occurrences.len())?;
            for occ in &occurrences {
                writeln!(self.out, "    {}", occ.program)?;
            }
        }
        Ok(())
    }

    fn program_load(&mut self) -> io::Result<()> {
        let Some(term) = self.prompt("Program name")? else {
            return Ok(());
        };
        let Some(load) = self.catalog.program_load(&term) else {
            return self.not_found();
        };
        writeln!(self.out, "{}", load.name)?;
        writeln!(self.out, "Total credits:  {}", load.total_credits)?;
        writeln!(self.out, "Total workload: {} h", load.total_workload)?;
        writeln!(self.out, "{}: {}", Category::Mandatory.label(), load.mandatory)?;
        writeln!(self.out, "{}: {}", Category::FreeElective.label(), load.free_elective)?;
        writeln!(
            self.out,
            "{}: {}",
            Category::RestrictedElective.label(),
            load.restricted_elective
        )
    }

    fn compare_programs(&mut self) -> io::Result<()> {
        let Some(first) = self.prompt("First program")? else {
            return Ok(());
        };
        let Some(second) = self.prompt("Second program")? else {
            return Ok(());
        };
        let Some((a, b)) = self.catalog.compare_programs(&first, &second) else {
            return self.not_found();
        };
        writeln!(self.out, "{:<40} | {:>11} | {:>8}", "Program", "Disciplines", "Workload")?;
        writeln!(self.out, "{}", "-".repeat(65))?;
        for s in [a, b] {
            writeln!(
                self.out,
                "{:<40} | {:>11} | {:>6} h",
                truncate(&s.name, 40),
                s.disciplines,
                s.workload
            )?;
        }
        Ok(())
    }

    fn min_credits(&mut self) -> io::Result<()> {
        let Some(raw) = self.prompt("Minimum credits")? else {
            return Ok(());
        };
        let Ok(min) = raw.parse::<u32>() else {
            return writeln!(self.out, "Not a number: {}", raw);
        };
        let matches = self.catalog.disciplines_with_min_credits(min);
        if matches.is_empty() {
            return self.not_found();
        }
        for m in &matches {
            writeln!(
                self.out,
                "{:>3} cr | {} | {} | {}",
                m.discipline.total_credits(),
                m.discipline,
                m.program.name,
                m.institution.name
            )?;
        }
        Ok(())
    }

    fn institution_report(&mut self) -> io::Result<()> {
        let Some(term) = self.prompt("Institution (name or acronym)")? else {
            return Ok(());
        };
        let Some(report) = self.catalog.institution_report(&term) else {
            return self.not_found();
        };
        writeln!(self.out, "{}", report.name)?;
        for p in &report.programs {
            writeln!(
                self.out,
                "  {:<40} | {:>4} disciplines | {:>6} h",
                truncate(&p.name, 40),
                p.disciplines,
                p.workload
            )?;
        }
        writeln!(
            self.out,
            "{} programs, {} disciplines, {} h",
            report.programs.len(),
            report.total_disciplines,
            report.total_workload
        )
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::model::{Discipline, Institution, Program};

    fn discipline(code: &str, class_credits: u32, workload_hours: u32) -> Discipline {
        Discipline {
            code: code.to_string(),
            name: format!("Disciplina {}", code),
            class_credits,
            work_credits: 0,
            workload_hours,
            internship_hours: 0,
            practical_hours: 0,
            advanced_study_hours: 0,
        }
    }

    fn catalog() -> Catalog {
        let mut each = Institution::new("Escola de Artes, Ciências e Humanidades (EACH)");
        let mut si = Program::without_curriculum("Sistemas de Informação", &each.name);
        si.mandatory = vec![discipline("ACH0021", 4, 60), discipline("ACH2001", 6, 120)];
        let mut gpp = Program::without_curriculum("Gestão de Políticas Públicas", &each.name);
        gpp.mandatory = vec![discipline("ACH0021", 4, 60)];
        each.programs = vec![si, gpp];
        Catalog::new(vec![each])
    }

    fn run(input: &str) -> String {
        let catalog = catalog();
        let mut out = Vec::new();
        Menu::new(&catalog, Cursor::new(input.as_bytes()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn answers_queries_until_quit() {
        let out = run("2\neach\n4\nach0021\n5\n8\n6\n10\n1\n");
        assert!(out.contains("Escola de Artes, Ciências e Humanidades (EACH) (2 programs)"));
        assert!(out.contains("ACH0021 - Disciplina ACH0021"));
        assert!(out.contains("ACH0021 - Disciplina ACH0021 (2 programs)"));
        assert!(out.contains(
            "- Gestão de Políticas Públicas (Escola de Artes, Ciências e Humanidades (EACH)) [mandatory]"
        ));
        assert!(out.contains("6 cr | ACH2001 - Disciplina ACH2001 | Sistemas de Informação"));
        assert!(!out.contains("4 cr | ACH0021"));
        // Nothing after "Quit" runs.
        assert!(!out.contains("\n- Escola"));
    }

    #[test]
    fn misses_print_not_found() {
        let out = run("3\nMedicina\n9\nXYZ\n7\nSistemas de Informação\nMedicina\n");
        assert_eq!(out.matches(NOT_FOUND).count(), 3);
    }

    #[test]
    fn end_of_input_quits() {
        let out = run("");
        assert!(out.contains("10. Quit"));
    }

    #[test]
    fn invalid_option_is_reported() {
        let out = run("42\nx\n8\nmany\n10\n");
        assert!(out.contains("Invalid option: 42"));
        assert!(out.contains("Invalid option: x"));
        assert!(out.contains("Not a number: many"));
    }

    #[test]
    fn truncate_adds_ellipsis() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
