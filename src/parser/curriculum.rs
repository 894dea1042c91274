use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{Category, Discipline};

static CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#gradeCurricular").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static CODE_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.disciplina").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const MANDATORY_HEADER: &str = "Disciplinas Obrigatórias";
const FREE_ELECTIVE_HEADER: &str = "Disciplinas Optativas Livres";
const RESTRICTED_ELECTIVE_HEADER: &str = "Disciplinas Optativas Eletivas";
const IDEAL_SEMESTER_MARKER: &str = "Semestre Ideal";
const CODE_ATTR: &str = "data-coddis";
const MIN_CELLS: usize = 8;

/// Discipline rows of one curriculum page, split by category.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Disciplines {
    pub mandatory: Vec<Discipline>,
    pub free_elective: Vec<Discipline>,
    pub restricted_elective: Vec<Discipline>,
}

impl Disciplines {
    fn push(&mut self, category: Category, discipline: Discipline) {
        match category {
            Category::Mandatory => self.mandatory.push(discipline),
            Category::FreeElective => self.free_elective.push(discipline),
            Category::RestrictedElective => self.restricted_elective.push(discipline),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.free_elective.is_empty() && self.restricted_elective.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum RowError {
    #[error("discipline {code}: cell {cell} is not a whole number: {value:?}")]
    BadNumber {
        code: String,
        cell: usize,
        value: String,
    },
}

/// Walk the rows of the curriculum container in document order.
///
/// A category header row switches the current category and is not a data
/// row. Rows before the first header, "Semestre Ideal" banners, rows with
/// fewer than eight cells and rows without a code anchor are skipped. A row
/// with an unreadable number is logged and dropped. No container means no
/// disciplines.
pub fn extract_disciplines(page: &Html) -> Disciplines {
    let mut out = Disciplines::default();

    let Some(container) = page.select(&CONTAINER).next() else {
        debug!("No curriculum container on page");
        return out;
    };

    let mut current: Option<Category> = None;

    for row in container.select(&ROW) {
        let text = element_text(row);

        if let Some(category) = header_category(&text) {
            current = Some(category);
            continue;
        }
        let Some(category) = current else {
            continue;
        };
        if text.contains(IDEAL_SEMESTER_MARKER) {
            continue;
        }

        match parse_row(row) {
            Ok(Some(discipline)) => out.push(category, discipline),
            Ok(None) => {}
            Err(e) => warn!("Dropping curriculum row: {}", e),
        }
    }

    out
}

fn header_category(text: &str) -> Option<Category> {
    if text.contains(MANDATORY_HEADER) {
        Some(Category::Mandatory)
    } else if text.contains(FREE_ELECTIVE_HEADER) {
        Some(Category::FreeElective)
    } else if text.contains(RESTRICTED_ELECTIVE_HEADER) {
        Some(Category::RestrictedElective)
    } else {
        None
    }
}

/// `Ok(None)` for spacer and subtotal rows, which carry no code anchor.
fn parse_row(row: ElementRef) -> Result<Option<Discipline>, RowError> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < MIN_CELLS {
        return Ok(None);
    }

    let code = cells[0]
        .select(&CODE_ANCHOR)
        .next()
        .and_then(|a| a.value().attr(CODE_ATTR))
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let Some(code) = code else {
        return Ok(None);
    };

    let number = |i: usize| -> Result<u32, RowError> {
        let value = element_text(cells[i]);
        if value.is_empty() {
            return Ok(0);
        }
        value.parse::<u32>().map_err(|_| RowError::BadNumber {
            code: code.to_string(),
            cell: i,
            value,
        })
    };

    Ok(Some(Discipline {
        code: code.to_string(),
        name: element_text(cells[1]),
        class_credits: number(2)?,
        work_credits: number(3)?,
        workload_hours: number(4)?,
        internship_hours: number(5)?,
        practical_hours: number(6)?,
        advanced_study_hours: number(7)?,
    }))
}

/// Text content with runs of whitespace collapsed and ends trimmed.
pub(crate) fn element_text(element: ElementRef) -> String {
    let raw: String = element.text().collect();
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

// ── Tests ──
