pub mod curriculum;
pub mod duration;

use scraper::Html;

use crate::model::Duration;
use curriculum::Disciplines;

pub use curriculum::extract_disciplines;
pub use duration::extract_duration;

/// Everything read from one curriculum page.
pub struct Curriculum {
    pub duration: Duration,
    pub disciplines: Disciplines,
}

/// Parse the page once, then run both extractors over it.
pub fn parse_curriculum(markup: &str) -> Curriculum {
    let page = Html::parse_document(markup);
    Curriculum {
        duration: extract_duration(&page),
        disciplines: extract_disciplines(&page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_page() {
        let html = std::fs::read_to_string("tests/fixtures/curriculum.html").unwrap();
        let c = parse_curriculum(&html);
        assert_eq!(c.duration.ideal, 9);
        assert_eq!(c.disciplines.mandatory.len(), 3);
        assert_eq!(c.disciplines.free_elective.len(), 1);
        assert_eq!(c.disciplines.restricted_elective.len(), 2);
    }

    #[test]
    fn deactivated_program_page() {
        let c = parse_curriculum("<html><body><div id=\"err\">Curso desativado</div></body></html>");
        assert_eq!(c.duration, Duration::FALLBACK);
        assert!(c.disciplines.is_empty());
    }
}
