use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::curriculum::element_text;
use crate::model::Duration;

static IDEAL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.duridlhab").unwrap());
static MINIMUM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.durminhab").unwrap());
static MAXIMUM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.durmaxhab").unwrap());

/// All three values or none: a missing or unreadable span yields
/// `Duration::FALLBACK`.
pub fn extract_duration(page: &Html) -> Duration {
    match (read(page, &IDEAL), read(page, &MINIMUM), read(page, &MAXIMUM)) {
        (Some(ideal), Some(minimum), Some(maximum)) => {
            if !(minimum <= ideal && ideal <= maximum) {
                debug!(ideal, minimum, maximum, "Duration out of order");
            }
            Duration {
                ideal,
                minimum,
                maximum,
            }
        }
        _ => {
            warn!("Could not read program duration, using {}", Duration::FALLBACK);
            Duration::FALLBACK
        }
    }
}

fn read(page: &Html, selector: &Selector) -> Option<u32> {
    let span = page.select(selector).next()?;
    element_text(span).parse().ok()
}
