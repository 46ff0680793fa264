use icu::collator::options::CollatorOptions;
use icu::collator::preferences::CollationNumericOrdering;
use icu::collator::{Collator, CollatorBorrowed, CollatorPreferences};
use icu::locale::Locale;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Locale-aware, numeric-aware string comparison ("2" < "10", "Émile" < "Zoe").
///
/// Built once per sort pass from the display language. Unknown language
/// tags fall back to the root collation.
pub struct TextCollator {
    collator: Option<CollatorBorrowed<'static>>,
}

impl TextCollator {
    /// Create a collator for a BCP 47 language tag (e.g. "de", "sv-SE")
    pub fn new(language: &str) -> Self {
        let collator = build(parse_locale(language)).or_else(|| {
            warn!(language = %language, "No collation data for language, using root collation");
            build(Locale::UNKNOWN)
        });
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            // No collation data at all: keep input order
            None => Ordering::Equal,
        }
    }
}

impl Default for TextCollator {
    fn default() -> Self {
        Self::new("en")
    }
}

fn parse_locale(language: &str) -> Locale {
    match language.trim().replace('_', "-").parse::<Locale>() {
        Ok(locale) => locale,
        Err(e) => {
            debug!(language = %language, error = ?e, "Unparsable language tag, using root locale");
            Locale::UNKNOWN
        }
    }
}

fn build(locale: Locale) -> Option<CollatorBorrowed<'static>> {
    let mut prefs: CollatorPreferences = locale.into();
    prefs.numeric_ordering = Some(CollationNumericOrdering::True);
    Collator::try_new(prefs, CollatorOptions::default())
        .map_err(|e| debug!(error = ?e, "Failed to load collation data"))
        .ok()
}
