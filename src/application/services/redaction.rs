use regex::{Regex, RegexBuilder};

/// Strips a fixed set of sensitive terms from text, case-insensitively.
/// Longer terms are matched first so that a term containing another is
/// removed whole.
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Option<Regex>,
}

impl Redactor {
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Result<Self, regex::Error> {
        let mut terms: Vec<&str> = terms
            .iter()
            .map(AsRef::as_ref)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return Ok(Self { pattern: None });
        }

        terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        terms.dedup();

        let alternation = terms
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn redact(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, "").into_owned(),
            None => text.to_string(),
        }
    }
}
