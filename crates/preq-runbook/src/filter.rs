//! CRE id filtering around an action.

use preq_core::EventRecord;
use regex::Regex;

use crate::config::ActionKind;
use crate::handler::Action;

/// An action paired with its optional CRE id filter.
///
/// With no pattern every record is admitted. With a pattern, a record is
/// admitted only if its CRE id is non-empty and the pattern matches it
/// somewhere (unanchored).
pub struct FilteredAction {
    pattern: Option<Regex>,
    inner: Box<dyn Action>,
}

impl FilteredAction {
    /// Wrap `inner` with no filter.
    pub fn new(inner: Box<dyn Action>) -> Self {
        Self {
            pattern: None,
            inner,
        }
    }

    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn admits(&self, record: &EventRecord) -> bool {
        match &self.pattern {
            None => true,
            Some(re) => {
                let id = record.cre_id();
                !id.is_empty() && re.is_match(id)
            }
        }
    }

    pub fn action(&self) -> &dyn Action {
        self.inner.as_ref()
    }

    pub fn kind(&self) -> ActionKind {
        self.inner.kind()
    }

    pub fn describe(&self) -> String {
        match &self.pattern {
            Some(re) => format!("{} (cre id ~ /{}/)", self.inner.describe(), re.as_str()),
            None => self.inner.describe(),
        }
    }
}

impl std::fmt::Debug for FilteredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredAction")
            .field("kind", &self.kind())
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .finish()
    }
}
