use crate::models::{Query, SearchJob};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A query string in original and decorated form
///
/// Decorators rewrite the text a user typed before it is handed to the
/// backend. The offset mappings let a parse or validation error against the
/// decorated text be reported at the offsets of the original text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedQueryString {
    original: String,
    decorated: String,
    mappings: Vec<PositionMapping>,
}

/// Maps one span of the decorated text back to a span of the original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMapping {
    pub original_start: usize,
    pub original_end: usize,
    pub decorated_start: usize,
    pub decorated_end: usize,
}

impl DecoratedQueryString {
    /// A string no decorator has touched yet
    pub fn undecorated(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            decorated: text.clone(),
            original: text,
            mappings: Vec::new(),
        }
    }

    /// The text as originally submitted
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The text after all decorators ran
    pub fn decorated(&self) -> &str {
        &self.decorated
    }

    /// Recorded span mappings from decorated to original text
    pub fn mappings(&self) -> &[PositionMapping] {
        &self.mappings
    }

    /// Replace the decorated text wholesale, mapping it back to the full
    /// original
    pub fn replaced(self, decorated: impl Into<String>) -> Self {
        let decorated = decorated.into();
        let mapping = PositionMapping {
            original_start: 0,
            original_end: self.original.len(),
            decorated_start: 0,
            decorated_end: decorated.len(),
        };
        Self {
            original: self.original,
            decorated,
            mappings: vec![mapping],
        }
    }

    /// Replace the decorated text with explicit span mappings
    pub fn rewritten(self, decorated: impl Into<String>, mappings: Vec<PositionMapping>) -> Self {
        Self {
            original: self.original,
            decorated: decorated.into(),
            mappings,
        }
    }

    /// Map an offset in the decorated text to the offset in the original
    /// text it stems from
    pub fn original_offset(&self, decorated_offset: usize) -> usize {
        for mapping in &self.mappings {
            if decorated_offset >= mapping.decorated_start
                && decorated_offset < mapping.decorated_end
            {
                return mapping.original_start;
            }
        }
        decorated_offset.min(self.original.len())
    }
}

/// A pluggable query string rewriter
pub trait QueryStringDecorator: Send + Sync {
    /// Rewrite the query string, keeping the position mappings consistent
    fn decorate(
        &self,
        query_string: DecoratedQueryString,
        job: &SearchJob,
        query: &Query,
    ) -> DecoratedQueryString;
}

/// Ordered pipeline of query string decorators
///
/// Decorators run in registration order. The root query string of a query
/// and any search-type-level override are decorated independently; an
/// override is never composed with the root string.
#[derive(Clone, Default)]
pub struct QueryStringDecorators {
    decorators: Vec<Arc<dyn QueryStringDecorator>>,
}

impl QueryStringDecorators {
    /// Create a pipeline from the given decorators
    pub fn new(decorators: Vec<Arc<dyn QueryStringDecorator>>) -> Self {
        Self { decorators }
    }

    /// Pipeline without any decorators
    pub fn none() -> Self {
        Self::default()
    }

    /// Run all decorators over a raw query string
    pub fn decorate(&self, raw: &str, job: &SearchJob, query: &Query) -> DecoratedQueryString {
        self.decorators.iter().fold(
            DecoratedQueryString::undecorated(raw),
            |decorated, decorator| decorator.decorate(decorated, job, query),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Search, TimeRange};

    /// Replaces every query string with a fixed text
    struct FixedStringDecorator(&'static str);

    impl QueryStringDecorator for FixedStringDecorator {
        fn decorate(
            &self,
            query_string: DecoratedQueryString,
            _job: &SearchJob,
            _query: &Query,
        ) -> DecoratedQueryString {
            query_string.replaced(self.0)
        }
    }

    fn job_and_query() -> (SearchJob, Query) {
        let query = Query::new("q1", TimeRange::relative(300), "*");
        let search = Search::new("s1", vec![query.clone()]);
        (SearchJob::new(search, "admin"), query)
    }

    #[test]
    fn test_empty_pipeline_returns_original() {
        let (job, query) = job_and_query();
        let decorated = QueryStringDecorators::none().decorate("source:foo", &job, &query);

        assert_eq!(decorated.original(), "source:foo");
        assert_eq!(decorated.decorated(), "source:foo");
    }

    #[test]
    fn test_decorators_run_in_registration_order() {
        let (job, query) = job_and_query();
        let pipeline = QueryStringDecorators::new(vec![
            Arc::new(FixedStringDecorator("first")),
            Arc::new(FixedStringDecorator("second")),
        ]);

        let decorated = pipeline.decorate("*", &job, &query);
        assert_eq!(decorated.original(), "*");
        assert_eq!(decorated.decorated(), "second");
    }

    #[test]
    fn test_original_offset_through_full_replacement() {
        let (job, query) = job_and_query();
        let pipeline =
            QueryStringDecorators::new(vec![Arc::new(FixedStringDecorator("decorated"))]);

        let decorated = pipeline.decorate("short", &job, &query);
        // any offset inside the replacement points at the start of the
        // original text
        assert_eq!(decorated.original_offset(0), 0);
        assert_eq!(decorated.original_offset(7), 0);
    }

    #[test]
    fn test_original_offset_with_span_mappings() {
        let decorated = DecoratedQueryString::undecorated("user:$name$").rewritten(
            "user:admin",
            vec![PositionMapping {
                original_start: 5,
                original_end: 11,
                decorated_start: 5,
                decorated_end: 10,
            }],
        );

        // offsets inside the rewritten span map to the placeholder start
        assert_eq!(decorated.original_offset(7), 5);
        // offsets outside any span are identity-mapped
        assert_eq!(decorated.original_offset(2), 2);
    }
}
