//! Per-translation state.

use query_engine_sql::sql::string::{parameter_token, Param};
use query_engine_sql::sql::symbols::SelectQuerySymbol;

/// The state of one translation: whose data may be read, the values pulled out of the query
/// so far, and the scopes a bare expression is resolved in.
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    /// The team the printed query is restricted to.
    scoping_value: Option<i64>,
    full_query: bool,
    parameters: Vec<Param>,
    scopes: Vec<SelectQuerySymbol>,
    notices: Vec<String>,
}

impl TranslationContext {
    /// A context for `scoping_value`. A full query is expected exactly when a scoping value
    /// is given.
    pub fn new(scoping_value: Option<i64>) -> TranslationContext {
        TranslationContext {
            scoping_value,
            full_query: scoping_value.is_some(),
            ..TranslationContext::default()
        }
    }

    /// Override whether the text is parsed as a full SELECT or as an expression.
    #[must_use]
    pub fn with_full_query(mut self, full_query: bool) -> TranslationContext {
        self.full_query = full_query;
        self
    }

    pub fn scoping_value(&self) -> Option<i64> {
        self.scoping_value
    }

    pub fn has_scope_value(&self) -> bool {
        self.scoping_value.is_some()
    }

    pub fn expects_full_query(&self) -> bool {
        self.full_query
    }

    /// Record a value and return the marker to print in its place.
    pub fn push_parameter(&mut self, value: Param) -> String {
        let token = parameter_token(self.parameters.len());
        self.parameters.push(value);
        token
    }

    pub fn parameters(&self) -> &[Param] {
        &self.parameters
    }

    pub fn take_parameters(&mut self) -> Vec<Param> {
        std::mem::take(&mut self.parameters)
    }

    /// The scopes a bare expression is resolved in, outermost first.
    pub fn current_scope_stack(&self) -> &[SelectQuerySymbol] {
        &self.scopes
    }

    pub(crate) fn scope_stack_mut(&mut self) -> &mut Vec<SelectQuerySymbol> {
        &mut self.scopes
    }

    pub fn add_notice(&mut self, notice: String) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_query_follows_the_scoping_value() {
        assert!(TranslationContext::new(Some(1)).expects_full_query());
        assert!(!TranslationContext::new(None).expects_full_query());
        assert!(TranslationContext::new(None)
            .with_full_query(true)
            .expects_full_query());
    }

    #[test]
    fn parameters_are_numbered_in_push_order() {
        let mut context = TranslationContext::new(None);
        assert_eq!(context.push_parameter(Param::Integer(1)), "%(hogql_val_0)s");
        assert_eq!(
            context.push_parameter(Param::String("a".to_string())),
            "%(hogql_val_1)s"
        );
        assert_eq!(
            context.take_parameters(),
            vec![Param::Integer(1), Param::String("a".to_string())]
        );
        assert!(context.parameters().is_empty());
    }
}
