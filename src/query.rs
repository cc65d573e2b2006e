// src/query.rs

use mongodb::bson::{doc, Document};
use serde::Deserialize;

/// Sentinel value the frontend sends when the status dropdown is cleared.
pub const ALL: &str = "all";

/// High private-use code point appended to the search term to close the
/// prefix range (`field >= term AND field <= term + SENTINEL`). Emulates a
/// case-sensitive "starts with" on the binary string ordering.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Query-string parameters shared by every list page's live search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub estado: String,
}

/// Document field names a collection binds its live search to.
#[derive(Debug, Clone, Copy)]
pub struct SearchFields {
    /// Primary display field the prefix search runs against.
    pub search: &'static str,
    /// Status/role/category field the equality filter runs against.
    pub estado: &'static str,
    /// Creation timestamp used for the default ordering.
    pub criado_em: &'static str,
}

/// A ready-to-run find: filter plus the optional default ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuery {
    pub filter: Document,
    pub sort: Option<Document>,
}

/// Rebuilds the list query for the current search term and status filter.
///
/// A non-sentinel status adds an equality predicate; a non-empty search term
/// adds the prefix range on the display field. With neither active the
/// filter is empty and the default ascending creation-time sort applies.
/// The sort applies only then, so clearing a filter visibly re-orders the
/// list.
pub fn build_live_query(search: &str, estado: &str, fields: &SearchFields) -> LiveQuery {
    let mut filter = Document::new();

    if !estado.is_empty() && estado != ALL {
        filter.insert(fields.estado, estado);
    }

    let term = search.trim();
    if !term.is_empty() {
        let (lower, upper) = prefix_bounds(term);
        filter.insert(fields.search, doc! { "$gte": lower, "$lte": upper });
    }

    let sort = if filter.is_empty() {
        let mut sort = Document::new();
        sort.insert(fields.criado_em, 1);
        Some(sort)
    } else {
        None
    };

    LiveQuery { filter, sort }
}

/// Inclusive bounds of the prefix range for a search term.
pub fn prefix_bounds(term: &str) -> (String, String) {
    let mut upper = String::with_capacity(term.len() + PREFIX_SENTINEL.len_utf8());
    upper.push_str(term);
    upper.push(PREFIX_SENTINEL);
    (term.to_string(), upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: SearchFields = SearchFields {
        search: "categoria",
        estado: "estado",
        criado_em: "criadoEm",
    };

    /// Mirror of the range predicate the backend evaluates, on the same
    /// binary string ordering MongoDB uses for the default collation.
    fn in_range(value: &str, term: &str) -> bool {
        let (lower, upper) = prefix_bounds(term);
        value >= lower.as_str() && value <= upper.as_str()
    }

    #[test]
    fn empty_inputs_fall_back_to_creation_time_ordering() {
        for estado in ["", ALL] {
            let query = build_live_query("", estado, &FIELDS);
            assert!(query.filter.is_empty());
            assert_eq!(query.sort, Some(doc! { "criadoEm": 1 }));
        }
    }

    #[test]
    fn whitespace_only_search_counts_as_empty() {
        let query = build_live_query("   ", "all", &FIELDS);
        assert!(query.filter.is_empty());
        assert!(query.sort.is_some());
    }

    #[test]
    fn status_filter_becomes_an_equality_predicate() {
        let query = build_live_query("", "Pendente", &FIELDS);
        assert_eq!(query.filter, doc! { "estado": "Pendente" });
        assert_eq!(query.sort, None);
    }

    #[test]
    fn search_term_becomes_a_prefix_range() {
        let query = build_live_query("Mensal", "all", &FIELDS);
        assert_eq!(
            query.filter,
            doc! { "categoria": { "$gte": "Mensal", "$lte": format!("Mensal{}", PREFIX_SENTINEL) } }
        );
        assert_eq!(query.sort, None);
    }

    #[test]
    fn search_and_status_combine_into_one_filter() {
        let query = build_live_query("Projetos", "Recebida", &FIELDS);
        assert_eq!(
            query.filter,
            doc! {
                "estado": "Recebida",
                "categoria": { "$gte": "Projetos", "$lte": format!("Projetos{}", PREFIX_SENTINEL) },
            }
        );
        assert_eq!(query.sort, None);
    }

    #[test]
    fn prefix_range_matches_exactly_the_starts_with_set() {
        // equal to the term, a strict extension of it, and unrelated values
        assert!(in_range("Mensal", "Mensal"));
        assert!(in_range("Mensalidade de Cursos", "Mensal"));
        assert!(!in_range("Projetos", "Mensal"));
        assert!(!in_range("Outras Receitas", "Mensal"));
        // prefix of the term, not the other way around: no match
        assert!(!in_range("Men", "Mensal"));
    }

    #[test]
    fn prefix_search_is_case_sensitive() {
        assert!(!in_range("mensalidade", "Mensal"));
        assert!(!in_range("MENSALIDADE", "Mensal"));
    }
}
