use crate::catalog::{CatalogEntry, LookupTables, OptionGroup};

/// How a query is compared against the table names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// The whole query must equal a name, ignoring case. Used by /search.
    Exact,
    /// A name occurring anywhere inside the query counts, ignoring case.
    /// Used by the passive message scan, which sees whole chat sentences.
    Contains,
}

pub enum Resolution<'a> {
    DirectHit(&'a CatalogEntry),
    NeedsChoice(&'a OptionGroup),
    NoMatch,
}

/// Classifies a query against the tables. The catalog is checked before the
/// option groups, and within each table the first matching name wins, so a
/// name present in both always resolves as a direct hit.
pub fn resolve<'a>(tables: &'a LookupTables, query: &str, mode: MatchMode) -> Resolution<'a> {
    let probe = query.to_lowercase();
    for entry in tables.catalog() {
        if name_matches(entry.get_name(), &probe, mode) {
            return Resolution::DirectHit(entry);
        }
    }
    for group in tables.groups() {
        if name_matches(group.get_name(), &probe, mode) {
            return Resolution::NeedsChoice(group);
        }
    }
    Resolution::NoMatch
}

fn name_matches(name: &str, probe: &str, mode: MatchMode) -> bool {
    let name = name.to_lowercase();
    match mode {
        MatchMode::Exact => name == probe,
        MatchMode::Contains => probe.contains(&name),
    }
}
