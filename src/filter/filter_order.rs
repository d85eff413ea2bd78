use super::error::FilterError;
use super::types::{MapperRules, SortSpec};

pub struct FilterOrder;

impl FilterOrder {
    /// Signed sort token for the backend (`-created_at` / `created_at`).
    ///
    /// Columns outside the resource's allow-list produce no token at all; the
    /// caller must not assume the server sorted in that case.
    pub fn generate(sort: Option<&SortSpec>, rules: &MapperRules) -> Option<String> {
        let sort = sort?;
        match rules.sort_column(&sort.column_id) {
            Some(column) if sort.descending => Some(format!("-{}", column)),
            Some(column) => Some(column.to_string()),
            None => {
                tracing::debug!("Sort column '{}' is not server-sortable, ignoring", sort.column_id);
                None
            }
        }
    }

    /// Parse a signed token back into a [`SortSpec`]
    pub fn parse(token: &str) -> Result<SortSpec, FilterError> {
        let trimmed = token.trim();
        let (column, descending) = match trimmed.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };
        if column.is_empty() || !column.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            return Err(FilterError::InvalidSort(token.to_string()));
        }
        Ok(SortSpec { column_id: column.to_string(), descending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: MapperRules = MapperRules::new(None, &[("id", "id"), ("created_at", "created_at")], &[]);

    #[test]
    fn descending_prefixes_minus() {
        assert_eq!(FilterOrder::generate(Some(&SortSpec::desc("created_at")), &RULES).as_deref(), Some("-created_at"));
        assert_eq!(FilterOrder::generate(Some(&SortSpec::asc("id")), &RULES).as_deref(), Some("id"));
    }

    #[test]
    fn disallowed_column_yields_nothing() {
        assert_eq!(FilterOrder::generate(Some(&SortSpec::asc("name")), &RULES), None);
        assert_eq!(FilterOrder::generate(None, &RULES), None);
    }

    #[test]
    fn parse_round_trips_signed_tokens() {
        assert_eq!(FilterOrder::parse("-id").unwrap(), SortSpec::desc("id"));
        assert_eq!(FilterOrder::parse("name").unwrap(), SortSpec::asc("name"));
        assert!(FilterOrder::parse("-").is_err());
        assert!(FilterOrder::parse("id desc").is_err());
    }
}
