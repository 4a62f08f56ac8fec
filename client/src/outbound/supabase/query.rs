//! PostgREST query rendering and response header helpers.

use std::fmt::Display;

use url::Url;

/// Media type asking PostgREST for exactly one object instead of an array.
pub(super) const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST error code for "no (or several) rows where one was expected".
pub(super) const NO_ROWS_CODE: &str = "PGRST116";

/// Filter, order, and projection parameters for one table request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TableQuery {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub(super) fn table(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    pub(super) fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_owned())
    }

    pub(super) fn eq(self, column: &str, value: impl Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    /// Case-insensitive substring match; `*` is PostgREST's URL-safe `%`.
    pub(super) fn ilike_contains(self, column: &str, term: &str) -> Self {
        self.param(column, format!("ilike.*{term}*"))
    }

    pub(super) fn order_asc(self, column: &str) -> Self {
        self.param("order", format!("{column}.asc"))
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_owned(), value));
        self
    }

    /// Absolute URL under `<base>/rest/v1/<table>`.
    pub(super) fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.join(&format!("rest/v1/{}", self.table))?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.params
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
///
/// Returns `None` when the header is absent, malformed, or the total is `*`.
pub(super) fn total_from_content_range(header: Option<&str>) -> Option<u64> {
    header?.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn base() -> Url {
        Url::parse("https://abc.supabase.co/").expect("valid base")
    }

    #[test]
    fn list_query_renders_filters_and_order() {
        let url = TableQuery::table("categories")
            .select("*")
            .eq("business_id", "b-1")
            .order_asc("name")
            .url(&base())
            .expect("url builds");

        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/categories?select=*&business_id=eq.b-1&order=name.asc"
        );
    }

    #[test]
    fn search_term_is_wrapped_in_wildcards_and_encoded() {
        let url = TableQuery::table("categories")
            .ilike_contains("name", "soft drinks")
            .url(&base())
            .expect("url builds");

        assert_eq!(url.query(), Some("name=ilike.*soft+drinks*"));
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let base = Url::parse("http://127.0.0.1:9999/proxy/").expect("valid base");
        let url = TableQuery::table("categories").url(&base).expect("url builds");
        assert_eq!(url.as_str(), "http://127.0.0.1:9999/proxy/rest/v1/categories");
    }

    #[rstest]
    #[case(Some("0-24/3573"), Some(3573))]
    #[case(Some("*/0"), Some(0))]
    #[case(Some("0-9/*"), None)]
    #[case(Some("garbage"), None)]
    #[case(None, None)]
    fn content_range_totals(#[case] header: Option<&str>, #[case] expected: Option<u64>) {
        assert_eq!(total_from_content_range(header), expected);
    }
}
