//! Where a view fetches its document from.

/// Default document of the sequence-diagram view.
pub const SEQUENCE_DEFAULT_PATH: &str = "seq/data.json";
/// Default document of the graph view.
pub const GRAPH_DEFAULT_PATH: &str = "data.json";

/// Resolve the document path from a page query string (`?data=...`).
///
/// A non-empty `data` parameter is served from the site root; otherwise
/// `default` is used as-is.
pub fn data_path_from_query(query: &str, default: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "data")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .map(|value| format!("/{}", value.trim_start_matches('/')))
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_parameter_is_rooted() {
        assert_eq!(
            data_path_from_query("?data=seq/login.json", SEQUENCE_DEFAULT_PATH),
            "/seq/login.json"
        );
        assert_eq!(
            data_path_from_query("x=1&data=%2Fgraphs%2Fa.json", GRAPH_DEFAULT_PATH),
            "/graphs/a.json"
        );
    }

    #[test]
    fn missing_or_empty_parameter_uses_default() {
        assert_eq!(data_path_from_query("", SEQUENCE_DEFAULT_PATH), "seq/data.json");
        assert_eq!(data_path_from_query("?other=1", GRAPH_DEFAULT_PATH), "data.json");
        assert_eq!(data_path_from_query("?data=", SEQUENCE_DEFAULT_PATH), "seq/data.json");
    }
}
