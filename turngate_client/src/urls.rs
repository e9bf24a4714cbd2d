//! Request URL composition.

use url::Url;

/// Resolve `path` against `base`, keeping the base's query and fragment.
///
/// The base URL is the single source of routing and session context (api
/// versions, auth markers embedded in the query), so whatever query or
/// fragment the relative path itself carries is discarded and the base's
/// are copied onto the result.
pub fn resolve_with_base_context(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut resolved = base.join(path)?;
    resolved.set_query(base.query());
    resolved.set_fragment(base.fragment());
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Url {
        Url::parse(input).unwrap_or_else(|e| panic!("bad test url {input}: {e}"))
    }

    #[test]
    fn resolves_path_against_base_authority() {
        let base = parse("https://engine.example/environments/e1/");
        let resolved = resolve_with_base_context(&base, "conversations").unwrap_or_else(|e| {
            panic!("resolve failed: {e}");
        });
        assert_eq!(
            resolved.as_str(),
            "https://engine.example/environments/e1/conversations"
        );
    }

    #[test]
    fn base_query_and_fragment_always_win() {
        let base = parse("https://engine.example/e1/?api-version=2022-03-01-preview#ctx");
        let resolved =
            resolve_with_base_context(&base, "conversations?intruder=1#other").unwrap_or_else(
                |e| panic!("resolve failed: {e}"),
            );

        assert_eq!(resolved.query(), Some("api-version=2022-03-01-preview"));
        assert_eq!(resolved.fragment(), Some("ctx"));
        assert_eq!(resolved.path(), "/e1/conversations");
    }

    #[test]
    fn relative_query_is_dropped_when_base_has_none() {
        let base = parse("https://engine.example/e1/");
        let resolved = resolve_with_base_context(&base, "conversations?x=1#y")
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        assert_eq!(resolved.query(), None);
        assert_eq!(resolved.fragment(), None);
    }

    #[test]
    fn nested_paths_resolve() {
        let base = parse("https://engine.example/e1/?api-version=1");
        let resolved = resolve_with_base_context(&base, "conversations/c-42/continue")
            .unwrap_or_else(|e| panic!("resolve failed: {e}"));

        assert_eq!(resolved.path(), "/e1/conversations/c-42/continue");
        assert_eq!(resolved.query(), Some("api-version=1"));
    }
}
