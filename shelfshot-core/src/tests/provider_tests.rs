use super::*;

#[test]
fn canonical_names_round_trip() {
    for &provider in Provider::all() {
        let parsed: Provider = provider.short_name().parse().unwrap();
        assert_eq!(parsed, provider, "round-trip failed for {:?}", provider);
    }
}

#[test]
fn aliases_resolve_correctly() {
    let cases = [
        ("pin", Provider::HtmlScrape),
        ("scrape", Provider::HtmlScrape),
        ("tag-search", Provider::TagSearch),
        ("stock", Provider::CategoryTemplate),
        ("provided", Provider::Manual),
    ];
    for (input, expected) in cases {
        let parsed: Provider = input.parse().unwrap();
        assert_eq!(
            parsed, expected,
            "alias '{}' should parse to {:?}",
            input, expected
        );
    }
}

#[test]
fn case_insensitive_parsing() {
    let parsed: Provider = "Pixabay".parse().unwrap();
    assert_eq!(parsed, Provider::TagSearch);
    let parsed: Provider = " PINTEREST ".parse().unwrap();
    assert_eq!(parsed, Provider::HtmlScrape);
}

#[test]
fn unknown_string_returns_err() {
    let result: Result<Provider, _> = "flickr".parse();
    assert!(result.is_err());
}

#[test]
fn short_name_is_first_alias() {
    for &provider in Provider::all() {
        assert_eq!(
            provider.short_name(),
            provider.aliases()[0],
            "short_name should be first alias for {:?}",
            provider,
        );
    }
}

#[test]
fn prefixes_are_distinct() {
    let prefixes: std::collections::HashSet<_> =
        Provider::all().iter().map(|p| p.filename_prefix()).collect();
    assert_eq!(prefixes.len(), Provider::all().len());
    for p in &prefixes {
        assert!(!p.starts_with("pp_placeholder"));
    }
}

#[test]
fn only_network_providers_are_remote() {
    assert!(Provider::TagSearch.is_remote());
    assert!(Provider::HtmlScrape.is_remote());
    assert!(!Provider::CategoryTemplate.is_remote());
    assert!(!Provider::Manual.is_remote());
}
