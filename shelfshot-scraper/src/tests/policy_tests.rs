use super::*;

fn entry(id: &str, brand: Option<&str>, name: Option<&str>, category: Option<&str>) -> CatalogEntry {
    CatalogEntry {
        brand: brand.map(str::to_string),
        name: name.map(str::to_string),
        category: category.map(str::to_string),
        ..CatalogEntry::new(id)
    }
}

#[test]
fn presets_parse_by_name() {
    for preset in Preset::all() {
        assert_eq!(preset.short_name().parse::<Preset>().unwrap(), *preset);
    }
    assert_eq!("fill_missing".parse::<Preset>().unwrap(), Preset::FillMissing);
    assert_eq!("missing".parse::<Preset>().unwrap(), Preset::FillMissing);
    assert!("everything".parse::<Preset>().is_err());
}

#[test]
fn preset_fields() {
    let remap = RunPolicy::preset(Preset::Remap);
    assert!(remap.force);
    assert_eq!(remap.filename_style, FilenameStyle::Randomized);
    assert_eq!(remap.backup_suffix.as_deref(), Some("remap.bak"));
    assert_eq!(remap.mapping_csv, "remap_mapping.csv");

    let pin = RunPolicy::preset(Preset::Pinterest);
    assert_eq!(pin.providers, vec![Provider::HtmlScrape]);
    assert_eq!(pin.backup_suffix.as_deref(), Some("pinterest.bak"));

    let stock = RunPolicy::preset(Preset::Stock);
    assert_eq!(stock.filename_style, FilenameStyle::Deterministic);
    assert!(!stock.uses_network());
    assert!(!stock.force);

    let manual = RunPolicy::preset(Preset::Manual);
    assert_eq!(manual.backup_suffix.as_deref(), Some("manual-pinterest.bak"));

    let dedup = RunPolicy::preset(Preset::Dedup);
    assert_eq!(dedup.selection, SelectionMode::Strict);
    assert!(dedup.require_keywords);
    assert!(!dedup.keep_existing_on_no_match);

    let fill = RunPolicy::preset(Preset::FillMissing);
    assert_eq!(fill.mapping_csv, "fill_missing_mapping.csv");
    assert!(fill.backup_suffix.is_none());
}

#[test]
fn queries_go_from_specific_to_general() {
    let e = entry("p1", Some("Acme"), Some("Argan Shampoo"), Some("Shampoo"));
    assert_eq!(
        build_queries(&e, false),
        vec!["Acme Argan Shampoo Shampoo", "Argan Shampoo Shampoo", "Shampoo product"]
    );
    let strict = build_queries(&e, true);
    assert_eq!(strict.last().unwrap(), "Argan Shampoo product packaging");
}

#[test]
fn queries_skip_missing_parts_and_duplicates() {
    let e = entry("p1", None, Some("Soap"), None);
    assert_eq!(build_queries(&e, false), vec!["Soap"]);
    let bare = entry("p77", None, None, None);
    assert_eq!(build_queries(&bare, false), vec!["p77"]);
}

#[test]
fn id_range_uses_natural_order() {
    let range: IdRange = "p9..p100".parse().unwrap();
    assert!(range.contains("p9"));
    assert!(range.contains("p10"));
    assert!(range.contains("p100"));
    assert!(!range.contains("p8"));
    assert!(!range.contains("p101"));

    let padded: IdRange = "p001..p050".parse().unwrap();
    assert!(padded.contains("p050"));
    assert!(!padded.contains("p051"));
}

#[test]
fn id_range_rejects_bad_input() {
    assert!("p1".parse::<IdRange>().is_err());
    assert!("..p2".parse::<IdRange>().is_err());
    assert!("p9..p1".parse::<IdRange>().is_err());
    assert_eq!("1..=5".parse::<IdRange>().unwrap().to, "5");
}

#[test]
fn filter_combines_category_range_and_ids() {
    let filter = EntryFilter {
        category: Some("Shampoo".into()),
        id_range: Some("p1..p5".parse().unwrap()),
        only_ids: None,
    };
    assert!(filter.matches(&entry("p2", None, None, Some("shampoo"))));
    assert!(!filter.matches(&entry("p2", None, None, Some("soap"))));
    assert!(!filter.matches(&entry("p9", None, None, Some("shampoo"))));

    let ids = EntryFilter {
        only_ids: Some(["a".to_string()].into_iter().collect()),
        ..EntryFilter::default()
    };
    assert!(ids.matches(&entry("a", None, None, None)));
    assert!(!ids.matches(&entry("b", None, None, None)));
    assert!(EntryFilter::default().is_empty());
}
