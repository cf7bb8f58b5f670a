//! Fixed per-category stock photo URLs (Unsplash links). No network.

use async_trait::async_trait;
use shelfshot_core::util::stable_index;
use shelfshot_core::{CatalogEntry, ImageCandidate, ImageSource, Provider, SearchRequest};

const UNSPLASH: &str = "https://images.unsplash.com/";
const SIZE_PARAMS: &str = "?auto=format&fit=crop&w=1000&q=80";

/// Category key fragment, tag words, photo ids.
type TemplateRow = (&'static str, &'static str, &'static [&'static str]);

const TEMPLATES: &[TemplateRow] = &[
    (
        "shampoo",
        "shampoo bottle hair packaging",
        &[
            "photo-1535585209827-a15fcdbc4c2d",
            "photo-1556228720-195a672e8a03",
            "photo-1608248543803-ba4f8c70ae0b",
            "photo-1631729371254-42c2892f0e6e",
        ],
    ),
    (
        "lotion",
        "lotion cream bottle skincare",
        &[
            "photo-1556228578-8c89e6adf883",
            "photo-1570194065650-d99fb4bedf0a",
            "photo-1601049541289-9b1b7bbbfe19",
        ],
    ),
    (
        "soap",
        "soap bar packaging",
        &[
            "photo-1600857544200-b2f666a9a2ec",
            "photo-1584305574647-0cc949a2bb9f",
            "photo-1607006344380-b6775a0824a7",
        ],
    ),
    (
        "oil",
        "oil bottle cooking",
        &[
            "photo-1474979266404-7eaacbcd87c5",
            "photo-1620706857370-e1b9770e8bb1",
            "photo-1612549225312-1c5cfd1d7b06",
        ],
    ),
    (
        "perfume",
        "perfume fragrance bottle",
        &[
            "photo-1541643600914-78b084683601",
            "photo-1592945403244-b3fbafd7f539",
            "photo-1594035910387-fea47794261f",
        ],
    ),
    (
        "toothpaste",
        "toothpaste tube dental",
        &[
            "photo-1559591937-abc3a5b9e1fd",
            "photo-1622372738946-62e02505feb3",
        ],
    ),
    (
        "cereal",
        "cereal box breakfast",
        &[
            "photo-1521483451569-e33803c0330c",
            "photo-1495214783159-3503fd1b572d",
            "photo-1517093157656-b9eccef91cb1",
        ],
    ),
    (
        "rice",
        "rice grain bag",
        &[
            "photo-1586201375761-83865001e31c",
            "photo-1536304993881-ff6e9eefa2a6",
        ],
    ),
    (
        "flour",
        "flour bag baking",
        &[
            "photo-1509440159596-0249088772ff",
            "photo-1627485937980-221c88ac04f9",
        ],
    ),
    (
        "beverage",
        "drink beverage bottle can",
        &[
            "photo-1544145945-f90425340c7e",
            "photo-1622483767028-3f66f32aef97",
            "photo-1596803244618-8dbee441d70b",
        ],
    ),
];

const GENERIC: TemplateRow = (
    "",
    "product packaging",
    &[
        "photo-1505740420928-5e560c06d30e",
        "photo-1523275335684-37898b6baf30",
        "photo-1526170375885-4d8ecf77b99f",
        "photo-1560769629-975ec94e6a86",
    ],
);

/// The template row for an entry's category, or the generic row.
fn template_for(entry: &CatalogEntry) -> &'static TemplateRow {
    let Some(category) = entry.category_key() else {
        return &GENERIC;
    };
    TEMPLATES
        .iter()
        .find(|(key, _, _)| category.contains(key))
        .or_else(|| {
            // "drinks", "juice" and friends share the beverage row
            ["drink", "juice", "soda"]
                .iter()
                .any(|w| category.contains(w))
                .then(|| TEMPLATES.iter().find(|(key, _, _)| *key == "beverage"))
                .flatten()
        })
        .unwrap_or(&GENERIC)
}

/// Candidate URLs for an entry: the category list rotated to start at a
/// position derived from the entry id, truncated to `max`.
///
/// The same id always yields the same order, and different ids spread
/// across the list.
pub fn template_urls(entry: &CatalogEntry, max: usize) -> Vec<String> {
    let (_, _, photos) = template_for(entry);
    let start = stable_index(&entry.id, photos.len());
    photos
        .iter()
        .cycle()
        .skip(start)
        .take(photos.len().min(max))
        .map(|id| format!("{}{}{}", UNSPLASH, id, SIZE_PARAMS))
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryTemplateSource;

impl CategoryTemplateSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageSource for CategoryTemplateSource {
    fn provider(&self) -> Provider {
        Provider::CategoryTemplate
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Vec<ImageCandidate> {
        let (_, tags, _) = template_for(request.entry);
        template_urls(request.entry, request.max_results)
            .into_iter()
            .map(|url| ImageCandidate::new(url, Provider::CategoryTemplate).with_tags(tags))
            .collect()
    }
}
