//! Static HTML gallery for eyeballing a sample of catalog images.

use std::fmt::Write as _;
use std::path::Path;

use shelfshot_core::CatalogEntry;
use shelfshot_core::util::local_filename;

use crate::placeholder::xml_escape as html_escape;

/// Pick up to `count` entries spread evenly across the catalog.
pub fn sample_evenly<T>(items: &[T], count: usize) -> Vec<&T> {
    if count == 0 || items.is_empty() {
        return Vec::new();
    }
    if count >= items.len() {
        return items.iter().collect();
    }
    (0..count).map(|i| &items[i * items.len() / count]).collect()
}

/// How gallery thumbnails resolve local image paths.
#[derive(Debug, Clone)]
pub struct GalleryOptions {
    pub title: String,
    /// Public prefix of local `image_url`s, e.g. `/images/products`.
    pub public_prefix: String,
    /// Where the gallery finds local files, relative to the HTML file or
    /// absolute (`../public/images/products`).
    pub image_base: String,
}

fn thumbnail_src(entry: &CatalogEntry, options: &GalleryOptions) -> Option<String> {
    let url = entry.current_image()?;
    Some(match local_filename(url, &options.public_prefix) {
        Some(file) => format!("{}/{}", options.image_base.trim_end_matches('/'), file),
        None => url.to_string(),
    })
}

pub fn render_gallery(entries: &[&CatalogEntry], options: &GalleryOptions) -> String {
    let mut html = String::new();
    let title = html_escape(&options.title);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 24px; background: #fafafa; }}\n\
         .grid {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 16px; }}\n\
         .card {{ background: #fff; border: 1px solid #ddd; border-radius: 8px; padding: 8px; font-size: 13px; }}\n\
         .card img {{ width: 100%; height: 180px; object-fit: contain; background: #f1f1f1; }}\n\
         .id {{ color: #888; }}\n\
         .file {{ color: #666; font-family: monospace; word-break: break-all; }}\n\
         </style>\n</head>\n<body>\n<h1>{title}</h1>\n<p>{count} entries</p>\n<div class=\"grid\">\n",
        title = title,
        count = entries.len()
    );

    for entry in entries {
        let file = entry
            .current_image()
            .map(|url| {
                local_filename(url, &options.public_prefix)
                    .unwrap_or(url)
                    .to_string()
            })
            .unwrap_or_else(|| "(none)".to_string());
        let image = match thumbnail_src(entry, options) {
            Some(src) => format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                html_escape(&src),
                html_escape(entry.display_name())
            ),
            None => "<div class=\"missing\">no image</div>".to_string(),
        };
        let _ = writeln!(
            html,
            "<div class=\"card\">{}<div class=\"id\">{}</div><div class=\"name\">{}</div><div class=\"file\">{}</div></div>",
            image,
            html_escape(&entry.id),
            html_escape(entry.display_name()),
            html_escape(&file)
        );
    }

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Render and write the gallery, creating parent directories.
pub fn write_gallery(
    path: &Path,
    entries: &[&CatalogEntry],
    options: &GalleryOptions,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_gallery(entries, options))?;
    log::info!("Wrote gallery of {} entries to {}", entries.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> GalleryOptions {
        GalleryOptions {
            title: "Review <sample>".into(),
            public_prefix: "/images/products".into(),
            image_base: "../public/images/products".into(),
        }
    }

    #[test]
    fn sample_is_spread_and_bounded() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(sample_evenly(&items, 5), vec![&0, &2, &4, &6, &8]);
        assert_eq!(sample_evenly(&items, 20).len(), 10);
        assert!(sample_evenly(&items, 0).is_empty());
        assert!(sample_evenly::<u32>(&[], 3).is_empty());
    }

    #[test]
    fn text_is_escaped() {
        let entry = CatalogEntry {
            name: Some("<script>alert(1)</script>".into()),
            image_url: Some("/images/products/p1.jpg?v=2".into()),
            ..CatalogEntry::new("p\"1")
        };
        let html = render_gallery(&[&entry], &options());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("p&quot;1"));
        assert!(html.contains("Review &lt;sample&gt;"));
        assert!(html.contains("src=\"../public/images/products/p1.jpg\""));
    }

    #[test]
    fn external_and_missing_images() {
        let external = CatalogEntry {
            image_url: Some("https://cdn.example.com/a.jpg".into()),
            ..CatalogEntry::new("e1")
        };
        let missing = CatalogEntry::new("m1");
        let html = render_gallery(&[&external, &missing], &options());
        assert!(html.contains("src=\"https://cdn.example.com/a.jpg\""));
        assert!(html.contains("no image"));
        assert!(html.contains("(none)"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("artifacts").join("gallery.html");
        write_gallery(&path, &[], &options()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("0 entries"));
    }
}
