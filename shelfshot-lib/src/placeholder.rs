//! SVG placeholders for entries with no acceptable image.

use std::io;
use std::path::{Path, PathBuf};

use shelfshot_core::CatalogEntry;
use shelfshot_core::util::{PLACEHOLDER_PREFIX, id_file_stem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub filename: String,
    pub path: PathBuf,
    /// False when an existing file was reused.
    pub created: bool,
}

/// `pp_placeholder_<id>.svg`, with the id made filesystem safe.
pub fn placeholder_filename(entry_id: &str) -> String {
    format!("{}{}.svg", PLACEHOLDER_PREFIX, id_file_stem(entry_id))
}

/// Escape text for XML/HTML element content and attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Placeholder SVG markup for an entry.
///
/// The id is embedded as a comment so two entries with the same name still
/// get files with distinct content hashes.
pub fn render_svg(entry: &CatalogEntry) -> String {
    let label = xml_escape(entry.display_name());
    let id = xml_escape(&entry.id).replace("--", "- -");
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"600\" height=\"600\" viewBox=\"0 0 600 600\">\n",
            "  <!-- entry: {id} -->\n",
            "  <rect width=\"600\" height=\"600\" fill=\"#f1f1f1\"/>\n",
            "  <rect x=\"40\" y=\"40\" width=\"520\" height=\"520\" rx=\"24\" fill=\"none\" stroke=\"#c8c8c8\" stroke-width=\"4\"/>\n",
            "  <text x=\"300\" y=\"290\" font-family=\"sans-serif\" font-size=\"28\" fill=\"#555\" text-anchor=\"middle\">{label}</text>\n",
            "  <text x=\"300\" y=\"340\" font-family=\"sans-serif\" font-size=\"18\" fill=\"#999\" text-anchor=\"middle\">image coming soon</text>\n",
            "</svg>\n"
        ),
        id = id,
        label = label
    )
}

/// Make sure the entry's placeholder exists in `dir`.
///
/// An existing placeholder is reused without being rewritten, so repeated
/// runs leave the file (and its hash) unchanged. New files are written to a
/// temp name and renamed into place.
pub fn ensure_placeholder(dir: &Path, entry: &CatalogEntry) -> io::Result<Placeholder> {
    std::fs::create_dir_all(dir)?;
    let filename = placeholder_filename(&entry.id);
    let path = dir.join(&filename);

    let created = if path.is_file() {
        false
    } else {
        // A failed write must not leave a partial file that later runs reuse
        let tmp = dir.join(format!(".{}.part", filename));
        if let Err(e) = std::fs::write(&tmp, render_svg(entry)).and_then(|()| std::fs::rename(&tmp, &path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        log::debug!("Created placeholder {}", filename);
        true
    };

    Ok(Placeholder {
        filename,
        path,
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_reuses_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = CatalogEntry {
            name: Some("Body Lotion".into()),
            ..CatalogEntry::new("p050")
        };

        let first = ensure_placeholder(tmp.path(), &entry).unwrap();
        assert!(first.created);
        assert_eq!(first.filename, "pp_placeholder_p050.svg");
        let bytes = std::fs::read(&first.path).unwrap();

        let second = ensure_placeholder(tmp.path(), &entry).unwrap();
        assert!(!second.created);
        assert_eq!(second.path, first.path);
        assert_eq!(std::fs::read(&second.path).unwrap(), bytes);
    }

    #[test]
    fn name_is_escaped() {
        let entry = CatalogEntry {
            name: Some("Salt & <Pepper>".into()),
            ..CatalogEntry::new("p1")
        };
        let svg = render_svg(&entry);
        assert!(svg.contains("Salt &amp; &lt;Pepper&gt;"));
        assert!(!svg.contains("<Pepper>"));
    }

    #[test]
    fn same_name_different_ids_differ() {
        let a = CatalogEntry {
            name: Some("Soap".into()),
            ..CatalogEntry::new("a")
        };
        let b = CatalogEntry {
            name: Some("Soap".into()),
            ..CatalogEntry::new("b")
        };
        assert_ne!(render_svg(&a), render_svg(&b));
    }

    #[test]
    fn filename_sanitizes_id() {
        let name = placeholder_filename("a/b c");
        assert!(name.starts_with("pp_placeholder_a_b_c_") && name.ends_with(".svg"));
        assert_ne!(placeholder_filename("a/b"), placeholder_filename("a_b"));
        assert_eq!(placeholder_filename("a_b"), "pp_placeholder_a_b.svg");
    }

    #[test]
    fn write_leaves_only_the_finished_file() {
        let tmp = tempfile::tempdir().unwrap();
        let entry = CatalogEntry::new("p7");
        let placeholder = ensure_placeholder(tmp.path(), &entry).unwrap();

        let names: Vec<String> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![placeholder.filename.clone()]);
        assert_eq!(
            std::fs::read_to_string(&placeholder.path).unwrap(),
            render_svg(&entry)
        );
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_leaves_no_placeholder() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("images");
        std::fs::create_dir(&dir).unwrap();
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions
        if std::fs::write(dir.join("write-check"), b"x").is_ok() {
            return;
        }

        assert!(ensure_placeholder(&dir, &CatalogEntry::new("p8")).is_err());
        std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

        let retry = ensure_placeholder(&dir, &CatalogEntry::new("p8")).unwrap();
        assert!(retry.created);
    }
}
