use super::*;
use crate::document::CertificateStatus;
use crate::error::ResolveError;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

struct Gallery {
    _temp: TempDir,
    root: PathBuf,
}

impl Gallery {
    fn new(images: &[&str]) -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = temp.path().canonicalize().expect("canonical temp dir");
        for image in images {
            let path = root.join(image);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, b"img").expect("write image");
        }
        Gallery { _temp: temp, root }
    }

    fn load(&self, toml: &str) -> MetadataDocument {
        let source = self.root.join("meta.toml");
        fs::write(&source, toml).expect("write source");
        let mut doc = crate::loader::load(&[source]).expect("load");
        crate::normalize::normalize(&mut doc).expect("normalize");
        doc
    }

    fn resolve(&self, toml: &str) -> ResolveResult<MetadataDocument> {
        let mut doc = self.load(toml);
        resolve_certificates(&mut doc)?;
        Ok(doc)
    }

    fn id(&self, relative: &str) -> ArtworkId {
        ArtworkId::from_path(&self.root.join(relative))
    }

    fn present(&self, doc: &MetadataDocument, artwork: &str) -> (PathBuf, Attributes) {
        match doc.certificate(&self.id(artwork)) {
            CertificateStatus::Present { path, attributes } => (path, attributes),
            other => panic!("expected certificate for {artwork}, got {other:?}"),
        }
    }
}

#[test]
fn undeclared_artwork_gets_default_certificate() {
    let gallery = Gallery::new(&["square.png"]);
    let doc = gallery
        .resolve("creator = \"Ada\"\n[\"square.png\"]\ntitle = \"Square\"\n")
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "square.png");
    assert_eq!(path, gallery.root.join("square").join("certificate.pdf"));
    assert_eq!(attributes[TITLE], DEFAULT_TITLE);
    assert_eq!(attributes[AUTHOR], "Ada");
}

#[test]
fn relative_declarations_are_anchored_under_the_artwork() {
    let gallery = Gallery::new(&["a.png", "b.png", "c.png", "d.png"]);
    let doc = gallery
        .resolve(
            r#"
creator = "Ada"
["a.png"]
certificate = "./certificate.pdf"
["b.png"]
certificate = "./b/signed.pdf"
["c.png"]
certificate = "sub/custom.pdf"
["d.png"]
certificate = "/vault/d.pdf"
"#,
        )
        .expect("resolve");
    let root = &gallery.root;
    assert_eq!(gallery.present(&doc, "a.png").0, root.join("a/certificate.pdf"));
    assert_eq!(gallery.present(&doc, "b.png").0, root.join("b/signed.pdf"));
    assert_eq!(gallery.present(&doc, "c.png").0, root.join("sub/c/custom.pdf"));
    assert_eq!(gallery.present(&doc, "d.png").0, PathBuf::from("/vault/d.pdf"));
}

#[test]
fn global_empty_certificate_forces_absence() {
    let gallery = Gallery::new(&["a.png", "b.png"]);
    let doc = gallery
        .resolve(
            r#"
certificate = ""
["b.png"]
coa = "./certificate.pdf"
"#,
        )
        .expect("resolve");
    assert_eq!(doc.certificate(&gallery.id("a.png")), CertificateStatus::Absent);
    assert_eq!(doc.artwork(&gallery.id("a.png")).unwrap()[fields::CERTIFICATE], Value::Null);
    let (path, _) = gallery.present(&doc, "b.png");
    assert_eq!(path, gallery.root.join("b/certificate.pdf"));
    assert!(!doc.artwork(&gallery.id("b.png")).unwrap().contains_key("coa"));
    assert!(!doc.global().contains_key(fields::CERTIFICATE));
}

#[test]
fn global_declaration_supplies_path_and_defaults() {
    let gallery = Gallery::new(&["a.png", "b.png"]);
    let doc = gallery
        .resolve(
            r#"
[certificate."./coa.pdf"]
title = "Signed Edition"
signer_name = "Ada"

["b.png"]
certificate = { "./certificate.pdf" = { Subject = "Own" } }
"#,
        )
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "a.png");
    assert_eq!(path, gallery.root.join("a/coa.pdf"));
    assert_eq!(attributes[TITLE], "Signed Edition");
    assert_eq!(attributes["signer_name"], "Ada");

    let (path, attributes) = gallery.present(&doc, "b.png");
    assert_eq!(path, gallery.root.join("b/certificate.pdf"));
    assert_eq!(attributes["Subject"], "Own");
    assert_eq!(attributes[TITLE], DEFAULT_TITLE);
    assert!(!attributes.contains_key("signer_name"));
}

#[test]
fn unsupported_global_value_falls_back_with_warning() {
    let gallery = Gallery::new(&["a.png"]);
    let doc = gallery
        .resolve("certificate = \"https://example.org/coa.pdf\"\n")
        .expect("resolve");
    assert_eq!(gallery.present(&doc, "a.png").0, gallery.root.join("a/certificate.pdf"));
    assert!(matches!(
        doc.warnings(),
        [InputWarning::UnsupportedGlobalCertificate { .. }]
    ));
}

#[test]
fn remote_or_non_pdf_declarations_are_ignored() {
    let gallery = Gallery::new(&["a.png", "b.png"]);
    let doc = gallery
        .resolve(
            r#"
["a.png"]
certificate = "https://example.org/a.pdf"
["b.png"]
certificate = "./b/notes.txt"
"#,
        )
        .expect("resolve");
    assert_eq!(gallery.present(&doc, "a.png").0, gallery.root.join("a/certificate.pdf"));
    assert_eq!(gallery.present(&doc, "b.png").0, gallery.root.join("b/certificate.pdf"));
    assert_eq!(doc.warnings().len(), 2);
    assert!(doc
        .warnings()
        .iter()
        .all(|warning| matches!(warning, InputWarning::IgnoredCertificate { .. })));
}

#[test]
fn standalone_table_wins_over_inline_attributes() {
    let gallery = Gallery::new(&["square.png", "round.png"]);
    let doc = gallery
        .resolve(
            r#"
["square.png"]
certificate = { "./certificate.pdf" = { title = "Inline", edition = "1/10" } }

["square/certificate.pdf"]
Title = "Standalone"
"XMP-pdf:keywords" = "provenance"

["round/custom.pdf"]
signer = "Grace"
"#,
        )
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "square.png");
    assert_eq!(path, gallery.root.join("square/certificate.pdf"));
    assert_eq!(attributes[TITLE], "Standalone");
    assert_eq!(attributes["edition"], "1/10");
    assert_eq!(attributes["Keywords"], "provenance");
    assert!(!attributes.contains_key("XMP-pdf:Keywords"));

    let (path, attributes) = gallery.present(&doc, "round.png");
    assert_eq!(path, gallery.root.join("round/custom.pdf"));
    assert_eq!(attributes["signer"], "Grace");
    assert!(doc.certificate_tables.is_empty());
}

#[test]
fn absolute_table_is_claimed_by_artwork_directory() {
    let gallery = Gallery::new(&["square.png"]);
    let table = gallery.root.join("square").join("signed.pdf");
    let doc = gallery
        .resolve(&format!("[{:?}]\nsigner = \"Ada\"\n", table.display().to_string()))
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "square.png");
    assert_eq!(path, table);
    assert_eq!(attributes["signer"], "Ada");
}

#[test]
fn absolute_table_merges_into_matching_declaration() {
    let gallery = Gallery::new(&["square.png", "round.png"]);
    let signed = gallery.root.join("vault").join("square.pdf");
    let doc = gallery
        .resolve(&format!(
            "[\"square.png\"]\ncertificate = {{ {path:?} = {{ title = \"Inline\", edition = \"2/5\" }} }}\n\n[{path:?}]\ntitle = \"Signed\"\nsigner = \"Ada\"\n",
            path = signed.display().to_string()
        ))
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "square.png");
    assert_eq!(path, signed);
    assert_eq!(attributes[TITLE], "Signed");
    assert_eq!(attributes["signer"], "Ada");
    assert_eq!(attributes["edition"], "2/5");

    let (path, attributes) = gallery.present(&doc, "round.png");
    assert_eq!(path, gallery.root.join("round/certificate.pdf"));
    assert!(!attributes.contains_key("signer"));
}

#[test]
fn relative_table_from_parent_source_targets_the_artwork() {
    let gallery = Gallery::new(&["art/square.png", "art/round.png"]);
    let doc = gallery
        .resolve(
            r#"
["art/square.png"]
["art/round.png"]
certificate = "./signed.pdf"

["art/square/certificate.pdf"]
signer = "Ada"

["art/round/signed.pdf"]
signer = "Grace"
"#,
        )
        .expect("resolve");
    let (path, attributes) = gallery.present(&doc, "art/square.png");
    assert_eq!(path, gallery.root.join("art/square/certificate.pdf"));
    assert_eq!(attributes["signer"], "Ada");

    let (path, attributes) = gallery.present(&doc, "art/round.png");
    assert_eq!(path, gallery.root.join("art/round/signed.pdf"));
    assert_eq!(attributes["signer"], "Grace");
}

#[test]
fn table_without_artwork_context_is_rejected() {
    let gallery = Gallery::new(&["square.png"]);
    let mut doc = gallery.load("[\"certificate.pdf\"]\ntitle = \"Loose\"\n");
    let before = doc.clone();
    let err = resolve_certificates(&mut doc).unwrap_err();
    assert_eq!(
        err,
        ResolveError::Configuration(ConfigurationError::CertificateContext {
            header: "certificate.pdf".to_string(),
        })
    );
    assert_eq!(doc.artworks, before.artworks);
    assert_eq!(doc.certificate_tables, before.certificate_tables);
}

#[test]
fn unmatched_table_is_rejected() {
    let gallery = Gallery::new(&["square.png"]);
    let err = gallery
        .resolve("[\"ghost/certificate.pdf\"]\ntitle = \"Nobody\"\n")
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration(ConfigurationError::UnmatchedCertificateTable { .. })
    ));
}

#[test]
fn table_for_opted_out_artwork_is_waived() {
    let gallery = Gallery::new(&["square.png"]);
    let doc = gallery
        .resolve(
            r#"
["square.png"]
certificate = ""

["square/certificate.pdf"]
title = "Unused"
"#,
        )
        .expect("resolve");
    assert_eq!(doc.certificate(&gallery.id("square.png")), CertificateStatus::Absent);
}

#[test]
fn previews_do_not_get_certificates() {
    let gallery = Gallery::new(&["square.png", "square/preview.jpg"]);
    let doc = gallery
        .resolve("[\"square.png\"]\n[\"square/preview.jpg\"]\n")
        .expect("resolve");
    assert_eq!(
        doc.certificate(&gallery.id("square/preview.jpg")),
        CertificateStatus::Unresolved
    );
    gallery.present(&doc, "square.png");
}

#[test]
fn resolving_twice_changes_nothing() {
    let gallery = Gallery::new(&["a.png", "b.png"]);
    let mut doc = gallery.resolve(
        r#"
creator = "Ada"
["a.png"]
certificate = { "./certificate.pdf" = { subject = "S" } }
["b.png"]
certificate = ""
"#,
    )
    .expect("resolve");
    let once = doc.artworks.clone();
    resolve_certificates(&mut doc).expect("resolve again");
    assert_eq!(doc.artworks, once);
}

#[test]
fn certificate_keys_are_normalized() {
    let keys = normalize_certificate_keys(
        json!({
            "TITLE": "t",
            "xmp-pdf:author": "a",
            "Signer_Name": "s",
        })
        .as_object()
        .expect("object"),
    );
    assert_eq!(
        Value::Object(keys),
        json!({ "Title": "t", "XMP-pdf:Author": "a", "signer_name": "s" })
    );
}

#[test]
fn certificate_field_aliases() {
    for alias in ["certificate", "COA", "certificate_of_authenticity", "xmp-xmprights:certificate"] {
        assert!(is_certificate_field(alias), "{alias}");
    }
    assert!(!is_certificate_field("license"));
}
