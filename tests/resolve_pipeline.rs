mod common;

use artwork_provenance::vocabulary::{self, fields, GroupKind};
use artwork_provenance::{
    normalize, ArtworkId, CertificateStatus, ConfigurationError, Reference, ResolveError,
    Resolver,
};
use common::Gallery;
use serde_json::{json, Value};
use std::sync::Arc;

fn id(gallery: &Gallery, relative: &str) -> ArtworkId {
    ArtworkId::from_path(&gallery.path(relative))
}

#[test]
fn global_license_file_applies_to_every_artwork() {
    let gallery = Gallery::new();
    gallery.images(&["square.png", "round.png"]);
    gallery.file("LICENSE.txt", "All rights reserved.");
    let source = gallery.file(
        "meta.toml",
        r#"
license = "./LICENSE.txt"
["square.png"]
title = "Square"
["round.png"]
title = "Round"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let license = Reference::LocalFile(gallery.path("LICENSE.txt"));
    for name in ["square.png", "round.png"] {
        let artwork = id(&gallery, name);
        assert_eq!(doc.license(&artwork), Some(license.clone()), "{name}");
        assert_eq!(
            doc.artwork(&artwork).unwrap()[fields::LICENSE],
            gallery.uri("LICENSE.txt")
        );
    }
    assert!(!doc.global().contains_key(fields::LICENSE));
    assert!(!doc.global().contains_key("schema:license"));
}

#[test]
fn undeclared_certificate_defaults_under_the_artwork() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://creativecommons.org/licenses/by/4.0/"
creator = "Ada Lovelace"
["square.png"]
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    match doc.certificate(&id(&gallery, "square.png")) {
        CertificateStatus::Present { path, attributes } => {
            assert_eq!(path, gallery.path("square/certificate.pdf"));
            assert_eq!(attributes["Title"], "Certificate of Authenticity");
            assert_eq!(attributes["Author"], "Ada Lovelace");
        }
        other => panic!("expected a certificate, got {other:?}"),
    }
}

#[test]
fn global_empty_certificate_means_absent() {
    let gallery = Gallery::new();
    gallery.images(&["square.png", "round.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
certificate = ""
["square.png"]
["round.png"]
certificate = "./certificate.pdf"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    assert_eq!(doc.certificate(&id(&gallery, "square.png")), CertificateStatus::Absent);
    assert!(matches!(
        doc.certificate(&id(&gallery, "round.png")),
        CertificateStatus::Present { .. }
    ));
    let serialized = serde_json::to_value(doc.as_ref()).expect("serialize");
    assert_eq!(
        serialized["artworks"][gallery.uri("square.png")][fields::CERTIFICATE],
        Value::Null
    );
}

#[test]
fn identifiers_are_normalized_and_validated() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    let good = gallery.file(
        "good/meta.toml",
        r#"
license = "https://example.org/license"
["../square.png"]
identifier = "urn:Ethereum:0xABC123:7"
"#,
    );
    let doc = Resolver::new().load(&[good]).expect("resolve");
    let artwork = doc.artwork(&id(&gallery, "square.png")).unwrap();
    assert_eq!(artwork[fields::IDENTIFIER], "urn:ethereum:0xABC123:7");
    assert_eq!(artwork["schema:@id"], "urn:ethereum:0xABC123:7");

    let bad = gallery.file(
        "bad/meta.toml",
        r#"
license = "https://example.org/license"
["../square.png"]
identifier = "urn:ethereum::7"
"#,
    );
    let err = Resolver::new().load(&[bad]).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration(ConfigurationError::InvalidIdentifier { .. })
    ));
}

#[test]
fn normalizing_a_resolved_document_changes_nothing() {
    let gallery = Gallery::new();
    gallery.images(&["square.png", "round.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
creator = "Ada, Grace"
type = "VisualArtwork"
["square.png"]
title = " Square "
artist = "Ada"
["round.png"]
name = "Round"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let mut again = doc.as_ref().clone();
    normalize::normalize(&mut again).expect("normalize");
    assert_eq!(serde_json::to_value(&again).unwrap(), serde_json::to_value(doc.as_ref()).unwrap());
}

#[test]
fn source_order_does_not_change_the_cached_document() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    let a = gallery.file("a.toml", "license = \"https://example.org/license\"\n");
    let b = gallery.file("b.toml", "[\"square.png\"]\ntitle = \"Square\"\n");

    let resolver = Resolver::new();
    let first = resolver.load(&[a.clone(), b.clone()]).expect("resolve");
    let second = resolver.load(&[b.clone(), a.clone()]).expect("resolve");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resolver.build_count(), 1);

    assert!(resolver.invalidate(&[a.clone(), b.clone()]));
    let third = resolver.load(&[a, b]).expect("resolve");
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(resolver.build_count(), 2);
}

#[test]
fn concurrent_requests_share_one_build() {
    let gallery = Gallery::new();
    gallery.images(&["square.png", "round.png", "oval.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
["square.png"]
["round.png"]
["oval.png"]
"#,
    );

    let resolver = Resolver::new();
    let documents: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| resolver.load(std::slice::from_ref(&source))))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread").expect("resolve"))
            .collect()
    });
    assert_eq!(resolver.build_count(), 1);
    assert!(documents.iter().all(|doc| Arc::ptr_eq(doc, &documents[0])));
}

#[test]
fn failed_builds_are_retried() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    let source = gallery.file("meta.toml", "[\"square.png\"]\ntitle = \"Square\"\n");

    let resolver = Resolver::new();
    let err = resolver.load(std::slice::from_ref(&source)).unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Configuration(ConfigurationError::MissingLicense { .. })
    ));
    gallery.file(
        "meta.toml",
        "license = \"https://example.org/license\"\n[\"square.png\"]\ntitle = \"Square\"\n",
    );
    resolver.load(&[source]).expect("resolve after fix");
    assert_eq!(resolver.build_count(), 2);
}

#[test]
fn previews_follow_their_artwork() {
    let gallery = Gallery::new();
    gallery.images(&["square.tiff"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
["square.tiff"]
title = "Square"
["square/preview.jpg"]
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let square = id(&gallery, "square.tiff");
    assert_eq!(doc.artwork_ids(), vec![square.clone()]);
    assert_eq!(doc.preview_extension(&square).as_deref(), Some("jpg"));
    assert_eq!(doc.preview_of(&id(&gallery, "square/preview.jpg")), Some(square));
}

#[test]
fn flattened_view_merges_global_defaults() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
creator = "Ada"
rights = "All rights reserved"
["square.png"]
title = "Square"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let flat = serde_json::to_value(doc.flattened()).expect("serialize");
    let square = &flat[gallery.uri("square.png")];
    assert_eq!(square["XMP-dc:Title"], "Square");
    assert_eq!(square["XMP-dc:Rights"], "All rights reserved");
    assert_eq!(square["schema:@context"], "https://schema.org/");
    assert_eq!(square["XMP-dc:Type"], "CreativeWork");
    assert_eq!(square["schema:version"], 1);
    assert_eq!(square["XMP-xmpRights:Owner"], "Ada");
    assert_eq!(square[fields::MARKED], true);
    assert_eq!(
        square["schema:copyrightHolder"],
        json!([{ "@type": "Person", "name": "Ada" }])
    );
}

#[test]
fn source_above_the_artwork_directory() {
    let gallery = Gallery::new();
    gallery.images(&["art/square.png"]);
    gallery.file("LICENSE.txt", "terms");
    let source = gallery.file(
        "meta.toml",
        r#"
license = "./LICENSE.txt"
["art/square.png"]
title = "Square"
["art/square/certificate.pdf"]
signer = "Ada"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let square = id(&gallery, "art/square.png");
    match doc.certificate(&square) {
        CertificateStatus::Present { path, attributes } => {
            assert_eq!(path, gallery.path("art/square/certificate.pdf"));
            assert_eq!(attributes["signer"], "Ada");
        }
        other => panic!("expected a certificate, got {other:?}"),
    }
    assert_eq!(
        doc.license(&square),
        Some(Reference::LocalFile(gallery.path("LICENSE.txt")))
    );
}

#[test]
fn namespaced_global_license_resolves_against_its_source() {
    let gallery = Gallery::new();
    gallery.images(&["square.png"]);
    gallery.file("LICENSE.txt", "terms");
    let source = gallery.file(
        "meta.toml",
        r#"
"schema:license" = "./LICENSE.txt"
["square.png"]
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let artwork = doc.artwork(&id(&gallery, "square.png")).unwrap();
    assert_eq!(artwork[fields::LICENSE], gallery.uri("LICENSE.txt"));
    assert_eq!(artwork["schema:license"], gallery.uri("LICENSE.txt"));
    assert!(doc.warnings().is_empty(), "{:?}", doc.warnings());
}

#[test]
fn synonyms_agree_after_resolution() {
    let gallery = Gallery::new();
    gallery.images(&["square.png", "round.png"]);
    let source = gallery.file(
        "meta.toml",
        r#"
license = "https://example.org/license"
creator = "Ada, Grace"
description = "A series"
["square.png"]
title = "Square"
type = "VisualArtwork"
date = "2024-05-01"
["round.png"]
"nft:name" = "Round"
"Exif:Artist" = "Grace"
"#,
    );

    let doc = Resolver::new().load(&[source]).expect("resolve");
    let mut maps = vec![doc.global().clone()];
    for artwork in doc.artwork_ids() {
        maps.push(doc.artwork(&artwork).unwrap().clone());
    }
    for attributes in &maps {
        for group in vocabulary::groups() {
            let present: Vec<&str> = group
                .members
                .iter()
                .copied()
                .filter(|member| attributes.contains_key(*member))
                .collect();
            if present.is_empty() {
                continue;
            }
            assert_eq!(present, group.members, "partial group in {attributes:?}");
            let first = &attributes[present[0]];
            for member in &present[1..] {
                let value = &attributes[*member];
                match group.kind {
                    GroupKind::Plain => assert_eq!(value, first, "{member}"),
                    GroupKind::Agent | GroupKind::Type => assert_eq!(
                        vocabulary::display_names(value),
                        vocabulary::display_names(first),
                        "{member}"
                    ),
                }
            }
        }
    }
}
