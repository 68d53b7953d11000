//! Benchmarks for the redeck build pipeline.
//!
//! Run with: cargo bench
//!
//! These benchmarks build synthetic decks of various slide counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redeck::{BuildRequest, Deck, ReplacementMap, Template};
use std::io::Cursor;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// Creates a synthetic PPTX with the given number of slides, each holding a
/// few paragraphs with a placeholder split over two runs.
fn create_test_pptx(slide_count: usize) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    // [Content_Types].xml
    let mut types = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
    );
    for i in 1..=slide_count {
        types.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            i
        ));
    }
    types.push_str("</Types>");
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(types.as_bytes()).unwrap();

    // _rels/.rels
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#,
    )
    .unwrap();

    // ppt/presentation.xml and its relationships
    let mut ids = String::new();
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=slide_count {
        ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i, i
        ));
    }
    rels.push_str("</Relationships>");

    zip.start_file("ppt/presentation.xml", options).unwrap();
    zip.write_all(
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            NS, ids
        )
        .as_bytes(),
    )
    .unwrap();
    zip.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
    zip.write_all(rels.as_bytes()).unwrap();

    // Generate slide content
    for i in 1..=slide_count {
        let mut shapes = String::new();
        for j in 0..8 {
            shapes.push_str(&format!(
                r#"<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US" b="1"/><a:t>Item {} for {{{{COMPANY_</a:t></a:r><a:r><a:rPr lang="en-US"/><a:t>NAME}}}} at {{{{SETUP_FEE}}}}</a:t></a:r></a:p></p:txBody></p:sp>"#,
                j
            ));
        }
        zip.start_file(format!("ppt/slides/slide{}.xml", i), options)
            .unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                NS, shapes
            )
            .as_bytes(),
        )
        .unwrap();
    }

    zip.finish().unwrap();
    buffer
}

fn replacements() -> ReplacementMap {
    ReplacementMap::new()
        .with("{{COMPANY_NAME}}", "Acme Corp")
        .with("{{SETUP_FEE}}", 1500u64)
}

/// Benchmark loading a deck.
fn bench_deck_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("deck_loading");

    for size in [10, 50, 200].iter() {
        let data = create_test_pptx(*size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("slides", size), &data, |b, data| {
            b.iter(|| Deck::from_bytes(black_box(data)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark placeholder resolution on every slide.
fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholder_resolution");
    let map = replacements();

    for size in [10, 50, 200].iter() {
        let data = create_test_pptx(*size);
        group.bench_with_input(BenchmarkId::new("slides", size), &data, |b, data| {
            b.iter(|| {
                let mut deck = Deck::from_bytes(data).unwrap();
                deck.resolve(black_box(&map)).unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmark the full pipeline: prune half the slides, resolve, serialize.
fn bench_full_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_build");

    for size in [10, 50, 200].iter() {
        let template = Template::from_bytes(create_test_pptx(*size)).unwrap();
        let request = BuildRequest::new()
            .with_replacements(replacements())
            .remove_slides((0..*size).step_by(2));

        group.bench_with_input(BenchmarkId::new("slides", size), &request, |b, request| {
            b.iter(|| template.build(black_box(request)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_deck_loading,
    bench_resolution,
    bench_full_build,
);
criterion_main!(benches);
