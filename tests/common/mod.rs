//! Synthetic presentation packages for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_NOTES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
const REL_LINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

/// Builder for a small but structurally complete deck.
pub struct DeckFixture {
    slides: Vec<SlideFixture>,
    /// Extra `p:sldId` entries pointing at relationship IDs that do not exist
    dangling: Vec<String>,
}

pub struct SlideFixture {
    pub body: String,
    /// (rId, type, target, external)
    pub rels: Vec<(String, String, String, bool)>,
    pub notes: Option<String>,
}

pub fn rel(id: &str, rel_type: &str, target: &str) -> (String, String, String, bool) {
    (id.to_string(), rel_type.to_string(), target.to_string(), false)
}

/// A title shape reading `title`.
pub fn title_shape(title: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        title
    )
}

/// A text box whose single paragraph is made of the given (run text, rPr attributes).
pub fn text_box(runs: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (text, attrs) in runs {
        body.push_str(&format!(
            r#"<a:r><a:rPr lang="en-US"{}/><a:t>{}</a:t></a:r>"#,
            attrs, text
        ));
    }
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="TextBox 2"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm></p:spPr><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/><a:p>{}<a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
        body
    )
}

/// A one-cell table whose cell paragraph is made of the given runs.
pub fn table(runs: &[&str]) -> String {
    let body: String = runs
        .iter()
        .map(|t| format!(r#"<a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r>"#, t))
        .collect();
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table 3"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblGrid><a:gridCol w="100"/></a:tblGrid><a:tr h="50"><a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>{}</a:p></a:txBody><a:tcPr/></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        body
    )
}

/// A group shape wrapping the given shapes.
pub fn group(inner: &str) -> String {
    format!(
        r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group 4"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:grpSp>"#,
        inner
    )
}

/// A picture referencing `rel_id`.
pub fn picture(rel_id: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="6" name="Picture 5"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr/></p:pic>"#,
        rel_id
    )
}

impl DeckFixture {
    /// The five-slide proposal deck used across the tests:
    ///
    /// 0. "Slide 1": `{{COMPANY_NAME}}` split over a bold and an italic run
    /// 1. "Slide 2": `{{SETUP_FEE}}` split inside a table cell
    /// 2. "Slide 3": pricing slide with its own image and a notes slide
    /// 3. "Slide 4": `{{COMPANY_NAME}}` inside a group, shared image
    /// 4. "Slide 5": shared image and an external hyperlink
    pub fn proposal() -> Self {
        let layout = rel("rId1", REL_LAYOUT, "../slideLayouts/slideLayout1.xml");
        let slides = vec![
            SlideFixture {
                body: format!(
                    "{}{}",
                    title_shape("Slide 1"),
                    text_box(&[("{{COMP", r#" b="1""#), ("ANY_NAME}}", r#" i="1""#), (" proposal", "")])
                ),
                rels: vec![layout.clone()],
                notes: None,
            },
            SlideFixture {
                body: format!("{}{}", title_shape("Slide 2"), table(&["Setup: {{SETUP_", "FEE}} EUR"])),
                rels: vec![layout.clone()],
                notes: None,
            },
            SlideFixture {
                body: format!("{}{}", title_shape("Slide 3"), picture("rId2")),
                rels: vec![layout.clone(), rel("rId2", REL_IMAGE, "../media/image1.png")],
                notes: Some("Pricing notes".to_string()),
            },
            SlideFixture {
                body: format!(
                    "{}{}{}",
                    title_shape("Slide 4"),
                    group(&text_box(&[("Prepared for {{COMPANY_NAME}}", "")])),
                    picture("rId2")
                ),
                rels: vec![layout.clone(), rel("rId2", REL_IMAGE, "../media/image2.png")],
                notes: None,
            },
            SlideFixture {
                body: format!("{}{}", title_shape("Slide 5"), picture("rId2")),
                rels: vec![
                    layout,
                    rel("rId2", REL_IMAGE, "../media/image2.png"),
                    (
                        "rId3".to_string(),
                        REL_LINK.to_string(),
                        "https://example.com".to_string(),
                        true,
                    ),
                ],
                notes: None,
            },
        ];
        Self {
            slides,
            dangling: Vec::new(),
        }
    }

    /// Append a slide list entry whose relationship does not exist.
    pub fn with_dangling_entry(mut self, rel_id: &str) -> Self {
        self.dangling.push(rel_id.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut put = |name: &str, body: &str| {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        // [Content_Types].xml
        let mut types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="png" ContentType="image/png"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
        );
        for (i, slide) in self.slides.iter().enumerate() {
            types.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i + 1
            ));
            if slide.notes.is_some() {
                types.push_str(&format!(
                    r#"<Override PartName="/ppt/notesSlides/notesSlide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#,
                    i + 1
                ));
            }
        }
        types.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#);
        put("[Content_Types].xml", &types);

        put(
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#,
        );
        put(
            "docProps/core.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Proposal</dc:title></cp:coreProperties>"#,
        );

        // ppt/presentation.xml: slides use rId2.. in order, theme after them
        let slide_rel = |i: usize| format!("rId{}", i + 2);
        let theme_rel = format!("rId{}", self.slides.len() + 2);
        let mut ids = String::new();
        let mut section_ids = String::new();
        for i in 0..self.slides.len() {
            ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, slide_rel(i)));
            section_ids.push_str(&format!(r#"<p14:sldId id="{}"/>"#, 256 + i));
        }
        for (n, rel_id) in self.dangling.iter().enumerate() {
            ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 900 + n, rel_id));
        }
        put(
            "ppt/presentation.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/><p:custShowLst><p:custShow name="Short" id="0"><p:sldLst><p:sld r:id="rId2"/><p:sld r:id="rId4"/></p:sldLst></p:custShow></p:custShowLst><p:extLst><p:ext uri="{{521415D9-36F7-43E2-AB2F-B90AF26B5E84}}"><p14:sectionLst xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main"><p14:section name="Main" id="{{00000000-0000-0000-0000-000000000001}}"><p14:sldIdLst>{}</p14:sldIdLst></p14:section></p14:sectionLst></p:ext></p:extLst></p:presentation>"#,
                NS, ids, section_ids
            ),
        );

        let mut pres_rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        pres_rels.push_str(&format!(
            r#"<Relationship Id="rId1" Type="{}" Target="slideMasters/slideMaster1.xml"/>"#,
            REL_MASTER
        ));
        for i in 0..self.slides.len() {
            pres_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                slide_rel(i),
                REL_SLIDE,
                i + 1
            ));
        }
        pres_rels.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="theme/theme1.xml"/></Relationships>"#,
            theme_rel, REL_THEME
        ));
        put("ppt/_rels/presentation.xml.rels", &pres_rels);

        put(
            "ppt/slideMasters/slideMaster1.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {}><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
                NS
            ),
        );
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{}" Target="../theme/theme1.xml"/></Relationships>"#,
                REL_LAYOUT, REL_THEME
            ),
        );
        put(
            "ppt/slideLayouts/slideLayout1.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {}><p:cSld name="Title"><p:spTree/></p:cSld></p:sldLayout>"#,
                NS
            ),
        );
        put(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#,
                REL_MASTER
            ),
        );
        put(
            "ppt/theme/theme1.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office"/>"#,
        );

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            put(
                &format!("ppt/slides/slide{}.xml", n),
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
                    NS, slide.body
                ),
            );

            let mut rels = String::from(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            );
            for (id, rel_type, target, external) in &slide.rels {
                let mode = if *external { r#" TargetMode="External""# } else { "" };
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                    id, rel_type, target, mode
                ));
            }
            if slide.notes.is_some() {
                rels.push_str(&format!(
                    r#"<Relationship Id="rId9" Type="{}" Target="../notesSlides/notesSlide{}.xml"/>"#,
                    REL_NOTES, n
                ));
            }
            rels.push_str("</Relationships>");
            put(&format!("ppt/slides/_rels/slide{}.xml.rels", n), &rels);

            if let Some(notes) = &slide.notes {
                put(
                    &format!("ppt/notesSlides/notesSlide{}.xml", n),
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {}><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#,
                        NS, notes
                    ),
                );
                put(
                    &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                    &format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="../slides/slide{}.xml"/></Relationships>"#,
                        REL_SLIDE, n
                    ),
                );
            }
        }

        drop(put);
        zip.start_file("ppt/media/image1.png", options).unwrap();
        zip.write_all(b"\x89PNG image one").unwrap();
        zip.start_file("ppt/media/image2.png", options).unwrap();
        zip.write_all(b"\x89PNG image two").unwrap();

        zip.finish().unwrap().into_inner()
    }
}

/// Titles (first paragraph) of every slide in a built deck.
pub fn titles(pptx: &[u8]) -> Vec<String> {
    redeck::Deck::from_bytes(pptx)
        .unwrap()
        .slides()
        .unwrap()
        .into_iter()
        .map(|s| s.paragraphs.first().cloned().unwrap_or_default())
        .collect()
}

/// Part names of a built deck.
pub fn parts(pptx: &[u8]) -> BTreeSet<String> {
    redeck::Package::from_bytes(pptx)
        .unwrap()
        .part_names()
        .into_iter()
        .collect()
}
