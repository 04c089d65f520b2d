/*!
 * Common test utilities for the deck-translator test suite
 */

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

use deck_translator::providers::mock::MockProvider;
use deck_translator::providers::Provider;
use deck_translator::translation::{RetryPolicy, TextUnitTranslator, TranslationClient, TranslationOptions};

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Initialise test logging once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Client around a mock provider, retrying without delay
pub fn mock_client(provider: MockProvider) -> (Arc<MockProvider>, TranslationClient) {
    let provider = Arc::new(provider);
    let dyn_provider: Arc<dyn Provider> = provider.clone();
    let client = TranslationClient::new(dyn_provider, "mock-model", RetryPolicy::immediate(3));
    (provider, client)
}

/// Translator for the en → es pair around a mock provider
pub fn mock_translator(provider: MockProvider) -> (Arc<MockProvider>, TextUnitTranslator) {
    let (provider, client) = mock_client(provider);
    let translator = TextUnitTranslator::new(client, "en", "es", TranslationOptions::default());
    (provider, translator)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// A plain paragraph with one run
pub fn para(text: &str) -> String {
    format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(text))
}

/// Paragraphs built from lines
pub fn paras(lines: &[&str]) -> String {
    lines.iter().map(|line| para(line)).collect()
}

/// Builder for one slide's shape tree and notes
#[derive(Debug, Clone, Default)]
pub struct SlideBuilder {
    shapes: Vec<String>,
    notes: Option<String>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> usize {
        self.shapes.len() + 2
    }

    /// Text shape with raw paragraph XML
    pub fn text_shape_xml(mut self, name: &str, paragraphs_xml: &str) -> Self {
        let id = self.next_id();
        self.shapes.push(format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>{paragraphs_xml}</p:txBody></p:sp>"#
        ));
        self
    }

    /// Text shape with one plain paragraph per line
    pub fn text_shape(self, name: &str, lines: &[&str]) -> Self {
        self.text_shape_xml(name, &paras(lines))
    }

    /// Table shape; each cell holds one paragraph
    pub fn table(mut self, name: &str, rows: &[&[&str]]) -> Self {
        let id = self.next_id();
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let grid: String = (0..columns).map(|_| r#"<a:gridCol w="914400"/>"#).collect();
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|text| {
                        let paragraph = if text.is_empty() {
                            r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#.to_string()
                        } else {
                            para(text)
                        };
                        format!(r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{paragraph}</a:txBody><a:tcPr/></a:tc>"#)
                    })
                    .collect();
                format!(r#"<a:tr h="370840">{cells}</a:tr>"#)
            })
            .collect();
        self.shapes.push(format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="{name}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr><p:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></p:xfrm><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>{grid}</a:tblGrid>{body}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#
        ));
        self
    }

    /// Picture shape (no text)
    pub fn picture(mut self, name: &str) -> Self {
        let id = self.next_id();
        self.shapes.push(format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId9"/></p:blipFill><p:spPr/></p:pic>"#
        ));
        self
    }

    /// Speaker notes, one paragraph per line
    pub fn notes(mut self, lines: &[&str]) -> Self {
        self.notes = Some(paras(lines));
        self
    }

    fn slide_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            self.shapes.concat()
        )
    }

    fn notes_xml(&self) -> Option<String> {
        self.notes.as_ref().map(|paragraphs| {
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {NS}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#
            )
        })
    }
}

/// Builder for a minimal but well-formed presentation package
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<SlideBuilder>,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, slide: SlideBuilder) -> Self {
        self.slides.push(slide);
        self
    }

    /// Package parts in the order they are zipped
    pub fn parts(&self) -> Vec<(String, String)> {
        let mut parts = Vec::new();
        let mut overrides = String::new();
        let mut slide_ids = String::new();
        let mut slide_rels = String::new();

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
            ));
            slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1));
            slide_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL_TYPE}/slide" Target="slides/slide{n}.xml"/>"#,
                n + 1
            ));
            if slide.notes.is_some() {
                overrides.push_str(&format!(
                    r#"<Override PartName="/ppt/notesSlides/notesSlide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/>"#
                ));
            }
        }

        parts.push((
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>{overrides}</Types>"#
            ),
        ));
        parts.push((
            "_rels/.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_TYPE}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#
            ),
        ));
        parts.push((
            "ppt/presentation.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#
            ),
        ));
        parts.push((
            "ppt/_rels/presentation.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_TYPE}/slideMaster" Target="slideMasters/slideMaster1.xml"/>{slide_rels}</Relationships>"#
            ),
        ));

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slides/slide{n}.xml"), slide.slide_xml()));

            let notes_rel = if slide.notes.is_some() {
                format!(r#"<Relationship Id="rId2" Type="{REL_TYPE}/notesSlide" Target="../notesSlides/notesSlide{n}.xml"/>"#)
            } else {
                String::new()
            };
            parts.push((
                format!("ppt/slides/_rels/slide{n}.xml.rels"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{REL_TYPE}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>{notes_rel}</Relationships>"#
                ),
            ));

            if let Some(notes) = slide.notes_xml() {
                parts.push((format!("ppt/notesSlides/notesSlide{n}.xml"), notes));
            }
        }

        parts
    }

    /// Zipped package bytes
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in self.parts() {
            zip.start_file(name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    /// Write the package to `dir/name` and return its path
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

/// Raw content of every entry of a package, in archive order
pub fn package_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

/// The presentation used by the scenario tests: a title, a bulleted body, a
/// table, a picture, and notes
pub fn sample_deck() -> DeckBuilder {
    DeckBuilder::new()
        .slide(
            SlideBuilder::new()
                .text_shape("Title 1", &["Quarterly Review"])
                .text_shape("Content 2", &["Revenue grew", "Costs fell", "Outlook stable"])
                .notes(&["Mention the new region"]),
        )
        .slide(
            SlideBuilder::new()
                .table("Table 1", &[&["Region", "Sales"], &["North", ""]])
                .picture("Picture 2"),
        )
}
