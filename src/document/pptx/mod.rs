/*!
 * Presentation codec for Office Open XML (`.pptx`) packages.
 *
 * `open` reads every package entry into memory and builds the deck tree from
 * the slide and notes parts. `save` writes the package back entry by entry:
 * parts whose text containers were mutated get their paragraph regions
 * regenerated and spliced into the original XML, every other byte is copied
 * through unchanged.
 *
 * Paragraph deletion is intentionally unsupported; callers clear paragraphs
 * instead of removing them.
 */

mod reader;
mod writer;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::ops::Range;
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::DocumentError;

use super::model::{Document, Slide};
use reader::PartParser;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_REL_SUFFIX: &str = "/relationships/slide";
const NOTES_REL_SUFFIX: &str = "/relationships/notesSlide";

/// One entry of the ZIP package.
#[derive(Debug, Clone)]
pub(crate) struct PackageEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub is_dir: bool,
}

/// The raw package a document was read from.
#[derive(Debug, Clone, Default)]
pub(crate) struct Package {
    pub entries: Vec<PackageEntry>,
    index: HashMap<String, usize>,
}

/// Upper bound on buffer space reserved from a size declared in the archive.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Declared sizes come from the archive headers and are not trusted.
fn capacity_hint(declared_size: u64) -> usize {
    declared_size.min(MAX_PREALLOCATION) as usize
}

impl Package {
    fn read<R: Read + Seek>(reader: R) -> Result<Self, DocumentError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let mut data = Vec::with_capacity(capacity_hint(file.size()));
            if !file.is_dir() {
                file.read_to_end(&mut data)?;
            }
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();

        Ok(Self { entries, index })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Part content as text, or `None` when the part does not exist.
    fn text(&self, name: &str) -> Result<Option<(usize, &str)>, DocumentError> {
        let Some(index) = self.position(name) else {
            return Ok(None);
        };
        let text = std::str::from_utf8(&self.entries[index].data)
            .map_err(|_| DocumentError::Encoding(name.to_string()))?;
        Ok(Some((index, text)))
    }

    fn required_text(&self, name: &str) -> Result<(usize, &str), DocumentError> {
        self.text(name)?
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))
    }
}

/// A package relationship.
#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

/// Open a presentation file.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Document, DocumentError> {
    let file = File::open(path.as_ref())?;
    read(BufReader::new(file))
}

/// Read a presentation from any seekable source.
pub fn read<R: Read + Seek>(reader: R) -> Result<Document, DocumentError> {
    let package = Package::read(reader)?;
    let slides = read_slides(&package)?;
    debug!("Opened package with {} entries and {} slides", package.entries.len(), slides.len());

    Ok(Document {
        slides,
        package: Some(package),
    })
}

/// Save a document read by [`open`] to a new file.
pub fn save<P: AsRef<Path>>(document: &Document, path: P) -> Result<(), DocumentError> {
    let bytes = write(document, Cursor::new(Vec::new()))?.into_inner();
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Write a document into any seekable sink and hand the sink back.
pub fn write<W: Write + Seek>(document: &Document, sink: W) -> Result<W, DocumentError> {
    let package = document.package.as_ref().ok_or(DocumentError::NoPackage)?;

    // Regenerated paragraph regions, grouped by part
    let mut edits: HashMap<usize, Vec<(Range<usize>, String)>> = HashMap::new();
    for container in document.text_containers() {
        if !container.is_modified() {
            continue;
        }
        let Some(anchor) = &container.anchor else {
            warn!("Skipping modified text container without a package location");
            continue;
        };
        let xml = writer::paragraphs_xml(&anchor.prefix, container.paragraphs());
        edits.entry(anchor.part).or_default().push((anchor.span.clone(), xml));
    }

    let mut zip = ZipWriter::new(sink);
    for (index, entry) in package.entries.iter().enumerate() {
        let options = FileOptions::default().compression_method(match entry.compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        });

        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)?;
            continue;
        }

        zip.start_file(entry.name.as_str(), options)?;
        match edits.get_mut(&index) {
            Some(part_edits) => {
                let original = std::str::from_utf8(&entry.data)
                    .map_err(|_| DocumentError::Encoding(entry.name.clone()))?;
                let spliced = writer::splice(original, part_edits);
                debug!("Rewrote {} text regions in {}", part_edits.len(), entry.name);
                zip.write_all(spliced.as_bytes())?;
            }
            None => zip.write_all(&entry.data)?,
        }
    }

    Ok(zip.finish()?)
}

fn read_slides(package: &Package) -> Result<Vec<Slide>, DocumentError> {
    let (_, presentation) = package.required_text(PRESENTATION_PART)?;
    let slide_ids = slide_relationship_ids(PRESENTATION_PART, presentation)?;

    let (_, rels_xml) = package.required_text(PRESENTATION_RELS)?;
    let rels = parse_relationships(PRESENTATION_RELS, rels_xml)?;

    let mut slides = Vec::with_capacity(slide_ids.len());
    for rel_id in slide_ids {
        let Some(rel) = rels.iter().find(|r| r.id == rel_id && r.rel_type.ends_with(SLIDE_REL_SUFFIX)) else {
            warn!("Presentation references unknown slide relationship {}", rel_id);
            continue;
        };
        let slide_path = resolve_target("ppt", &rel.target);
        slides.push(read_slide(package, &slide_path)?);
    }

    Ok(slides)
}

fn read_slide(package: &Package, slide_path: &str) -> Result<Slide, DocumentError> {
    let (part, xml) = package.required_text(slide_path)?;
    let shapes = PartParser::new(slide_path, part, xml)
        .shape_tree()?
        .into_iter()
        .map(|parsed| parsed.shape)
        .collect();

    let notes = match notes_part_for(package, slide_path)? {
        Some(notes_path) => match package.text(&notes_path)? {
            Some((notes_part, notes_xml)) => PartParser::new(&notes_path, notes_part, notes_xml)
                .shape_tree()?
                .into_iter()
                .find(|parsed| parsed.placeholder.as_deref() == Some("body"))
                .and_then(|parsed| parsed.into_text_container()),
            None => {
                warn!("Notes part {} referenced by {} is missing", notes_path, slide_path);
                None
            }
        },
        None => None,
    };

    Ok(Slide { shapes, notes })
}

fn notes_part_for(package: &Package, slide_path: &str) -> Result<Option<String>, DocumentError> {
    let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
    let rels_path = format!("{}/_rels/{}.rels", dir, file);
    let Some((_, rels_xml)) = package.text(&rels_path)? else {
        return Ok(None);
    };

    Ok(parse_relationships(&rels_path, rels_xml)?
        .into_iter()
        .find(|r| r.rel_type.ends_with(NOTES_REL_SUFFIX))
        .map(|r| resolve_target(dir, &r.target)))
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn slide_relationship_ids(part: &str, xml: &str) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"sldId" => {
                for attr in e.attributes().flatten() {
                    // `r:id`, not the numeric `id`
                    if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some() {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Xml {
                    part: part.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Ok(ids)
}

fn parse_relationships(part: &str, xml: &str) -> Result<Vec<Relationship>, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Xml {
                    part: part.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
