//! DOCX package reader using zip and roxmltree.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use roxmltree::Node;
use zip::ZipArchive;

use crate::detect::{detect_format_from_bytes, MAIN_DOCUMENT_PART};
use crate::error::{Error, Result};
use crate::model::{
    Block, Document, FieldCharKind, InlineContent, MergeOrigin, Metadata, Note, NoteKind,
    NumberFormat, NumberingDefinitions, NumberingRef, Paragraph, Table, TableCell, TableRow,
    TextRun, TextStyle,
};

use super::options::ParseOptions;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const ENDNOTES_PART: &str = "word/endnotes.xml";
const FOOTNOTES_PART: &str = "word/footnotes.xml";
const CORE_PROPS_PART: &str = "docProps/core.xml";

/// Word list levels run 0..=8.
const LIST_LEVELS: usize = 9;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// DOCX document parser.
pub struct DocxParser {
    data: Vec<u8>,
    options: ParseOptions,
}

impl DocxParser {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a DOCX file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_owned_bytes(data, options)
    }

    /// Parse a DOCX from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a DOCX from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        Self::from_owned_bytes(data.to_vec(), options)
    }

    /// Parse a DOCX from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse a DOCX from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_owned_bytes(data, options)
    }

    fn from_owned_bytes(data: Vec<u8>, options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(&data)?;
        Ok(Self { data, options })
    }

    /// Size of the package in bytes.
    pub fn package_size(&self) -> usize {
        self.data.len()
    }

    /// Parse the package into a document.
    pub fn parse(&self) -> Result<Document> {
        let mut zip = ZipArchive::new(Cursor::new(self.data.as_slice()))?;

        let styles = self.optional_part(&mut zip, STYLES_PART, parse_styles)?;
        let numbering = self.optional_part(&mut zip, NUMBERING_PART, parse_numbering)?;

        let body_xml = read_zip_text(&mut zip, MAIN_DOCUMENT_PART)
            .ok_or_else(|| Error::MissingPart(MAIN_DOCUMENT_PART.to_string()))?;
        let xml = roxmltree::Document::parse(&body_xml)?;
        let body = wml(xml.root_element(), "body")
            .ok_or_else(|| Error::InvalidDocx("document part has no body".into()))?;

        let reader = BodyReader { styles: &styles };
        let mut doc = Document::new();
        reader.read_blocks(body, &mut doc.blocks);
        doc.numbering = numbering;

        if self.options.read_notes {
            doc.endnotes = read_notes(&mut zip, ENDNOTES_PART, "endnote", &reader);
            doc.footnotes = read_notes(&mut zip, FOOTNOTES_PART, "footnote", &reader);
        }
        if self.options.read_metadata {
            doc.metadata = self.optional_part(&mut zip, CORE_PROPS_PART, parse_core_properties)?;
        }

        debug!(
            "parsed {} blocks, {} endnotes, {} footnotes",
            doc.blocks.len(),
            doc.endnotes.len(),
            doc.footnotes.len()
        );
        Ok(doc)
    }

    /// Read and parse a part that a document may lack.
    ///
    /// A missing part yields the default value. An unparseable one is an
    /// error in strict mode and a default with a warning in lenient mode.
    fn optional_part<T: Default>(
        &self,
        zip: &mut Archive<'_>,
        name: &str,
        parse: fn(Node) -> T,
    ) -> Result<T> {
        let Some(content) = read_zip_text(zip, name) else {
            return Ok(T::default());
        };
        match roxmltree::Document::parse(&content) {
            Ok(xml) => Ok(parse(xml.root_element())),
            Err(e) if self.options.is_lenient() => {
                warn!("skipping unreadable {}: {}", name, e);
                Ok(T::default())
            }
            Err(e) => Err(Error::Xml(format!("{}: {}", name, e))),
        }
    }
}

/// Paragraph style facts needed by the block reader.
#[derive(Debug, Clone, Default)]
struct StyleDef {
    name: Option<String>,
    numbering: Option<NumberingRef>,
}

#[derive(Debug, Default)]
struct Styles {
    by_id: HashMap<String, StyleDef>,
}

impl Styles {
    fn get(&self, id: &str) -> Option<&StyleDef> {
        self.by_id.get(id)
    }
}

fn parse_styles(root: Node) -> Styles {
    let mut by_id = HashMap::new();
    for style in root.children().filter(|n| is_wml(*n, "style")) {
        let Some(id) = style.attribute((WML_NS, "styleId")) else {
            continue;
        };
        let name = wml_attr(style, "name").map(str::to_string);
        let numbering = wml(style, "pPr").and_then(numbering_ref);
        by_id.insert(id.to_string(), StyleDef { name, numbering });
    }
    Styles { by_id }
}

fn parse_numbering(root: Node) -> NumberingDefinitions {
    let mut abstract_levels: HashMap<&str, Vec<NumberFormat>> = HashMap::new();
    let mut num_to_abstract: Vec<(&str, &str)> = Vec::new();

    for node in root.children() {
        if node.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match node.tag_name().name() {
            "abstractNum" => {
                let Some(abs_id) = node.attribute((WML_NS, "abstractNumId")) else {
                    continue;
                };
                let mut levels = vec![NumberFormat::Numbered; LIST_LEVELS];
                for lvl in node.children().filter(|n| is_wml(*n, "lvl")) {
                    let Some(ilvl) = lvl
                        .attribute((WML_NS, "ilvl"))
                        .and_then(|v| v.parse::<usize>().ok())
                        .filter(|l| *l < LIST_LEVELS)
                    else {
                        continue;
                    };
                    if let Some(fmt) = wml_attr(lvl, "numFmt") {
                        levels[ilvl] = NumberFormat::from_num_fmt(fmt);
                    }
                }
                abstract_levels.insert(abs_id, levels);
            }
            "num" => {
                let Some(num_id) = node.attribute((WML_NS, "numId")) else {
                    continue;
                };
                let Some(abs_id) = wml_attr(node, "abstractNumId") else {
                    continue;
                };
                num_to_abstract.push((num_id, abs_id));
            }
            _ => {}
        }
    }

    let mut defs = NumberingDefinitions::default();
    for (num_id, abs_id) in num_to_abstract {
        if let Some(levels) = abstract_levels.get(abs_id) {
            defs.insert(num_id, levels.clone());
        }
    }
    defs
}

fn parse_core_properties(root: Node) -> Metadata {
    let mut metadata = Metadata::default();
    for node in root.children().filter(Node::is_element) {
        let text = node.text().map(str::trim).filter(|t| !t.is_empty());
        let Some(text) = text else {
            continue;
        };
        match node.tag_name().name() {
            "title" => metadata.title = Some(text.to_string()),
            "creator" => metadata.author = Some(text.to_string()),
            "subject" => metadata.subject = Some(text.to_string()),
            "lastModifiedBy" => metadata.last_modified_by = Some(text.to_string()),
            "created" => metadata.created = parse_w3c_date(text),
            "modified" => metadata.modified = parse_w3c_date(text),
            _ => {}
        }
    }
    metadata
}

fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Footnote or endnote store. Any failure reads as an empty store.
fn read_notes(zip: &mut Archive<'_>, part: &str, tag: &str, reader: &BodyReader) -> Vec<Note> {
    let Some(content) = read_zip_text(zip, part) else {
        return Vec::new();
    };
    let Ok(xml) = roxmltree::Document::parse(&content) else {
        debug!("ignoring malformed {}", part);
        return Vec::new();
    };

    xml.root_element()
        .children()
        .filter(|n| is_wml(*n, tag))
        .filter_map(|note| {
            let id = note.attribute((WML_NS, "id"))?;
            let mut blocks = Vec::new();
            reader.read_blocks(note, &mut blocks);
            let text = blocks
                .iter()
                .map(|b| b.plain_text().trim().to_string())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Some(Note::new(id, text))
        })
        .collect()
}

/// Walks body-level content into model blocks.
struct BodyReader<'s> {
    styles: &'s Styles,
}

impl BodyReader<'_> {
    fn read_blocks(&self, container: Node, blocks: &mut Vec<Block>) {
        for node in container.children() {
            if node.tag_name().namespace() != Some(WML_NS) {
                continue;
            }
            match node.tag_name().name() {
                "p" => blocks.push(Block::Paragraph(self.read_paragraph(node))),
                "tbl" => blocks.push(Block::Table(self.read_table(node))),
                "sdt" => {
                    if let Some(content) = wml(node, "sdtContent") {
                        self.read_blocks(content, blocks);
                    }
                }
                "customXml" | "ins" => self.read_blocks(node, blocks),
                _ => {}
            }
        }
    }

    fn read_paragraph(&self, node: Node) -> Paragraph {
        let mut paragraph = Paragraph::new();

        let ppr = wml(node, "pPr");
        let style = ppr
            .and_then(|p| wml_attr(p, "pStyle"))
            .map(|id| (id, self.styles.get(id)));
        if let Some((id, def)) = style {
            paragraph.style.style_name =
                Some(def.and_then(|d| d.name.clone()).unwrap_or_else(|| id.to_string()));
        }
        paragraph.style.numbering = ppr
            .and_then(numbering_ref)
            .or_else(|| style.and_then(|(_, def)| def?.numbering.clone()));

        read_inline(node, &mut paragraph.content);
        paragraph
    }

    fn read_table(&self, node: Node) -> Table {
        let mut table = Table::new();
        let mut rows = Vec::new();
        collect_rows(node, &mut rows);

        for tr in rows {
            let mut cells: Vec<TableCell> = Vec::new();
            let mut tcs = Vec::new();
            collect_cells(tr, &mut tcs);

            for tc in tcs {
                let tcpr = wml(tc, "tcPr");
                let span = tcpr
                    .and_then(|p| wml_attr(p, "gridSpan"))
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let continues = tcpr
                    .and_then(|p| wml(p, "vMerge"))
                    .is_some_and(|m| {
                        m.attribute((WML_NS, "val"))
                            .map_or(true, |v| v == "continue")
                    });

                if continues {
                    let start = cells.len();
                    for col in start..start + span {
                        let above = table
                            .rows
                            .last()
                            .and_then(|row| row.cells.get(col))
                            .map(|cell| cell.repeated(MergeOrigin::Above))
                            .unwrap_or_default();
                        cells.push(above);
                    }
                    continue;
                }

                let cell = TableCell::with_content(self.read_cell(tc));
                let repeat = cell.repeated(MergeOrigin::Left);
                cells.push(cell);
                cells.extend(std::iter::repeat(repeat).take(span - 1));
            }
            table.add_row(TableRow::new(cells));
        }
        table
    }

    /// Cell paragraphs; nested tables are flattened in reading order.
    fn read_cell(&self, tc: Node) -> Vec<Paragraph> {
        let mut blocks = Vec::new();
        self.read_blocks(tc, &mut blocks);

        let mut paragraphs = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(p) => paragraphs.push(p),
                Block::Table(nested) => {
                    for row in nested.rows {
                        for cell in row.cells.into_iter().filter(|c| !c.is_merge_repeat()) {
                            paragraphs.extend(cell.content);
                        }
                    }
                }
            }
        }
        paragraphs
    }
}

fn collect_rows<'a, 'i>(node: Node<'a, 'i>, rows: &mut Vec<Node<'a, 'i>>) {
    for child in node.children() {
        if is_wml(child, "tr") {
            rows.push(child);
        } else if is_wml(child, "sdt") || is_wml(child, "customXml") {
            if let Some(content) = wml(child, "sdtContent") {
                collect_rows(content, rows);
            } else {
                collect_rows(child, rows);
            }
        }
    }
}

fn collect_cells<'a, 'i>(node: Node<'a, 'i>, cells: &mut Vec<Node<'a, 'i>>) {
    for child in node.children() {
        if is_wml(child, "tc") {
            cells.push(child);
        } else if is_wml(child, "sdt") || is_wml(child, "customXml") {
            if let Some(content) = wml(child, "sdtContent") {
                collect_cells(content, cells);
            } else {
                collect_cells(child, cells);
            }
        }
    }
}

/// Inline content of a paragraph-like container.
///
/// Hyperlinks, insertions, smart tags and content controls are flattened
/// into their runs. Deleted text is dropped.
fn read_inline(node: Node, out: &mut Vec<InlineContent>) {
    for child in node.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "r" => read_run(child, out),
            "hyperlink" | "ins" | "smartTag" | "customXml" => read_inline(child, out),
            "fldSimple" => {
                let instruction = child
                    .attribute((WML_NS, "instr"))
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let mut inner = Vec::new();
                read_inline(child, &mut inner);
                let runs = inner
                    .into_iter()
                    .filter_map(|item| match item {
                        InlineContent::Text(run) => Some(run),
                        _ => None,
                    })
                    .collect();
                out.push(InlineContent::SimpleField { instruction, runs });
            }
            "sdt" => {
                if let Some(content) = wml(child, "sdtContent") {
                    read_inline(content, out);
                }
            }
            _ => {}
        }
    }
}

fn read_run(run: Node, out: &mut Vec<InlineContent>) {
    let rpr = wml(run, "rPr");
    let style = TextStyle {
        bold: rpr.and_then(|p| wml_bool(p, "b")).unwrap_or(false),
        italic: rpr.and_then(|p| wml_bool(p, "i")).unwrap_or(false),
        superscript: rpr.and_then(|p| wml_attr(p, "vertAlign")) == Some("superscript"),
    };

    for child in run.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => {
                let text = child.text().unwrap_or_default();
                if !text.is_empty() {
                    push_text(out, text, &style);
                }
            }
            "noBreakHyphen" => push_text(out, "-", &style),
            "tab" => out.push(InlineContent::Tab),
            "br" | "cr" => out.push(InlineContent::LineBreak),
            "fldChar" => {
                let kind = match child.attribute((WML_NS, "fldCharType")) {
                    Some("begin") => FieldCharKind::Begin,
                    Some("separate") => FieldCharKind::Separate,
                    Some("end") => FieldCharKind::End,
                    _ => continue,
                };
                out.push(InlineContent::FieldChar(kind));
            }
            "instrText" => {
                out.push(InlineContent::InstrText(
                    child.text().unwrap_or_default().to_string(),
                ));
            }
            "endnoteReference" | "footnoteReference" => {
                let kind = if child.tag_name().name() == "endnoteReference" {
                    NoteKind::Endnote
                } else {
                    NoteKind::Footnote
                };
                if let Some(id) = child.attribute((WML_NS, "id")) {
                    out.push(InlineContent::NoteReference {
                        kind,
                        id: id.to_string(),
                    });
                }
            }
            _ => {}
        }
    }
}

/// Append text, extending the previous run when the styling matches.
fn push_text(out: &mut Vec<InlineContent>, text: &str, style: &TextStyle) {
    if let Some(InlineContent::Text(last)) = out.last_mut() {
        if last.style == *style {
            last.text.push_str(text);
            return;
        }
    }
    out.push(InlineContent::Text(TextRun {
        text: text.to_string(),
        style: style.clone(),
    }));
}

fn numbering_ref(ppr: Node) -> Option<NumberingRef> {
    let num_pr = wml(ppr, "numPr")?;
    let num_id = wml_attr(num_pr, "numId")?;
    let level = wml_attr(num_pr, "ilvl").and_then(|v| v.parse::<u8>().ok());
    Some(NumberingRef {
        num_id: num_id.to_string(),
        level,
    })
}

fn is_wml(node: Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: Node<'a, '_>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// WML toggle property: present without `w:val`, or with anything but 0/false.
fn wml_bool(parent: Node, name: &str) -> Option<bool> {
    wml(parent, name).map(|n| {
        n.attribute((WML_NS, "val"))
            .map_or(true, |v| !matches!(v, "0" | "false" | "off"))
    })
}

fn read_zip_text(zip: &mut Archive<'_>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn package(parts: &[(&str, String)]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn document(body: &str) -> (&'static str, String) {
        (
            MAIN_DOCUMENT_PART,
            format!("<w:document {}><w:body>{}</w:body></w:document>", W, body),
        )
    }

    fn parse(parts: &[(&str, String)]) -> Document {
        DocxParser::from_bytes(&package(parts)).unwrap().parse().unwrap()
    }

    #[test]
    fn test_paragraph_runs_and_styles() {
        let styles = (
            STYLES_PART,
            format!(
                r#"<w:styles {}><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style></w:styles>"#,
                W
            ),
        );
        let doc = parse(&[
            document(
                r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>
                <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r><w:r><w:t xml:space="preserve"> plain</w:t></w:r><w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr><w:t>2</w:t></w:r></w:p>"#,
            ),
            styles,
        ]);

        assert_eq!(doc.blocks.len(), 2);
        let heading = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(heading.heading_level(), Some(1));

        let body = doc.blocks[1].as_paragraph().unwrap();
        assert_eq!(body.plain_text(), "Bold plain2");
        let runs: Vec<&TextRun> = body
            .content
            .iter()
            .filter_map(|c| match c {
                InlineContent::Text(r) => Some(r),
                _ => None,
            })
            .collect();
        assert!(runs[0].style.bold);
        assert!(!runs[1].style.bold);
        assert!(runs[2].style.superscript);
    }

    #[test]
    fn test_explicitly_disabled_run_properties() {
        let doc = parse(&[document(
            r#"<w:p><w:r><w:rPr><w:b w:val="off"/><w:i w:val="false"/></w:rPr><w:t>a</w:t></w:r><w:r><w:rPr><w:b w:val="0"/><w:i w:val="on"/></w:rPr><w:t>b</w:t></w:r></w:p>"#,
        )]);
        let body = doc.blocks[0].as_paragraph().unwrap();
        let runs: Vec<&TextRun> = body
            .content
            .iter()
            .filter_map(|c| match c {
                InlineContent::Text(r) => Some(r),
                _ => None,
            })
            .collect();
        assert!(!runs[0].style.bold);
        assert!(!runs[0].style.italic);
        assert!(!runs[1].style.bold);
        assert!(runs[1].style.italic);
    }

    #[test]
    fn test_unknown_style_id_kept_as_name() {
        let doc = parse(&[document(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
        )]);
        assert_eq!(doc.blocks[0].as_paragraph().unwrap().heading_level(), Some(2));
    }

    #[test]
    fn test_numbering_definitions_and_refs() {
        let numbering = (
            NUMBERING_PART,
            format!(
                r#"<w:numbering {}>
                <w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:numFmt w:val="bullet"/></w:lvl><w:lvl w:ilvl="1"><w:numFmt w:val="decimal"/></w:lvl></w:abstractNum>
                <w:num w:numId="5"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#,
                W
            ),
        );
        let doc = parse(&[
            document(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="5"/></w:numPr></w:pPr><w:r><w:t>item</w:t></w:r></w:p>"#,
            ),
            numbering,
        ]);

        assert_eq!(doc.numbering.format("5", 0), NumberFormat::Bullet);
        assert_eq!(doc.numbering.format("5", 1), NumberFormat::Numbered);
        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(
            p.style.numbering,
            Some(NumberingRef {
                num_id: "5".into(),
                level: Some(1)
            })
        );
    }

    #[test]
    fn test_fields_and_note_references() {
        let doc = parse(&[document(
            r#"<w:p>
            <w:r><w:fldChar w:fldCharType="begin"/></w:r>
            <w:r><w:instrText xml:space="preserve"> CITATION Smi20 \l 1033 </w:instrText></w:r>
            <w:r><w:fldChar w:fldCharType="separate"/></w:r>
            <w:r><w:t>(Smith)</w:t></w:r>
            <w:r><w:fldChar w:fldCharType="end"/></w:r>
            <w:fldSimple w:instr=" HYPERLINK &quot;https://a.example&quot; "><w:r><w:t>link</w:t></w:r></w:fldSimple>
            <w:r><w:endnoteReference w:id="2"/></w:r>
            </w:p>"#,
        )]);

        let p = doc.blocks[0].as_paragraph().unwrap();
        assert_eq!(p.plain_text(), "(Smith)link");
        assert!(matches!(
            p.content[0],
            InlineContent::FieldChar(FieldCharKind::Begin)
        ));
        assert!(p.content.iter().any(|c| matches!(
            c,
            InlineContent::SimpleField { instruction, .. } if instruction.starts_with("HYPERLINK")
        )));
        assert!(p.content.iter().any(|c| matches!(
            c,
            InlineContent::NoteReference { kind: NoteKind::Endnote, id } if id == "2"
        )));
    }

    #[test]
    fn test_merged_cells_are_repeated() {
        let doc = parse(&[document(
            r#"<w:tbl>
            <w:tr><w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>Wide</w:t></w:r></w:p></w:tc><w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>Tall</w:t></w:r></w:p></w:tc></w:tr>
            <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc><w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        )]);

        let table = doc.blocks[0].as_table().unwrap();
        let first: Vec<String> = table.rows[0].cells.iter().map(|c| c.plain_text()).collect();
        let second: Vec<String> = table.rows[1].cells.iter().map(|c| c.plain_text()).collect();
        assert_eq!(first, vec!["Wide", "Wide", "Tall"]);
        assert_eq!(second, vec!["a", "b", "Tall"]);
        assert!(!table.rows[0].cells[0].is_merge_repeat());
        assert_eq!(table.rows[0].cells[1].merged_from, Some(MergeOrigin::Left));
        assert_eq!(table.rows[1].cells[2].merged_from, Some(MergeOrigin::Above));
    }

    #[test]
    fn test_nested_table_flattened_into_cell() {
        let doc = parse(&[document(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>outer</w:t></w:r></w:p>
            <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            </w:tc></w:tr></w:tbl>"#,
        )]);
        let table = doc.blocks[0].as_table().unwrap();
        assert_eq!(table.rows[0].cells[0].plain_text(), "outer\ninner");
    }

    #[test]
    fn test_notes_and_metadata() {
        let endnotes = (
            ENDNOTES_PART,
            format!(
                r#"<w:endnotes {}><w:endnote w:id="-1" w:type="separator"><w:p/></w:endnote><w:endnote w:id="1"><w:p><w:r><w:t>Smith 2020</w:t></w:r></w:p></w:endnote></w:endnotes>"#,
                W
            ),
        );
        let core = (
            CORE_PROPS_PART,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:title>Report</dc:title><dc:creator>QA</dc:creator><dcterms:created>2024-03-01T10:00:00Z</dcterms:created></cp:coreProperties>"#.to_string(),
        );
        let doc = parse(&[document("<w:p/>"), endnotes, core]);

        assert_eq!(doc.endnotes.len(), 2);
        assert_eq!(doc.endnotes[1], Note::new("1", "Smith 2020"));
        assert_eq!(doc.metadata.title.as_deref(), Some("Report"));
        assert_eq!(doc.metadata.author.as_deref(), Some("QA"));
        assert!(doc.metadata.created.is_some());
    }

    #[test]
    fn test_malformed_notes_read_as_empty() {
        let endnotes = (ENDNOTES_PART, "<w:endnotes".to_string());
        let doc = parse(&[document("<w:p/>"), endnotes]);
        assert!(doc.endnotes.is_empty());
    }

    #[test]
    fn test_malformed_styles_strict_vs_lenient() {
        let data = package(&[
            document("<w:p><w:r><w:t>x</w:t></w:r></w:p>"),
            (STYLES_PART, "<w:styles".to_string()),
        ]);

        let strict = DocxParser::from_bytes(&data).unwrap().parse();
        assert!(matches!(strict, Err(Error::Xml(_))));

        let lenient = DocxParser::from_bytes_with_options(&data, ParseOptions::new().lenient())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(lenient.plain_text(), "x");
    }

    #[test]
    fn test_rejects_non_docx() {
        assert!(matches!(
            DocxParser::from_bytes(b"plain text"),
            Err(Error::UnknownFormat)
        ));
    }
}
