//! Builds small DOCX packages in memory for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

const STYLES: &str = r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style>"#;

/// Minimal DOCX document assembled from body XML fragments.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    numbering: Option<String>,
    endnotes: Vec<(String, String)>,
}

impl DocxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(mut self, text: &str, level: u8) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading{}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
            level, text
        ));
        self
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            text
        ));
        self
    }

    pub fn blank(mut self) -> Self {
        self.body.push_str("<w:p/>");
        self
    }

    /// List paragraph; the numbering part defines list `1` as decimal at every level.
    pub fn list_item(mut self, text: &str, level: u8) -> Self {
        self.numbering = Some(decimal_numbering());
        self.body.push_str(&format!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="{}"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
            level, text
        ));
        self
    }

    /// Paragraph ending in an endnote reference.
    pub fn cited_paragraph(mut self, text: &str, note_id: &str, note_text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:t>{}</w:t></w:r><w:r><w:rPr><w:vertAlign w:val="superscript"/></w:rPr><w:endnoteReference w:id="{}"/></w:r></w:p>"#,
            text, note_id
        ));
        self.endnotes.push((note_id.to_string(), note_text.to_string()));
        self
    }

    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        self.body.push_str("<w:tbl>");
        for row in rows {
            self.body.push_str("<w:tr>");
            for cell in *row {
                self.body.push_str(&format!(
                    r#"<w:tc><w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:tc>"#,
                    cell
                ));
            }
            self.body.push_str("</w:tr>");
        }
        self.body.push_str("</w:tbl>");
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut part = |name: &str, content: String| {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        part(
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#.to_string(),
        );
        part(
            "word/document.xml",
            format!(
                "<w:document {}><w:body>{}</w:body></w:document>",
                W_NS, self.body
            ),
        );
        part(
            "word/styles.xml",
            format!("<w:styles {}>{}</w:styles>", W_NS, STYLES),
        );
        if let Some(numbering) = &self.numbering {
            part("word/numbering.xml", numbering.clone());
        }
        if !self.endnotes.is_empty() {
            let notes: String = self
                .endnotes
                .iter()
                .map(|(id, text)| {
                    format!(
                        r#"<w:endnote w:id="{}"><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:endnote>"#,
                        id, text
                    )
                })
                .collect();
            part(
                "word/endnotes.xml",
                format!(
                    r#"<w:endnotes {}><w:endnote w:id="-1" w:type="separator"><w:p/></w:endnote><w:endnote w:id="0" w:type="continuationSeparator"><w:p/></w:endnote>{}</w:endnotes>"#,
                    W_NS, notes
                ),
            );
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

fn decimal_numbering() -> String {
    let levels: String = (0..9)
        .map(|l| format!(r#"<w:lvl w:ilvl="{}"><w:numFmt w:val="decimal"/></w:lvl>"#, l))
        .collect();
    format!(
        r#"<w:numbering {}><w:abstractNum w:abstractNumId="0">{}</w:abstractNum><w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num></w:numbering>"#,
        W_NS, levels
    )
}

/// Read one part of a written package as text.
pub fn read_part(path: &Path, name: &str) -> String {
    use std::io::Read;
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}
