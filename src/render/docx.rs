//! DOCX to HTML conversion
//!
//! Reads `word/document.xml` out of the Office Open XML archive and walks it
//! with a streaming XML reader. Only semantic structure is kept: paragraphs,
//! headings, bulleted/numbered lists, basic run formatting, line breaks and
//! tables. Styling (fonts, colours, sizes) is discarded.

use std::io::{Cursor, Read};

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{DocumentRenderer, RenderError, Rendered};

/// Compound File Binary header used by legacy `.doc` files
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Paragraph styles rendered as plain `<p>` without a warning
const PLAIN_STYLES: &[&str] = &["Normal", "ListParagraph", "BodyText", "NoSpacing"];

const IMAGE_WARNING: &str = "Image omitted: embedded images are not converted";

/// DOCX renderer
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl DocumentRenderer for DocxRenderer {
    fn render(&self, bytes: &[u8]) -> Result<Rendered, RenderError> {
        if bytes.starts_with(&OLE_MAGIC) {
            return Err(RenderError::Unsupported(
                "legacy binary Word document".to_string(),
            ));
        }

        let xml = read_document_xml(bytes)?;
        convert(&xml)
    }
}

/// Extract the main document part from the archive
fn read_document_xml(bytes: &[u8]) -> Result<String, RenderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut part = match archive.by_name("word/document.xml") {
        Ok(part) => part,
        Err(zip::result::ZipError::FileNotFound) => return Err(RenderError::MissingDocument),
        Err(e) => return Err(e.into()),
    };

    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

fn convert(xml: &str) -> Result<Rendered, RenderError> {
    let mut reader = Reader::from_str(xml);
    let mut converter = Converter::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            // Alternate-content fallbacks repeat what the preceding choice held
            Event::Start(e) if converter.skip_depth > 0 || e.local_name().as_ref() == b"Fallback" => {
                converter.skip_depth += 1;
            }
            Event::End(_) if converter.skip_depth > 0 => converter.skip_depth -= 1,
            _ if converter.skip_depth > 0 => {}
            Event::Start(e) => converter.open(&e),
            Event::Empty(e) => {
                converter.open(&e);
                converter.close(e.local_name().as_ref());
            }
            Event::End(e) => converter.close(e.local_name().as_ref()),
            Event::Text(t) if converter.in_text => {
                let text = t.unescape().map_err(quick_xml::Error::from)?;
                converter.text(&text);
            }
            _ => {}
        }
    }

    Ok(converter.finish())
}

#[derive(Default)]
struct Paragraph {
    style: Option<String>,
    list_item: bool,
    content: String,
}

#[derive(Default)]
struct Run {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    content: String,
}

impl Run {
    fn into_html(self) -> String {
        let mut html = self.content;
        if self.strike {
            html = format!("<s>{}</s>", html);
        }
        if self.underline {
            html = format!("<u>{}</u>", html);
        }
        if self.italic {
            html = format!("<em>{}</em>", html);
        }
        if self.bold {
            html = format!("<strong>{}</strong>", html);
        }
        html
    }
}

/// An open paragraph. Text boxes nest whole paragraphs inside a run, so
/// paragraphs form a stack.
#[derive(Default)]
struct Frame {
    paragraph: Paragraph,
    run: Option<Run>,
    /// Blocks from nested paragraphs, emitted after this one
    nested: String,
}

struct Converter {
    html: String,
    warnings: Vec<String>,
    frames: Vec<Frame>,
    in_run_props: bool,
    in_text: bool,
    /// Depth inside a skipped subtree
    skip_depth: usize,
    /// Whether a `<ul>` is open, per container (body, table cell, text box)
    list_open: Vec<bool>,
}

impl Converter {
    fn new() -> Self {
        Self {
            html: String::new(),
            warnings: Vec::new(),
            frames: Vec::new(),
            in_run_props: false,
            in_text: false,
            skip_depth: 0,
            list_open: vec![false],
        }
    }

    /// Where finished blocks go: the enclosing paragraph, or the document
    fn out(&mut self) -> &mut String {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.nested,
            None => &mut self.html,
        }
    }

    fn paragraph(&mut self) -> Option<&mut Paragraph> {
        self.frames.last_mut().map(|f| &mut f.paragraph)
    }

    fn run(&mut self) -> Option<&mut Run> {
        self.frames.last_mut().and_then(|f| f.run.as_mut())
    }

    fn in_run(&self) -> bool {
        self.frames.last().map_or(false, |f| f.run.is_some())
    }

    fn open(&mut self, e: &BytesStart) {
        let name = e.local_name();
        match name.as_ref() {
            b"p" => self.frames.push(Frame::default()),
            b"pStyle" => {
                if let Some(p) = self.paragraph() {
                    p.style = attr_value(e, b"val");
                }
            }
            b"numPr" => {
                if let Some(p) = self.paragraph() {
                    p.list_item = true;
                }
            }
            b"r" => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.run = Some(Run::default());
                }
            }
            b"rPr" => self.in_run_props = self.in_run(),
            b"b" | b"i" | b"u" | b"strike" if self.in_run_props => {
                let enabled = is_enabled(e);
                if let Some(run) = self.run() {
                    match name.as_ref() {
                        b"b" => run.bold = enabled,
                        b"i" => run.italic = enabled,
                        b"u" => run.underline = enabled,
                        _ => run.strike = enabled,
                    }
                }
            }
            b"t" => self.in_text = self.in_run(),
            b"br" => {
                if let Some(run) = self.run() {
                    run.content.push_str("<br />");
                }
            }
            b"tab" => {
                if let Some(run) = self.run() {
                    run.content.push(' ');
                }
            }
            b"blip" | b"imagedata" => self.warn(IMAGE_WARNING.to_string()),
            b"txbxContent" => self.list_open.push(false),
            b"tbl" => {
                self.close_list();
                self.out().push_str("<table>");
            }
            b"tr" => self.out().push_str("<tr>"),
            b"tc" => {
                self.out().push_str("<td>");
                self.list_open.push(false);
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"p" => self.end_paragraph(),
            b"r" => self.end_run(),
            b"rPr" => self.in_run_props = false,
            b"t" => self.in_text = false,
            b"txbxContent" => self.end_container(),
            b"tbl" => self.out().push_str("</table>"),
            b"tr" => self.out().push_str("</tr>"),
            b"tc" => {
                self.end_container();
                self.out().push_str("</td>");
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(run) = self.run() {
            run.content.push_str(&partial_escape(text));
        }
    }

    fn end_run(&mut self) {
        self.in_run_props = false;
        self.in_text = false;
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        let Some(run) = frame.run.take() else {
            return;
        };
        if !run.content.is_empty() {
            frame.paragraph.content.push_str(&run.into_html());
        }
    }

    fn end_paragraph(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let p = frame.paragraph;

        if !p.content.is_empty() {
            let heading = p.style.as_deref().and_then(heading_level);

            if p.list_item && heading.is_none() {
                if !self.list_is_open() {
                    self.out().push_str("<ul>");
                    self.set_list_open(true);
                }
                self.out().push_str(&format!("<li>{}</li>", p.content));
            } else {
                self.close_list();
                match heading {
                    Some(level) => {
                        self.out()
                            .push_str(&format!("<h{0}>{1}</h{0}>", level, p.content));
                    }
                    None => {
                        if let Some(style) = p.style.as_deref() {
                            if !PLAIN_STYLES.contains(&style) {
                                self.warn(format!("Unrecognised paragraph style: '{}'", style));
                            }
                        }
                        self.out().push_str(&format!("<p>{}</p>", p.content));
                    }
                }
            }
        }

        if !frame.nested.is_empty() {
            self.close_list();
            self.out().push_str(&frame.nested);
        }
    }

    fn end_container(&mut self) {
        self.close_list();
        if self.list_open.len() > 1 {
            self.list_open.pop();
        }
    }

    fn list_is_open(&self) -> bool {
        self.list_open.last().copied().unwrap_or(false)
    }

    fn set_list_open(&mut self, open: bool) {
        if let Some(last) = self.list_open.last_mut() {
            *last = open;
        }
    }

    fn close_list(&mut self) {
        if self.list_is_open() {
            self.out().push_str("</ul>");
            self.set_list_open(false);
        }
    }

    fn warn(&mut self, message: String) {
        if !self.warnings.contains(&message) {
            self.warnings.push(message);
        }
    }

    fn finish(mut self) -> Rendered {
        while !self.frames.is_empty() {
            self.end_run();
            self.end_paragraph();
        }
        self.close_list();
        Rendered {
            html: self.html,
            warnings: self.warnings,
        }
    }
}

/// Map a paragraph style id to a heading level
fn heading_level(style: &str) -> Option<u8> {
    if style == "Title" {
        return Some(1);
    }
    let level = style
        .strip_prefix("Heading")
        .or_else(|| style.strip_prefix("heading "))?
        .trim()
        .parse::<u8>()
        .ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Toggle properties are on unless `w:val` says otherwise
fn is_enabled(e: &BytesStart) -> bool {
    !matches!(
        attr_value(e, b"val").as_deref(),
        Some("false") | Some("0") | Some("none")
    )
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
