//! Single-chapter EPUB 3 packaging of the combined transcript.
//!
//! Container layout:
//! - `mimetype` (stored, first entry)
//! - `META-INF/container.xml`
//! - `OEBPS/content.opf`, `OEBPS/toc.ncx`, `OEBPS/nav.xhtml`
//! - `OEBPS/chap_01.xhtml`

use crate::error::{PipelineError, Result};
use std::fs::File;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Fixed book identifier. Two generated books cannot be told apart by it.
pub const BOOK_IDENTIFIER: &str = "id123456";
pub const BOOK_LANGUAGE: &str = "en";
pub const CHAPTER_TITLE: &str = "Chapter 1";
pub const CHAPTER_FILE: &str = "chap_01.xhtml";

const PARAGRAPH_BREAK: &str = "\n\n";

/// Metadata written into the package document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    pub identifier: String,
    /// `dcterms:modified` timestamp, `YYYY-MM-DDThh:mm:ssZ`
    pub modified: String,
}

impl BookMetadata {
    /// Metadata for a book written to `path`: the title is the file's base
    /// name without extension.
    pub fn for_output(path: &Path, author: &str) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            title,
            author: author.trim().to_string(),
            language: BOOK_LANGUAGE.to_string(),
            identifier: BOOK_IDENTIFIER.to_string(),
            modified: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Result of writing a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpubSummary {
    pub paragraphs: usize,
    pub bytes: u64,
}

/// Blank-line separated paragraphs, trimmed, empty ones dropped.
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    content
        .split(PARAGRAPH_BREAK)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Write `content` as a single-chapter EPUB at `path`.
pub fn write_epub(content: &str, path: &Path, author: &str) -> Result<EpubSummary> {
    log::info!("Starting ePub creation with content length: {}", content.len());

    let metadata = BookMetadata::for_output(path, author);
    let packaging_error = |source: io::Error| PipelineError::Packaging {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(packaging_error)?;
    let paragraphs =
        write_epub_to_writer(content, &metadata, BufWriter::new(file)).map_err(packaging_error)?;
    let bytes = std::fs::metadata(path).map_err(packaging_error)?.len();

    log::info!("ePub file created: {}", path.display());
    log::info!("ePub file size: {} bytes ({} paragraphs)", bytes, paragraphs);

    Ok(EpubSummary { paragraphs, bytes })
}

/// Write the book to any [`Write`] + [`Seek`] sink. Returns the paragraph count.
pub fn write_epub_to_writer<W: Write + Seek>(
    content: &str,
    metadata: &BookMetadata,
    writer: W,
) -> io::Result<usize> {
    let paragraphs = split_paragraphs(content);
    let chapter = chapter_xhtml(&paragraphs, &metadata.language);
    log::debug!("Created HTML content for ePub. Length: {}", chapter.len());

    let mut zip = ZipWriter::new(writer);
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let entries = [
        ("META-INF/container.xml", CONTAINER_XML.to_string()),
        ("OEBPS/content.opf", package_opf(metadata)),
        ("OEBPS/toc.ncx", toc_ncx(metadata)),
        ("OEBPS/nav.xhtml", nav_xhtml(metadata)),
        ("OEBPS/chap_01.xhtml", chapter),
    ];

    // mimetype must be the first entry and uncompressed
    zip.start_file("mimetype", stored).map_err(io::Error::other)?;
    zip.write_all(b"application/epub+zip")?;

    for (name, body) in entries {
        zip.start_file(name, deflated).map_err(io::Error::other)?;
        zip.write_all(body.as_bytes())?;
    }

    let mut writer = zip.finish().map_err(io::Error::other)?;
    writer.flush()?;
    Ok(paragraphs.len())
}

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

fn package_opf(metadata: &BookMetadata) -> String {
    let mut opf = String::new();

    opf.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id" xml:lang="{lang}">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
    <dc:identifier id="id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:language>{lang}</dc:language>
"#,
        lang = escape_xml(&metadata.language),
        id = escape_xml(&metadata.identifier),
        title = escape_xml(&metadata.title),
    ));

    if !metadata.author.is_empty() {
        opf.push_str(&format!(
            "    <dc:creator id=\"creator\">{}</dc:creator>\n",
            escape_xml(&metadata.author)
        ));
    }

    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        escape_xml(&metadata.modified)
    ));

    opf.push_str(&format!(
        r#"  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="chap_01" href="{chapter}" media-type="application/xhtml+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="nav"/>
    <itemref idref="chap_01"/>
  </spine>
</package>
"#,
        chapter = CHAPTER_FILE
    ));

    opf
}

fn toc_ncx(metadata: &BookMetadata) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{id}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
    <navPoint id="chapter1" playOrder="1">
      <navLabel>
        <text>{chapter_title}</text>
      </navLabel>
      <content src="{chapter}"/>
    </navPoint>
  </navMap>
</ncx>
"#,
        id = escape_xml(&metadata.identifier),
        title = escape_xml(&metadata.title),
        chapter_title = CHAPTER_TITLE,
        chapter = CHAPTER_FILE,
    )
}

fn nav_xhtml(metadata: &BookMetadata) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>
  <nav epub:type="toc" id="id" role="doc-toc">
    <h2>{title}</h2>
    <ol>
      <li><a href="{chapter}">{chapter_title}</a></li>
    </ol>
  </nav>
</body>
</html>
"#,
        lang = escape_xml(&metadata.language),
        title = escape_xml(&metadata.title),
        chapter = CHAPTER_FILE,
        chapter_title = CHAPTER_TITLE,
    )
}

fn chapter_xhtml(paragraphs: &[&str], language: &str) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", escape_xml(p)))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{chapter_title}</title>
</head>
<body>{body}</body>
</html>
"#,
        lang = escape_xml(language),
        chapter_title = CHAPTER_TITLE,
        body = body,
    )
}

/// Escape markup characters and drop code points XML 1.0 does not allow.
/// Whitespace control codes such as form feed become a plain space.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_xml_char(c) => out.push(c),
            c if c.is_whitespace() => out.push(' '),
            _ => {}
        }
    }
    out
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}
