//! Document loading and text extraction.

use abunda_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Html,
    Code,
    #[serde(rename = "text")]
    PlainText,
    Unknown,
}

/// Extensions of formats we cannot extract text from.
const BINARY_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "rtf", "png", "jpg", "jpeg",
    "gif", "bmp", "webp", "svg", "zip", "gz", "tar", "exe", "bin",
];

impl ContentType {
    /// Detect content type from a file name.
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("rs") | Some("py") | Some("js") | Some("ts") | Some("go") | Some("c")
            | Some("cpp") | Some("java") | Some("sh") | Some("yaml") | Some("yml")
            | Some("json") | Some("toml") | Some("csv") => Self::Code,
            Some("txt") | Some("text") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Code => "code",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// A document ready for chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source name or path; also the key for fragment ids
    pub id: String,
    pub content_type: ContentType,
    /// Extracted plain text
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content_type: ContentType, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_type,
            text: text.into(),
        }
    }
}

/// Build a document from raw bytes and the name they were uploaded under.
pub fn load_bytes(bytes: &[u8], filename: &str) -> AppResult<Document> {
    if let Some(ext) = extension(filename) {
        if BINARY_EXTENSIONS.contains(&ext.as_str()) {
            return Err(AppError::Ingestion(format!(
                "unsupported document format: .{} ({})",
                ext, filename
            )));
        }
    }

    let raw = std::str::from_utf8(bytes).map_err(|_| {
        AppError::Ingestion(format!(
            "unsupported document format: {} is not UTF-8 text",
            filename
        ))
    })?;

    let content_type = ContentType::from_name(filename);

    let text = match content_type {
        ContentType::Markdown => clean_markdown(raw),
        ContentType::Html => clean_html(raw),
        ContentType::Code | ContentType::PlainText => raw.to_string(),
        ContentType::Unknown => {
            if is_likely_text(raw) {
                raw.to_string()
            } else {
                tracing::warn!("Rejecting likely binary file: {}", filename);
                return Err(AppError::Ingestion(format!(
                    "unsupported document format: {} looks binary",
                    filename
                )));
            }
        }
    };

    tracing::debug!(
        "Loaded {} as {} ({} bytes of text)",
        filename,
        content_type.as_str(),
        text.len()
    );

    Ok(Document::new(filename, content_type, text))
}

/// Read and extract a document from the filesystem.
pub fn load_path(path: &Path) -> AppResult<Document> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

    load_bytes(&bytes, &path.to_string_lossy())
}

/// Expand files and directories into the list of files to ingest.
///
/// Directories are walked recursively. `exclude` substrings win over
/// `include` substrings; an empty `include` list accepts everything.
pub fn discover_files(paths: &[PathBuf], include: &[String], exclude: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| should_include(p, include, exclude))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            tracing::warn!("Skipping missing path: {:?}", path);
        }
    }

    files
}

/// Check if a file should be included based on patterns.
fn should_include(path: &Path, include: &[String], exclude: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    if exclude.iter().any(|pattern| path_str.contains(pattern.as_str())) {
        return false;
    }

    include.is_empty() || include.iter().any(|pattern| path_str.contains(pattern.as_str()))
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Tags that end a block of text in HTML.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "td", "th", "title", "tr", "ul",
];

/// Accumulates lines, separating paragraphs with one blank line.
#[derive(Default)]
struct Paragraphs {
    text: String,
    pending_break: bool,
}

impl Paragraphs {
    fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push_str(if self.pending_break { "\n\n" } else { "\n" });
        }
        self.text.push_str(line);
        self.pending_break = false;
    }

    fn end_paragraph(&mut self) {
        self.pending_break = true;
    }

    fn finish(self) -> String {
        self.text.trim_end().to_string()
    }
}

/// Strip markdown markup, keeping paragraph breaks and fenced code verbatim.
fn clean_markdown(text: &str) -> String {
    let mut out = Paragraphs::default();
    let mut fence: Option<&str> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
                out.end_paragraph();
            } else {
                out.push_line(line);
            }
            continue;
        }

        if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(*m)) {
            fence = Some(marker);
            out.end_paragraph();
            continue;
        }

        if trimmed.is_empty() || is_rule(trimmed) {
            out.end_paragraph();
            continue;
        }

        match heading_text(trimmed) {
            Some(heading) => {
                out.end_paragraph();
                if !heading.is_empty() {
                    out.push_line(heading);
                }
                out.end_paragraph();
            }
            None => out.push_line(trimmed),
        }
    }

    out.finish()
}

/// Text of an ATX heading (`## Title`), or `None` for any other line.
fn heading_text(line: &str) -> Option<&str> {
    let body = line.trim_start_matches('#');
    if body.len() == line.len() || !(body.is_empty() || body.starts_with(' ')) {
        return None;
    }
    Some(body.trim().trim_end_matches('#').trim_end())
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&c| compact.chars().all(|x| x == c))
}

/// Strip HTML tags, scripts and styles; block-level tags end a paragraph.
fn clean_html(text: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut tag_start = None;
    let mut in_script = false;
    let mut in_style = false;

    for (i, ch) in text.char_indices() {
        if ch == '<' {
            tag_start = Some(i);

            let rest = &text[i..];
            if starts_with_ignore_case(rest, "<script") {
                in_script = true;
            } else if starts_with_ignore_case(rest, "</script") {
                in_script = false;
            } else if starts_with_ignore_case(rest, "<style") {
                in_style = true;
            } else if starts_with_ignore_case(rest, "</style") {
                in_style = false;
            }
        } else if ch == '>' {
            let Some(start) = tag_start.take() else {
                continue;
            };
            if BLOCK_TAGS.contains(&tag_name(&text[start + 1..i]).as_str()) {
                flush_paragraph(&mut current, &mut paragraphs);
            } else {
                // Keep words on either side of an inline tag apart
                current.push(' ');
            }
        } else if tag_start.is_none() && !in_script && !in_style {
            current.push(ch);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs.join("\n\n")
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn flush_paragraph(current: &mut String, paragraphs: &mut Vec<String>) {
    let paragraph = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !paragraph.is_empty() {
        paragraphs.push(paragraph);
    }
    current.clear();
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}

/// Check if text is likely UTF-8 text (not binary).
fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(ContentType::from_name("file.md"), ContentType::Markdown);
        assert_eq!(ContentType::from_name("FILE.HTML"), ContentType::Html);
        assert_eq!(ContentType::from_name("file.rs"), ContentType::Code);
        assert_eq!(ContentType::from_name("file.txt"), ContentType::PlainText);
        assert_eq!(ContentType::from_name("README"), ContentType::Unknown);
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\ncontinues here\n\n\n\n---\n\nMore text ## not a heading";
        assert_eq!(
            clean_markdown(input),
            "Header\n\nSome text\ncontinues here\n\nMore text ## not a heading"
        );
    }

    #[test]
    fn test_markdown_keeps_paragraphs_and_fenced_code() {
        let source = "# Vacation\n\nEmployees get 25 days.\n\n# Travel\n\n```python\n# approve first\n\nbook()\n```\n";
        let doc = load_bytes(source.as_bytes(), "handbook.md").unwrap();
        assert_eq!(
            doc.text,
            "Vacation\n\nEmployees get 25 days.\n\nTravel\n\n# approve first\n\nbook()"
        );
    }

    #[test]
    fn test_markdown_heading_without_blank_line_is_own_paragraph() {
        let output = clean_markdown("## Benefits ##\nDental is covered.\n#hashtag stays");
        assert_eq!(output, "Benefits\n\nDental is covered.\n#hashtag stays");
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><body><p>Hello <b>world</b></p><script>var x = 1;</script></body></html>";
        assert_eq!(clean_html(input), "Hello world");
    }

    #[test]
    fn test_html_block_tags_split_paragraphs() {
        let input = "<h1>Travel</h1>\n<p>Book   through\nthe portal.</p><ul><li>Trains</li><li>Flights</li></ul>Footer<br/>text";
        assert_eq!(
            clean_html(input),
            "Travel\n\nBook through the portal.\n\nTrains\n\nFlights\n\nFooter\n\ntext"
        );
    }

    #[test]
    fn test_clean_html_multibyte() {
        let input = "<p>Política de férias</p><STYLE>p { color: red }</STYLE><p>açúcar</p>";
        assert_eq!(clean_html(input), "Política de férias\n\naçúcar");
    }

    #[test]
    fn test_code_kept_verbatim() {
        let source = "# comment\nfn main() {}\n";
        let doc = load_bytes(source.as_bytes(), "main.rs").unwrap();
        assert_eq!(doc.text, source);
        assert_eq!(doc.content_type, ContentType::Code);
        assert_eq!(doc.id, "main.rs");
    }

    #[test]
    fn test_binary_formats_rejected() {
        let err = load_bytes(b"%PDF-1.7", "report.pdf").unwrap_err();
        assert!(matches!(err, AppError::Ingestion(msg) if msg.contains("unsupported")));

        let err = load_bytes(&[0xff, 0xfe, 0x00, 0x41], "data.txt").unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));

        let err = load_bytes(b"abc\0def", "blob").unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_load_path_and_discover() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(docs.join("drafts")).unwrap();
        fs::write(docs.join("policy.md"), "# Policy\nBe kind.").unwrap();
        fs::write(docs.join("faq.txt"), "Q: hours? A: 9-5").unwrap();
        fs::write(docs.join("drafts/wip.md"), "unfinished").unwrap();

        let all = discover_files(&[docs.clone()], &[], &[]);
        assert_eq!(all.len(), 3);

        let filtered = discover_files(&[docs.clone()], &[".md".to_string()], &["drafts".to_string()]);
        assert_eq!(filtered, vec![docs.join("policy.md")]);

        let doc = load_path(&docs.join("policy.md")).unwrap();
        assert_eq!(doc.text, "Policy\n\nBe kind.");
    }
}
