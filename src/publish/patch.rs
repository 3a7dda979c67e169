//! Idempotent placement of the managed section inside a document.

use regex::Regex;

/// Which branch of the patch policy fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction {
    Replaced,
    Inserted,
    Appended,
}

impl PatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replaced => "replaced",
            Self::Inserted => "inserted",
            Self::Appended => "appended",
        }
    }
}

impl std::fmt::Display for PatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locates the managed section and the insertion anchor by `id`.
#[derive(Debug, Clone)]
pub struct SectionPatcher {
    section: Regex,
    anchor: Regex,
}

impl SectionPatcher {
    pub fn new(section_id: &str, anchor_id: &str) -> Result<Self, regex::Error> {
        let section = Regex::new(&format!(
            r#"(?is)[ \t]*<section\b[^>]*?\sid\s*=\s*["']{}["'][^>]*>.*?</section\s*>"#,
            regex::escape(section_id)
        ))?;
        let anchor = Regex::new(&format!(
            r#"(?i)<[a-z][a-z0-9-]*\b[^>]*?\sid\s*=\s*["']{}["'][^>]*>"#,
            regex::escape(anchor_id)
        ))?;
        Ok(Self { section, anchor })
    }

    /// Number of managed sections present in `document`.
    pub fn count_sections(&self, document: &str) -> usize {
        self.section.find_iter(document).count()
    }

    /// Place `fragment` into `document`.
    ///
    /// Replaces an existing managed section, else inserts before the anchor
    /// element, else appends. Any extra managed sections are removed, so the
    /// result always holds exactly one.
    pub fn patch(&self, document: &str, fragment: &str) -> (String, PatchAction) {
        let fragment = fragment.trim_end();

        if let Some(replaced) = self.replace(document, fragment) {
            return (replaced, PatchAction::Replaced);
        }

        if let Some(anchor) = self.anchor.find(document) {
            let at = line_start_if_indented(document, anchor.start());
            let mut out = String::with_capacity(document.len() + fragment.len() + 2);
            out.push_str(&document[..at]);
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(fragment);
            out.push('\n');
            out.push_str(&document[at..]);
            return (out, PatchAction::Inserted);
        }

        let trimmed = document.trim_end();
        let separator = if trimmed.is_empty() { "" } else { "\n\n" };
        (
            format!("{}{}{}\n", trimmed, separator, fragment),
            PatchAction::Appended,
        )
    }

    fn replace(&self, document: &str, fragment: &str) -> Option<String> {
        let mut matches = self.section.find_iter(document);
        let first = matches.next()?;

        let mut out = String::with_capacity(document.len() + fragment.len());
        out.push_str(&document[..first.start()]);
        out.push_str(fragment);
        let mut rest = first.end();

        for extra in matches {
            out.push_str(&document[rest..extra.start()]);
            rest = extra.end();
            // Drop the line break the removed section leaves behind
            if document[rest..].starts_with("\r\n") {
                rest += 2;
            } else if document[rest..].starts_with('\n') {
                rest += 1;
            }
        }
        out.push_str(&document[rest..]);
        Some(out)
    }
}

/// Start of the line containing `pos` when only blanks precede it there.
fn line_start_if_indented(document: &str, pos: usize) -> usize {
    let line_start = document[..pos].rfind('\n').map_or(0, |i| i + 1);
    if document[line_start..pos].chars().all(|c| c == ' ' || c == '\t') {
        line_start
    } else {
        pos
    }
}
