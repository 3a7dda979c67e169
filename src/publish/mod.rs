//! Rendering and publishing the managed deals section.

mod patch;
mod render;

pub use patch::{PatchAction, SectionPatcher};
pub use render::{render_section, PublishedSection, SectionLabels};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::models::ResolvedDeal;
use crate::pipeline::{PublishError, Selection};
use crate::storage::{backup_document, write_atomic};

/// What a successful publish did.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub action: PatchAction,
    pub section: PublishedSection,
    pub document: PathBuf,
    pub backup: Option<PathBuf>,
}

/// Renders deal batches and patches them into the target document.
#[derive(Debug, Clone)]
pub struct SectionPublisher {
    section_id: String,
    patcher: SectionPatcher,
    labels: SectionLabels,
}

/// True for ids that render and match verbatim: a letter followed by
/// letters, digits, `-`, `_`, `:` or `.`.
pub fn is_plain_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

impl SectionPublisher {
    pub fn new(section_id: &str, anchor_id: &str, labels: SectionLabels) -> Result<Self, PublishError> {
        for id in [section_id, anchor_id] {
            if !is_plain_id(id) {
                return Err(PublishError::InvalidId { id: id.to_string() });
            }
        }
        Ok(Self {
            section_id: section_id.to_string(),
            patcher: SectionPatcher::new(section_id, anchor_id)?,
            labels,
        })
    }

    pub fn render(&self, deals: &[ResolvedDeal]) -> PublishedSection {
        render_section(deals, &self.section_id, &self.labels, Local::now())
    }

    pub fn patch(&self, document: &str, fragment: &str) -> (String, PatchAction) {
        self.patcher.patch(document, fragment)
    }

    /// Publish a selection into `document`.
    ///
    /// Nothing is read or written unless the selection meets its required
    /// count. The document is either rewritten once with a fresh section or
    /// left untouched.
    pub fn publish(
        &self,
        selection: &Selection,
        document: &Path,
        backup_dir: Option<&Path>,
    ) -> Result<PublishOutcome, PublishError> {
        if !selection.meets_requirement {
            warn!(
                "Only {} real deals (need {}), not publishing",
                selection.total_real, selection.required
            );
            return Err(PublishError::InsufficientRealDeals {
                found: selection.total_real,
                required: selection.required,
            });
        }

        let current =
            fs::read_to_string(document).map_err(|e| PublishError::document(document, e))?;
        let section = self.render(&selection.chosen);
        let (updated, action) = self.patch(&current, &section.html);

        let backup = match backup_dir {
            Some(dir) => Some(
                backup_document(document, dir, section.timestamp)
                    .map_err(|e| PublishError::document(dir, e))?,
            ),
            None => None,
        };

        write_atomic(document, updated.as_bytes())
            .map_err(|e| PublishError::document(document, e))?;

        info!(
            "Published {} deals to {} ({})",
            section.deal_count,
            document.display(),
            action
        );

        Ok(PublishOutcome {
            action,
            section,
            document: document.to_path_buf(),
            backup,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn deal(i: usize) -> ResolvedDeal {
        ResolvedDeal {
            title: format!("Deal {}", i),
            description: String::new(),
            url: format!("https://shop{}.example.com/offer", i),
            source_url: "https://www.latestfreestuff.co.uk/x".to_string(),
            merchant: format!("shop{}.example.com", i),
            date: "2026-10-18".to_string(),
            image: None,
            verified: true,
            confidence: None,
            title_zh: None,
            description_zh: None,
        }
    }

    fn selection(n: usize, required: usize) -> Selection {
        let chosen: Vec<_> = (1..=n.min(required)).map(deal).collect();
        Selection {
            chosen,
            meets_requirement: n >= required,
            total_real: n,
            required,
        }
    }

    fn publisher() -> SectionPublisher {
        SectionPublisher::new("deals", "benefits", SectionLabels::default()).unwrap()
    }

    #[test]
    fn test_insufficient_selection_touches_nothing() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("missing.html");
        let err = publisher()
            .publish(&selection(4, 6), &doc, Some(&dir.path().join("backups")))
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::InsufficientRealDeals { found: 4, required: 6 }
        ));
        assert!(!doc.exists());
        assert!(!dir.path().join("backups").exists());
    }

    #[test]
    fn test_publish_writes_and_backs_up() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("index.html");
        let original = "<body>\n    <section id=\"benefits\">b</section>\n</body>\n";
        fs::write(&doc, original).unwrap();

        let backups = dir.path().join("backups");
        let outcome = publisher()
            .publish(&selection(6, 6), &doc, Some(&backups))
            .unwrap();
        assert_eq!(outcome.action, PatchAction::Inserted);
        assert_eq!(outcome.section.deal_count, 6);

        let backup = outcome.backup.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), original);
        let written = fs::read_to_string(&doc).unwrap();
        assert!(written.contains("shop6.example.com/offer"));

        let again = publisher().publish(&selection(6, 6), &doc, None).unwrap();
        assert_eq!(again.action, PatchAction::Replaced);
        assert!(again.backup.is_none());
    }

    #[test]
    fn test_rejects_ids_that_need_escaping() {
        for (section, anchor) in [("deals&more", "benefits"), ("deals", "it's"), ("", "benefits"), ("deals", "a b")] {
            let err = SectionPublisher::new(section, anchor, SectionLabels::default()).unwrap_err();
            assert!(matches!(err, PublishError::InvalidId { .. }), "{} {}", section, anchor);
        }
        assert!(SectionPublisher::new("deals-2026_uk", "benefits.main", SectionLabels::default()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_keeps_document_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let doc = dir.path().join("index.html");
        fs::write(&doc, "<body></body>\n").unwrap();
        fs::set_permissions(&doc, fs::Permissions::from_mode(0o644)).unwrap();

        publisher().publish(&selection(6, 6), &doc, None).unwrap();
        let mode = fs::metadata(&doc).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_missing_document_is_reported() {
        let dir = tempdir().unwrap();
        let err = publisher()
            .publish(&selection(6, 6), &dir.path().join("nope.html"), None)
            .unwrap_err();
        assert!(matches!(err, PublishError::Document { .. }));
    }
}
