//! Human-readable markdown for an analysis artifact.

use super::anchor::{document_anchor, question_anchors};
use super::entities::{CaseAnalysisArtifact, DocumentRecord};
use std::fmt::Write;

/// Render the standalone analysis summary (`document_analysis_<token>.md`).
pub fn render_analysis_markdown(artifact: &CaseAnalysisArtifact) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Document Analysis Summary\n");
    let _ = writeln!(
        out,
        "*Generated by Themis using the {} model on {}*\n",
        artifact.model,
        artifact.generated_at.format("%Y-%m-%d at %H:%M UTC")
    );
    let _ = writeln!(out, "## Overview\n");
    let _ = writeln!(out, "### Analyzed Documents\n");
    write_document_index(&mut out, artifact);
    out.push('\n');

    let _ = writeln!(out, "## Document Details\n");
    for record in &artifact.documents {
        write_document_section(&mut out, record, 3);
    }

    out.push_str("\n*End of Document Analysis Summary*\n");
    out
}

/// Numbered list of documents linking to their sections
pub(crate) fn write_document_index(out: &mut String, artifact: &CaseAnalysisArtifact) {
    for (i, record) in artifact.documents.iter().enumerate() {
        let failed = record.failed_count();
        let status = if failed == 0 {
            String::new()
        } else {
            format!(" ({} of {} answers failed)", failed, record.answers.len())
        };
        let _ = writeln!(
            out,
            "{}. [**{}**](#{}){}",
            i + 1,
            record.filename,
            document_anchor(&record.filename),
            status
        );
    }
}

/// One document: heading, quick links, then every Q&A pair.
///
/// `level` is the markdown heading level of the document heading; questions
/// are rendered one level below.
pub(crate) fn write_document_section(out: &mut String, record: &DocumentRecord, level: usize) {
    let doc_heading = "#".repeat(level);
    let question_heading = "#".repeat(level + 1);
    let anchors = question_anchors(record);

    let _ = writeln!(out, "<a id=\"{}\"></a>", document_anchor(&record.filename));
    let _ = writeln!(out, "{} {}\n", doc_heading, record.filename);

    let _ = writeln!(out, "**Quick Links:**\n");
    for (i, (pair, anchor)) in record.answers.iter().zip(&anchors).enumerate() {
        let _ = writeln!(out, "- [{}. {}](#{})", i + 1, pair.question, anchor);
    }
    out.push('\n');

    for (pair, anchor) in record.answers.iter().zip(&anchors) {
        let _ = writeln!(out, "<a id=\"{}\"></a>", anchor);
        let _ = writeln!(out, "{} {}\n", question_heading, pair.question);
        let _ = writeln!(out, "{}\n", pair.answer.trim_end());
        out.push_str("---\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::entities::QaPair;
    use crate::core::model::Model;

    fn artifact() -> CaseAnalysisArtifact {
        CaseAnalysisArtifact::new(
            Model::new("m1"),
            vec![DocumentRecord::new(
                "Indictment.pdf",
                vec![
                    QaPair::answered("What are the charges?", "Two counts of wire fraud."),
                    QaPair::failed("Any deadlines?", "timeout"),
                ],
            )],
        )
    }

    #[test]
    fn test_summary_contains_every_answer() {
        let md = render_analysis_markdown(&artifact());
        assert!(md.starts_with("# Document Analysis Summary"));
        assert!(md.contains("using the m1 model"));
        assert!(md.contains("Two counts of wire fraud."));
        assert!(md.contains("[analysis failed: timeout]"));
        assert!(md.contains("(1 of 2 answers failed)"));
    }

    #[test]
    fn test_quick_links_resolve_to_anchors() {
        let md = render_analysis_markdown(&artifact());
        for anchor in question_anchors(&artifact().documents[0]) {
            assert!(md.contains(&format!("](#{})", anchor)));
            assert!(md.contains(&format!("<a id=\"{}\"></a>", anchor)));
        }
    }
}
