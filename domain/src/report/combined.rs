//! Combined report merging analysis and defense materials.

use super::layout::RunLayout;
use crate::analysis::anchor::{document_anchor, question_anchors, slug};
use crate::analysis::entities::CaseAnalysisArtifact;
use crate::analysis::render::{write_document_index, write_document_section};
use crate::defense::{DefenseArtifact, DefenseKind};
use std::fmt::Write;

const ANALYSIS_ANCHOR: &str = "document-analysis";

/// Anchor of a defense section inside the combined report
pub fn defense_anchor(kind: DefenseKind) -> String {
    slug(kind.title())
}

/// Render `<YYYYMMDD>_<token>.md`.
pub fn render_combined_report(
    artifact: &CaseAnalysisArtifact,
    defense: &DefenseArtifact,
    layout: &RunLayout,
) -> String {
    let mut out = String::new();
    let case_name = layout
        .case_dir()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| layout.case_dir().display().to_string());

    let _ = writeln!(out, "# Themis Case Report: {}\n", case_name);
    let _ = writeln!(
        out,
        "*Model: {} | Analysis generated {} | Run {}*\n",
        artifact.model,
        artifact.generated_at.format("%Y-%m-%d at %H:%M UTC"),
        layout.date().format("%Y-%m-%d")
    );

    // Table of contents
    let _ = writeln!(out, "## Contents\n");
    let _ = writeln!(out, "- [Document Analysis](#{})", ANALYSIS_ANCHOR);
    for record in &artifact.documents {
        let _ = writeln!(
            out,
            "  - [{}](#{})",
            record.filename,
            document_anchor(&record.filename)
        );
        for (i, (pair, anchor)) in record
            .answers
            .iter()
            .zip(question_anchors(record))
            .enumerate()
        {
            let _ = writeln!(out, "    - [{}. {}](#{})", i + 1, pair.question, anchor);
        }
    }
    for kind in DefenseKind::ALL {
        let _ = writeln!(out, "- [{}](#{})", kind.title(), defense_anchor(kind));
    }
    out.push('\n');

    let _ = writeln!(out, "## Source Files\n");
    let _ = writeln!(
        out,
        "- Analysis: [{}]({})",
        layout.analysis_markdown_name(),
        layout.relative_analysis_markdown()
    );
    for kind in DefenseKind::ALL {
        let _ = writeln!(
            out,
            "- {}: [{}]({})",
            kind.title(),
            kind.file_name(),
            layout.relative_defense_file(kind)
        );
    }
    out.push('\n');

    let _ = writeln!(out, "<a id=\"{}\"></a>", ANALYSIS_ANCHOR);
    let _ = writeln!(out, "## Document Analysis\n");
    write_document_index(&mut out, artifact);
    out.push('\n');
    for record in &artifact.documents {
        write_document_section(&mut out, record, 3);
    }

    for section in defense.sections() {
        let _ = writeln!(out, "<a id=\"{}\"></a>", defense_anchor(section.kind));
        let _ = writeln!(out, "## {}\n", section.kind.title());
        let _ = writeln!(out, "{}\n", section.content.trim_end());
    }

    out.push_str("*End of Case Report*\n");
    out
}
