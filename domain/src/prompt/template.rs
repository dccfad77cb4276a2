//! Prompt templates for document analysis and defense synthesis

use crate::analysis::entities::CaseAnalysisArtifact;
use crate::defense::DefenseKind;
use crate::util::truncate_chars;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Prompt asking one question about one document.
    ///
    /// Only the first `char_budget` characters of the document are sent.
    pub fn document_question(question: &str, document_text: &str, char_budget: usize) -> String {
        format!(
            r#"Based on the following legal document, please answer this question: {}

Document text:
{}"#,
            question,
            truncate_chars(document_text, char_budget)
        )
    }

    /// Plain-text view of every document record, cut to `char_budget`.
    ///
    /// Failed answers are left out so placeholders never reach the model.
    pub fn analysis_digest(artifact: &CaseAnalysisArtifact, char_budget: usize) -> String {
        let mut digest = String::from("Document Analysis Summary:\n\n");
        for record in &artifact.documents {
            digest.push_str(&format!("Document: {}\n", record.filename));
            for pair in record.answers.iter().filter(|p| !p.is_failed()) {
                digest.push_str(&format!("{}\n{}\n\n", pair.question, pair.answer.trim()));
            }
        }
        truncate_chars(&digest, char_budget).to_string()
    }

    /// Prompt for one defense document
    pub fn defense(kind: DefenseKind, digest: &str) -> String {
        let instructions = match kind {
            DefenseKind::Strategy => {
                r#"Based on the following case document analysis, generate a comprehensive legal defense strategy.
Please include:
1. Key defense arguments
2. Potential weaknesses in the prosecution's case
3. Recommended counter-arguments
4. Suggested evidence to gather or present
5. Possible legal precedents to cite
6. Strategic recommendations"#
            }
            DefenseKind::ActionItems => {
                r#"Based on the following case document analysis, generate a list of specific action items the defense needs to complete.
Include:
1. Evidence collection tasks
2. Witness interviews needed
3. Legal research requirements
4. Motion filing deadlines
5. Expert consultation needs
Format as a detailed checklist with priorities and responsible parties."#
            }
            DefenseKind::Timeline => {
                r#"Based on the following case document analysis, create a chronological timeline of events relevant to the case.
Include:
1. Key dates and events
2. Filing deadlines
3. Important procedural dates
4. Relevant historical events
Format as a clear chronological sequence from earliest to latest date, with importance flags."#
            }
        };

        format!("{}\n\nAnalysis Summary:\n{}", instructions, digest)
    }
}
