//! Question and QuestionSet value objects

use serde::{Deserialize, Serialize};

/// Built-in questions used when no question file can be loaded.
pub const FALLBACK_QUESTIONS: [&str; 5] = [
    "What are the central claims or charges against the defendant in this document?",
    "What key evidence is presented to support these allegations, including any specific details related to cryptocurrency, digital assets, transactions, or witness statements?",
    "Are there any apparent weaknesses, inconsistencies, or procedural errors in the prosecution's case (such as lack of evidence, jurisdictional issues, or prior conduct references) that could be leveraged in the defense?",
    "What legal precedents, statutes, or regulatory frameworks are referenced, particularly those pertaining to cryptocurrency, digital assets, or asset classification, and how might they impact the case?",
    "What are the imminent deadlines, procedural requirements, or upcoming events (such as status conferences, hearings, detention conditions, or bond matters) that the defense must address promptly?",
];

/// One question posed to every document (Value Object)
///
/// `position` is 1-based and part of the question's identity: the same
/// text at a different position is a different question for caching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    position: usize,
    text: String,
}

impl Question {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.position, self.text)
    }
}

/// Ordered questions for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
    builtin: bool,
}

impl QuestionSet {
    /// Build a set from question texts in order.
    ///
    /// Blank entries are dropped before positions are assigned. Returns
    /// `None` when nothing is left.
    pub fn from_texts<I, S>(texts: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions: Vec<Question> = texts
            .into_iter()
            .map(|t| {
                let text: String = t.into();
                text.trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .enumerate()
            .map(|(i, t)| Question::new(i + 1, t))
            .collect();

        if questions.is_empty() {
            None
        } else {
            Some(Self {
                questions,
                builtin: false,
            })
        }
    }

    /// The built-in legal analysis questions
    pub fn fallback() -> Self {
        Self {
            questions: FALLBACK_QUESTIONS
                .iter()
                .enumerate()
                .map(|(i, t)| Question::new(i + 1, *t))
                .collect(),
            builtin: true,
        }
    }

    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_texts_assigns_positions() {
        let set = QuestionSet::from_texts(["First?", "  ", "Second?"]).unwrap();
        let positions: Vec<_> = set.iter().map(|q| (q.position(), q.text())).collect();
        assert_eq!(positions, vec![(1, "First?"), (2, "Second?")]);
        assert!(!set.is_builtin());
    }

    #[test]
    fn test_from_texts_empty_is_none() {
        assert!(QuestionSet::from_texts(Vec::<String>::new()).is_none());
        assert!(QuestionSet::from_texts(["", "   "]).is_none());
    }

    #[test]
    fn test_fallback_has_five_questions() {
        let set = QuestionSet::fallback();
        assert_eq!(set.len(), 5);
        assert!(set.is_builtin());
        assert_eq!(set.iter().last().unwrap().position(), 5);
    }

    #[test]
    fn test_question_display() {
        assert_eq!(Question::new(3, "Why?").to_string(), "3. Why?");
    }
}
