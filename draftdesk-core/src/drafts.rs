use im::OrdMap;

use crate::SectionId;

/// Unsent local text for one section.
///
/// Records are immutable; every edit produces a new record so a copy of the
/// store taken before an edit keeps seeing the old values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDraft {
    refinement: String,
    comment: String,
}

impl SectionDraft {
    /// The pending refinement instruction, empty if none.
    pub fn refinement(&self) -> &str {
        &self.refinement
    }

    /// The pending feedback comment, empty if none.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn with_refinement(&self, text: impl Into<String>) -> Self {
        Self {
            refinement: text.into(),
            comment: self.comment.clone(),
        }
    }

    pub fn with_comment(&self, text: impl Into<String>) -> Self {
        Self {
            refinement: self.refinement.clone(),
            comment: text.into(),
        }
    }

    pub fn without_comment(&self) -> Self {
        self.with_comment(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.refinement.is_empty() && self.comment.is_empty()
    }
}

/// Draft buffers for every section of one editing session.
///
/// Keyed by section id, two purposes per key (refinement instruction and
/// feedback comment). Nothing in here is ever sent implicitly; the dispatchers
/// read an entry at submit time. Backed by a persistent map, so cloning is
/// O(1) and clones are isolated from later writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftStore {
    entries: OrdMap<SectionId, SectionDraft>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full draft record for a section, if it has any text.
    pub fn get(&self, id: SectionId) -> Option<&SectionDraft> {
        self.entries.get(&id)
    }

    /// Current refinement text, empty if none.
    pub fn refinement(&self, id: SectionId) -> &str {
        self.get(id).map(SectionDraft::refinement).unwrap_or("")
    }

    /// Current comment text, empty if none.
    pub fn comment(&self, id: SectionId) -> &str {
        self.get(id).map(SectionDraft::comment).unwrap_or("")
    }

    /// The instruction to submit, or `None` if it is empty or whitespace-only.
    pub fn pending_refinement(&self, id: SectionId) -> Option<String> {
        let text = self.refinement(id);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    /// The comment to attach to feedback, or `None` if it is empty.
    /// Whitespace is sent as typed.
    pub fn pending_comment(&self, id: SectionId) -> Option<String> {
        let text = self.comment(id);
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }

    pub fn set_refinement(&mut self, id: SectionId, text: impl Into<String>) {
        let next = self.current(id).with_refinement(text);
        self.store(id, next);
    }

    pub fn set_comment(&mut self, id: SectionId, text: impl Into<String>) {
        let next = self.current(id).with_comment(text);
        self.store(id, next);
    }

    pub fn clear_comment(&mut self, id: SectionId) {
        let next = self.current(id).without_comment();
        self.store(id, next);
    }

    /// Clear the comment only if it still reads `expected`.
    ///
    /// Returns whether the entry was cleared. Text typed after `expected` was
    /// captured is left alone.
    pub fn clear_comment_if(&mut self, id: SectionId, expected: &str) -> bool {
        if self.comment(id) != expected {
            return false;
        }
        self.clear_comment(id);
        true
    }

    /// Number of sections holding any draft text.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries = OrdMap::new();
    }

    /// Sections with draft text, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &SectionDraft)> + '_ {
        self.entries.iter().map(|(id, draft)| (*id, draft))
    }

    fn current(&self, id: SectionId) -> SectionDraft {
        self.get(id).cloned().unwrap_or_default()
    }

    fn store(&mut self, id: SectionId, draft: SectionDraft) {
        if draft.is_empty() {
            self.entries.remove(&id);
        } else {
            self.entries.insert(id, draft);
        }
    }
}
