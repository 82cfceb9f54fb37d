/// Segmentation state for the pipeline being composed.
///
/// The full command line is only ever materialized as two strings: the
/// committed prefix (stages already fixed, each ending in its `|`
/// separator) and the editable tail. `committed + tail` reconstructs the
/// exact text the user intends, so `set_from_text` round-trips every input.
///
/// Pure state; the supervisor drives all transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    committed: String,
    tail: String,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the state from a full command line, splitting at the last `|`.
    pub fn from_text(text: &str) -> Self {
        let mut state = Self::new();
        state.set_from_text(text);
        state
    }

    /// Split `text` at its last `|`: everything up to and including that
    /// separator becomes the committed prefix, the rest the tail. Without
    /// a `|` the whole text is the tail.
    ///
    /// Used at startup seeding and on retract.
    pub fn set_from_text(&mut self, text: &str) {
        match text.rfind('|') {
            Some(idx) => {
                self.committed = text[..=idx].to_string();
                self.tail = text[idx + 1..].to_string();
            }
            None => {
                self.committed = String::new();
                self.tail = text.to_string();
            }
        }
    }

    /// Fix the current tail as a completed stage and start a new empty one.
    pub fn commit(&mut self) {
        self.committed.push_str(&self.tail);
        self.committed.push('|');
        self.tail.clear();
    }

    /// Undo the most recent commit, moving the last committed stage back
    /// into the tail. Only meaningful while the tail is empty; returns
    /// `false` when there is nothing to retract (or the tail is non-empty).
    pub fn retract(&mut self) -> bool {
        if !self.tail.is_empty() || self.committed.is_empty() {
            return false;
        }
        // The committed prefix always ends in its separator; dropping it
        // and re-splitting moves exactly the last stage into the tail.
        let stripped: String = self.committed[..self.committed.len() - 1].to_string();
        self.set_from_text(&stripped);
        true
    }

    /// Replace the tail text (a keystroke-level edit).
    pub fn set_tail(&mut self, text: &str) {
        self.tail = text.to_string();
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    pub fn tail(&self) -> &str {
        &self.tail
    }

    pub fn has_committed(&self) -> bool {
        !self.committed.is_empty()
    }

    /// The full command line as typed: committed prefix + tail.
    pub fn full_text(&self) -> String {
        let mut text = self.committed.clone();
        text.push_str(&self.tail);
        text
    }

    /// The committed prefix as a runnable command (trailing separator
    /// stripped): what the stdin-preview stage executes.
    pub fn committed_command(&self) -> &str {
        self.committed
            .strip_suffix('|')
            .unwrap_or(&self.committed)
    }

    /// The command the stdout-preview stage executes: the full text, with
    /// a dangling separator stripped while the tail is still empty so the
    /// shell is never handed a syntax error the user did not type.
    pub fn preview_command(&self) -> String {
        if self.tail.is_empty() {
            self.committed_command().to_string()
        } else {
            self.full_text()
        }
    }

    /// Prompt label shown before the editable field.
    pub fn prompt_label(&self, symbol: &str) -> String {
        format!("{symbol}{}", self.committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(text: &str) -> PipelineState {
        PipelineState::from_text(text)
    }

    #[test]
    fn test_set_from_text_splits_at_last_pipe() {
        let s = state("cat log|grep err|wc -l");
        assert_eq!(s.committed(), "cat log|grep err|");
        assert_eq!(s.tail(), "wc -l");
    }

    #[test]
    fn test_set_from_text_without_pipe() {
        let s = state("cat log");
        assert_eq!(s.committed(), "");
        assert_eq!(s.tail(), "cat log");
    }

    #[test]
    fn test_set_from_text_empty() {
        let s = state("");
        assert!(!s.has_committed());
        assert_eq!(s.tail(), "");
    }

    #[test]
    fn test_round_trip_reconstruction() {
        for text in [
            "",
            "cat log",
            "cat log|grep err",
            "cat log|grep err|wc -l",
            "a|",
            "|b",
            "a||b",
            "  spaced | out ",
        ] {
            assert_eq!(state(text).full_text(), text, "round-trip of {text:?}");
        }
    }

    #[test]
    fn test_commit_moves_tail_into_committed() {
        let mut s = state("cat log");
        s.commit();
        assert_eq!(s.committed(), "cat log|");
        assert_eq!(s.tail(), "");
        assert_eq!(s.full_text(), "cat log|");
    }

    #[test]
    fn test_commit_joins_without_leading_separator() {
        let mut s = PipelineState::new();
        s.set_tail("first");
        s.commit();
        s.set_tail("second");
        s.commit();
        assert_eq!(s.committed(), "first|second|");
    }

    #[test]
    fn test_commit_then_retract_restores_tail() {
        let mut s = state("cat log|grep err");
        let before = s.clone();
        s.commit();
        assert!(s.retract());
        assert_eq!(s, before);
    }

    #[test]
    fn test_commit_then_retract_with_empty_tail_is_noop() {
        let mut s = state("cat log|");
        assert_eq!(s.tail(), "");
        let before = s.clone();
        s.commit();
        assert!(s.retract());
        assert_eq!(s, before);
    }

    #[test]
    fn test_retract_on_empty_state_is_rejected() {
        let mut s = PipelineState::new();
        assert!(!s.retract());
    }

    #[test]
    fn test_retract_with_nonempty_tail_is_rejected() {
        let mut s = state("cat log|grep err");
        assert!(!s.retract());
        assert_eq!(s.tail(), "grep err");
    }

    #[test]
    fn test_retract_removes_exactly_one_stage() {
        let mut s = state("a|b|c|");
        assert!(s.retract());
        assert_eq!(s.committed(), "a|b|");
        assert_eq!(s.tail(), "c");
        s.set_tail("");
        assert!(s.retract());
        assert_eq!(s.committed(), "a|");
        assert_eq!(s.tail(), "b");
    }

    #[test]
    fn test_committed_command_strips_separator() {
        let s = state("cat log|grep err|wc");
        assert_eq!(s.committed_command(), "cat log|grep err");
    }

    #[test]
    fn test_preview_command_with_tail_is_full_text() {
        let s = state("cat log|grep err");
        assert_eq!(s.preview_command(), "cat log|grep err");
    }

    #[test]
    fn test_preview_command_with_empty_tail_drops_dangling_pipe() {
        let s = state("cat log|");
        assert_eq!(s.preview_command(), "cat log");
    }

    #[test]
    fn test_prompt_label() {
        assert_eq!(state("cat log|grep").prompt_label("| "), "| cat log|");
        assert_eq!(state("cat log").prompt_label("> "), "> ");
    }
}
