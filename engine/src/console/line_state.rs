// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The live input line shared between the input loop (which edits it) and
//! [`super::writer::ConsoleWriter`] (which redraws it underneath
//! asynchronous output).

use smallvec::SmallVec;

/// Maximum number of submitted lines kept for Up/Down recall.
pub const HISTORY_SIZE_MAX: usize = 1_000;

/// Prompt + edit buffer + bounded history. Editing is end-of-line only:
/// chars append, Backspace/Ctrl+U/Ctrl+W delete backwards.
#[derive(Debug)]
pub struct LineState {
    pub prompt: String,
    buffer: String,
    /// Oldest first, newest last.
    history: SmallVec<[String; 16]>,
    /// `Some(i)` while the user is browsing history entry `i`.
    history_cursor: Option<usize>,
    /// The in-progress edit, stashed while browsing history.
    stash: String,
}

impl LineState {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            buffer: String::new(),
            history: SmallVec::new(),
            history_cursor: None,
            stash: String::new(),
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &str { &self.buffer }

    /// What the terminal line should show: prompt followed by the buffer.
    #[must_use]
    pub fn rendered(&self) -> String { format!("{}{}", self.prompt, self.buffer) }

    pub fn insert_char(&mut self, c: char) {
        self.history_cursor = None;
        self.buffer.push(c);
    }

    /// Returns `false` when the buffer was already empty.
    pub fn backspace(&mut self) -> bool {
        self.history_cursor = None;
        self.buffer.pop().is_some()
    }

    /// Ctrl+U: erase the whole line before the cursor.
    pub fn erase_line(&mut self) {
        self.history_cursor = None;
        self.buffer.clear();
    }

    /// Ctrl+W: erase back to the previous whitespace.
    pub fn erase_word(&mut self) {
        self.history_cursor = None;
        let trimmed_len = self.buffer.trim_end().len();
        self.buffer.truncate(trimmed_len);
        let cut = self
            .buffer
            .rfind(char::is_whitespace)
            .map_or(0, |at| at + 1);
        self.buffer.truncate(cut);
    }

    /// Enter: hand the line to the caller and add it to history.
    pub fn take_line(&mut self) -> String {
        self.history_cursor = None;
        let line = std::mem::take(&mut self.buffer);
        if !line.trim().is_empty() && self.history.last() != Some(&line) {
            if self.history.len() == HISTORY_SIZE_MAX {
                self.history.remove(0);
            }
            self.history.push(line.clone());
        }
        line
    }

    /// Up: recall the previous history entry (stashing the in-progress edit
    /// on first press).
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let next = match self.history_cursor {
            None => {
                self.stash = std::mem::take(&mut self.buffer);
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_cursor = Some(next);
        self.buffer = self.history[next].clone();
    }

    /// Down: move toward the present, restoring the stashed edit at the end.
    pub fn history_next(&mut self) {
        let Some(i) = self.history_cursor else { return };
        if i + 1 < self.history.len() {
            self.history_cursor = Some(i + 1);
            self.buffer = self.history[i + 1].clone();
        } else {
            self.history_cursor = None;
            self.buffer = std::mem::take(&mut self.stash);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn editing_appends_and_deletes_at_end() {
        let mut state = LineState::new("> ");
        for c in "View_Alarms".chars() {
            state.insert_char(c);
        }
        assert_eq!(state.rendered(), "> View_Alarms");

        assert!(state.backspace());
        assert_eq!(state.buffer(), "View_Alarm");

        state.erase_line();
        assert_eq!(state.buffer(), "");
        assert!(!state.backspace());
    }

    #[test]
    fn erase_word_cuts_back_to_whitespace() {
        let mut state = LineState::new("> ");
        for c in "Cancel_Alarm(1) extra  ".chars() {
            state.insert_char(c);
        }
        state.erase_word();
        assert_eq!(state.buffer(), "Cancel_Alarm(1) ");
        state.erase_word();
        assert_eq!(state.buffer(), "");
    }

    #[test]
    fn history_recall_round_trips_the_stash() {
        let mut state = LineState::new("> ");
        for c in "first".chars() {
            state.insert_char(c);
        }
        assert_eq!(state.take_line(), "first");
        for c in "second".chars() {
            state.insert_char(c);
        }
        assert_eq!(state.take_line(), "second");

        for c in "draft".chars() {
            state.insert_char(c);
        }
        state.history_prev();
        assert_eq!(state.buffer(), "second");
        state.history_prev();
        assert_eq!(state.buffer(), "first");
        state.history_prev();
        assert_eq!(state.buffer(), "first");

        state.history_next();
        assert_eq!(state.buffer(), "second");
        state.history_next();
        assert_eq!(state.buffer(), "draft");
    }

    #[test]
    fn blank_and_duplicate_lines_stay_out_of_history() {
        let mut state = LineState::new("> ");
        assert_eq!(state.take_line(), "");
        for c in "cmd".chars() {
            state.insert_char(c);
        }
        state.take_line();
        for c in "cmd".chars() {
            state.insert_char(c);
        }
        state.take_line();

        state.history_prev();
        assert_eq!(state.buffer(), "cmd");
        state.history_prev();
        assert_eq!(state.buffer(), "cmd");
    }
}
