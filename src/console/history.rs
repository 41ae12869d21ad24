use std::collections::VecDeque;

/// What `submit` does with a command that is already in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Drop the old entry and append the command as the most recent one.
    #[default]
    MoveToEnd,
    /// Leave the old entry where it is.
    KeepOriginal,
}

impl DuplicatePolicy {
    pub fn label(self) -> &'static str {
        match self {
            DuplicatePolicy::MoveToEnd => "move_to_end",
            DuplicatePolicy::KeepOriginal => "keep_original",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Older,
    Newer,
}

/// Submitted commands, oldest first, without duplicates.
///
/// `index` is the entry currently recalled into the editor; `None` means the
/// operator is editing a fresh line.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<String>,
    max_entries: usize,
    policy: DuplicatePolicy,
    index: Option<usize>,
}

impl HistoryBuffer {
    pub fn new(max_entries: usize, policy: DuplicatePolicy) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
            policy,
            index: None,
        }
    }

    pub fn with_seed<I, S>(seed: I, max_entries: usize, policy: DuplicatePolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut history = Self::new(max_entries, policy);
        for command in seed {
            history.submit(command.as_ref());
        }
        history
    }

    pub fn submit(&mut self, command: &str) {
        self.index = None;
        if command.is_empty() {
            return;
        }
        if let Some(existing) = self.entries.iter().position(|entry| entry == command) {
            match self.policy {
                DuplicatePolicy::KeepOriginal => return,
                DuplicatePolicy::MoveToEnd => {
                    self.entries.remove(existing);
                }
            }
        }
        self.entries.push_back(command.to_owned());
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Steps the recall cursor and returns the recalled command.
    ///
    /// `None` from `Newer` means the cursor walked past the most recent entry
    /// and the caller should restore whatever the operator was typing.
    /// `Older` stops at the oldest entry and keeps returning it.
    pub fn navigate(&mut self, direction: HistoryDirection) -> Option<String> {
        if self.entries.is_empty() {
            self.index = None;
            return None;
        }
        let newest = self.entries.len() - 1;
        self.index = match (direction, self.index) {
            (HistoryDirection::Older, None) => Some(newest),
            (HistoryDirection::Older, Some(idx)) => Some(idx.saturating_sub(1).min(newest)),
            (HistoryDirection::Newer, None) => None,
            (HistoryDirection::Newer, Some(idx)) if idx < newest => Some(idx + 1),
            (HistoryDirection::Newer, Some(_)) => None,
        };
        self.index.and_then(|idx| self.entries.get(idx).cloned())
    }

    pub fn reset_navigation(&mut self) {
        self.index = None;
    }

    pub fn is_navigating(&self) -> bool {
        self.index.is_some()
    }

    /// Recall position with `-1` meaning a fresh line.
    #[cfg(test)]
    pub(crate) fn history_index(&self) -> isize {
        self.index
            .and_then(|idx| isize::try_from(idx).ok())
            .unwrap_or(-1)
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }
}

#[cfg(test)]
#[path = "../tests/history_tests.rs"]
mod tests;
