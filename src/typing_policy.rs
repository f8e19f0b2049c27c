/// Raw byte the terminal sends for the backspace key.
pub const BACKSPACE: char = '\x7f';

/// Decides when a typed buffer counts as a finished attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum CompletionPolicy {
    /// typed must equal the target exactly, case and punctuation included
    #[default]
    Exact,
    /// any buffer as long as the target finishes the attempt
    IgnoreErrors,
}

impl CompletionPolicy {
    pub fn from_ignore_errors(ignore_errors: bool) -> Self {
        if ignore_errors {
            CompletionPolicy::IgnoreErrors
        } else {
            CompletionPolicy::Exact
        }
    }

    pub fn is_satisfied(self, target: &[char], typed: &[char]) -> bool {
        match self {
            CompletionPolicy::Exact => typed == target,
            CompletionPolicy::IgnoreErrors => typed.len() == target.len(),
        }
    }
}

/// Apply one keystroke to the typed buffer.
///
/// Backspace drops the last character and is a no-op on an empty buffer;
/// every other character is appended, overtype included.
pub fn apply_keystroke(typed: &mut Vec<char>, c: char) {
    if c == BACKSPACE {
        typed.pop();
    } else {
        typed.push(c);
    }
}
