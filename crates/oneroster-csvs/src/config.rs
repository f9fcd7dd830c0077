use serde::{Deserialize, Serialize};

/// Opt-in row rules for the decoder.
///
/// The defaults only apply what the OneRoster CSV binding itself requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Reject academic sessions whose `startDate` is after their `endDate`.
    pub enforce_session_date_order: bool,

    /// Reject enrollments flagged `primary=true` whose role is not `teacher`.
    pub teacher_only_primary: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            enforce_session_date_order: false,
            teacher_only_primary: false,
        }
    }
}

impl DecodeOptions {
    /// Every optional rule enabled.
    pub fn strict() -> Self {
        Self {
            enforce_session_date_order: true,
            teacher_only_primary: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = DecodeOptions::default();
        assert!(!options.enforce_session_date_order);
        assert!(!options.teacher_only_primary);

        let strict = DecodeOptions::strict();
        assert!(strict.enforce_session_date_order);
        assert!(strict.teacher_only_primary);
    }
}
