//! User-facing message levels

use std::fmt;

/// Seven-step message ladder, most verbose first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    VerboseDebug = 0,
    Debug = 1,
    Info = 2,
    Notify = 3,
    Warning = 4,
    Error = 5,
    Fatal = 6,
}

impl Level {
    /// Threshold for `-v`/`-q` counts: notify, one step per flag, clamped.
    pub fn from_counts(verbose: u8, quiet: u8) -> Self {
        let level = Self::Notify as i16 - i16::from(verbose) + i16::from(quiet);
        match level {
            i16::MIN..=0 => Self::VerboseDebug,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Notify,
            4 => Self::Warning,
            5 => Self::Error,
            _ => Self::Fatal,
        }
    }

    /// Whether a message at `self` passes the `threshold`.
    pub fn shown_at(self, threshold: Level) -> bool {
        self >= threshold
    }

    pub fn to_stderr(self) -> bool {
        self >= Self::Warning
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::Notify
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VerboseDebug => "verbose-debug",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Notify => "notify",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, Level::Notify)]
    #[case(1, 0, Level::Info)]
    #[case(2, 0, Level::Debug)]
    #[case(3, 0, Level::VerboseDebug)]
    #[case(9, 0, Level::VerboseDebug)]
    #[case(0, 1, Level::Warning)]
    #[case(0, 3, Level::Fatal)]
    #[case(0, 7, Level::Fatal)]
    #[case(2, 1, Level::Info)]
    fn given_flag_counts_when_computing_level_then_clamped(
        #[case] verbose: u8,
        #[case] quiet: u8,
        #[case] expected: Level,
    ) {
        assert_eq!(Level::from_counts(verbose, quiet), expected);
    }

    #[test]
    fn given_notify_threshold_when_filtering_then_info_hidden() {
        assert!(!Level::Info.shown_at(Level::Notify));
        assert!(Level::Notify.shown_at(Level::Notify));
        assert!(Level::Fatal.shown_at(Level::Notify));
    }
}
