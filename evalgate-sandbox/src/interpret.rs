//! Mapping of raw sandbox telemetry to a human-facing status

use crate::types::{ExecutionResult, InterpretedStatus, StatusKind};

/// Return code reported when the sandbox kills a program (128 + SIGKILL)
const KILLED: i32 = 128 + 9;

/// Return code reported when the sandbox itself fails
const FATAL: i32 = 255;

/// Offset the sandbox adds to a terminating signal number
const SIGNAL_OFFSET: i32 = 128;

const LINUX_SIGNALS: &[(i32, &str)] = &[
    (1, "SIGHUP"),
    (2, "SIGINT"),
    (3, "SIGQUIT"),
    (4, "SIGILL"),
    (5, "SIGTRAP"),
    (6, "SIGABRT"),
    (7, "SIGBUS"),
    (8, "SIGFPE"),
    (9, "SIGKILL"),
    (10, "SIGUSR1"),
    (11, "SIGSEGV"),
    (12, "SIGUSR2"),
    (13, "SIGPIPE"),
    (14, "SIGALRM"),
    (15, "SIGTERM"),
    (16, "SIGSTKFLT"),
    (17, "SIGCHLD"),
    (18, "SIGCONT"),
    (19, "SIGSTOP"),
    (20, "SIGTSTP"),
    (21, "SIGTTIN"),
    (22, "SIGTTOU"),
    (23, "SIGURG"),
    (24, "SIGXCPU"),
    (25, "SIGXFSZ"),
    (26, "SIGVTALRM"),
    (27, "SIGPROF"),
    (28, "SIGWINCH"),
    (29, "SIGIO"),
    (30, "SIGPWR"),
    (31, "SIGSYS"),
    (34, "SIGRTMIN"),
    (64, "SIGRTMAX"),
];

/// Immutable signal-number to name lookup
#[derive(Debug, Clone, Copy)]
pub struct SignalTable {
    entries: &'static [(i32, &'static str)],
}

impl SignalTable {
    /// Signal numbering used by the Linux sandbox
    pub const fn linux() -> Self {
        Self {
            entries: LINUX_SIGNALS,
        }
    }

    pub const fn from_entries(entries: &'static [(i32, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn name(&self, number: i32) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(n, _)| *n == number)
            .map(|(_, name)| *name)
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::linux()
    }
}

/// Turns `(stdout, returncode)` into a headline and optional detail
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultInterpreter {
    signals: SignalTable,
}

impl ResultInterpreter {
    pub fn new(signals: SignalTable) -> Self {
        Self { signals }
    }

    pub fn interpret(&self, result: &ExecutionResult) -> InterpretedStatus {
        match result.returncode {
            None => InterpretedStatus {
                kind: StatusKind::Fault,
                headline: "evaluation failed".to_string(),
                detail: Some(result.stdout.trim().to_string()),
            },
            Some(KILLED) => InterpretedStatus {
                kind: StatusKind::TimedOut,
                headline: "timed out or exceeded memory".to_string(),
                detail: None,
            },
            Some(FATAL) => InterpretedStatus {
                kind: StatusKind::Fault,
                headline: "evaluation failed".to_string(),
                detail: Some("fatal sandbox error".to_string()),
            },
            Some(code) => {
                let signal = code
                    .checked_sub(SIGNAL_OFFSET)
                    .and_then(|number| self.signals.name(number));
                let headline = match signal {
                    Some(name) => format!("completed with code {} ({})", code, name),
                    None => format!("completed with code {}", code),
                };
                InterpretedStatus {
                    kind: StatusKind::Completed {
                        returncode: code,
                        signal,
                    },
                    headline,
                    detail: None,
                }
            }
        }
    }
}
