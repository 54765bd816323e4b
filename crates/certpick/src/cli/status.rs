use std::fmt::Display;

/// Prints startup progress to stderr when the host asked for it.
#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    enabled: bool,
}

impl StatusReporter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn report(&self, message: impl Display) {
        if self.enabled {
            eprintln!("{message}");
        }
    }
}
