//! Constructors and formatting for [`Address`].

use super::super::Address;
use std::fmt;

impl Address {
    /// Create a new [`Address`] for the given process and mailbox.
    pub fn new(pid: u32, mailbox: impl ToString) -> Self {
        Address {
            pid,
            mailbox: mailbox.to_string(),
        }
    }
}

impl fmt::Display for Address {
    /// Formats as ``mailbox@pid``.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.mailbox, self.pid)
    }
}
