//! Stands in for the logger when the `logging` feature is off.

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// No logger is installed; only the `log` crate's maximum level is kept in sync.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
