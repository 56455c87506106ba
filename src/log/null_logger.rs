//! Without the `logging` feature no logger is installed; only the `log` crate's level is kept
//! in step with the configuration so disabled macros stay cheap.
use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(super) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
