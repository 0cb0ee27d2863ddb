//! # Configuration State
//!
//! Read-only after startup, so no lock.

use std::ops::Deref;
use std::sync::Arc;

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct ConfigState {
    config: Arc<AppConfig>,
}

impl ConfigState {
    pub fn new(config: AppConfig) -> Self {
        ConfigState {
            config: Arc::new(config),
        }
    }
}

impl Deref for ConfigState {
    type Target = AppConfig;

    fn deref(&self) -> &AppConfig {
        &self.config
    }
}
