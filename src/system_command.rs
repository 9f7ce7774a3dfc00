use std::any::Any;
use std::sync::Mutex;

use log::{error, info};

/// Opens a document outside the reader; the fallback when in-app loading fails.
pub trait SystemCommandExecutor: Send {
    fn open_external(&self, location: &str) -> Result<(), String>;

    fn as_any(&self) -> &dyn Any;
}

pub struct RealSystemCommandExecutor;

impl SystemCommandExecutor for RealSystemCommandExecutor {
    fn open_external(&self, location: &str) -> Result<(), String> {
        info!("Opening {location} in the system viewer");
        open::that_detached(location).map_err(|e| {
            error!("Failed to open {location}: {e}");
            e.to_string()
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Records requests instead of launching anything.
#[derive(Default)]
pub struct MockSystemCommandExecutor {
    executed: Mutex<Vec<String>>,
    fail: bool,
}

impl MockSystemCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn get_executed_commands(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|cmds| cmds.clone())
            .unwrap_or_default()
    }
}

impl SystemCommandExecutor for MockSystemCommandExecutor {
    fn open_external(&self, location: &str) -> Result<(), String> {
        if let Ok(mut cmds) = self.executed.lock() {
            cmds.push(location.to_string());
        }
        if self.fail {
            Err("no viewer available".to_string())
        } else {
            Ok(())
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
