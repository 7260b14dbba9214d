//! The narrow capability surface a plugin host builds on. Plugin discovery,
//! loading and lifecycle belong to the host; the engine only defines the
//! contract through which registered commands touch a buffer.

use std::collections::HashMap;

use tracing::info;

use crate::buffer::TextBuffer;
use crate::error::Result;

/// Capabilities handed to a command when it runs. Implemented by the host;
/// the engine never renders or persists anything itself.
pub trait HostContext {
    /// Surfaces a user-visible message (status line, toast, dialog).
    fn show_notification(&self, message: &str);

    /// Diagnostic logging; routed into the tracing pipeline by default.
    fn log_message(&self, message: &str) {
        info!(target: "aquaedit::host", "{message}");
    }
}

/// A registered command body: full access to the buffer it was invoked on,
/// plus the host capabilities.
pub type CommandAction = Box<dyn FnMut(&mut TextBuffer, &dyn HostContext) -> Result<()>>;

/// Name-keyed command table. Registering an existing name replaces the
/// previous action, which lets a reloaded plugin rebind its commands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandAction>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(&mut self, name: impl Into<String>, action: CommandAction) {
        self.commands.insert(name.into(), action);
    }

    pub fn unregister_command(&mut self, name: &str) {
        self.commands.remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered command names in unspecified order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Runs the command `name` against `buffer`. Returns `Ok(false)` when no
    /// such command is registered; command failures propagate.
    pub fn run(
        &mut self,
        name: &str,
        buffer: &mut TextBuffer,
        ctx: &dyn HostContext,
    ) -> Result<bool> {
        match self.commands.get_mut(name) {
            Some(action) => {
                action(buffer, ctx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
