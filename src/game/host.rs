//! The game server surface the bridge dispatches into.

/// Operations the game exposes to inbound Discord commands.
///
/// Both are called on the game thread from `Bridge::drain_inbound`.
pub trait GameHost {
    /// Queue a console command for execution (e.g. `AddCommandString`).
    fn execute_command(&mut self, command: &str);

    /// Print a line to every connected player's chat.
    fn broadcast_chat(&mut self, message: &str);
}

/// A host that records what it was asked to do.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingHost {
    pub commands: Vec<String>,
    pub broadcasts: Vec<String>,
}

impl GameHost for RecordingHost {
    fn execute_command(&mut self, command: &str) {
        self.commands.push(command.to_string());
    }

    fn broadcast_chat(&mut self, message: &str) {
        self.broadcasts.push(message.to_string());
    }
}
