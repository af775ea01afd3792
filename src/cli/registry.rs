use std::collections::HashMap;

use crate::errors::Result;

pub type CommandHandler = fn(&CommandRegistry, &[&str]) -> Result<()>;

pub struct CommandEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
        }
    }
}

/// Commands in registration order, looked up by name.
pub struct CommandRegistry {
    commands: HashMap<&'static str, CommandEntry>,
    order: Vec<&'static str>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn register(&mut self, entry: CommandEntry) {
        let name = entry.name;
        if self.commands.insert(name, entry).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    pub fn list(&self) -> Vec<&CommandEntry> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .collect()
    }

    pub fn handler(&self, name: &str) -> Option<CommandHandler> {
        self.commands.get(name).map(|entry| entry.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &CommandRegistry, _: &[&str]) -> Result<()> {
        Ok(())
    }

    #[test]
    fn keeps_first_registration_order() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandEntry::new("b", "", "", noop));
        registry.register(CommandEntry::new("a", "", "", noop));
        registry.register(CommandEntry::new("b", "again", "", noop));
        let names: Vec<_> = registry.list().iter().map(|e| e.name).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(registry.get("b").map(|e| e.description), Some("again"));
        assert!(registry.handler("zzz").is_none());
    }
}
