//! Named commands that `on_click` / `on_change` refer to.

use std::collections::HashMap;
use std::rc::Rc;

use strata_core::StringId;

use crate::tree::{NodeId, SceneTree};

pub type CommandFn = Rc<dyn Fn(&SceneTree, NodeId)>;

struct Command {
    name: Rc<str>,
    callback: CommandFn,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<StringId, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, callback: impl Fn(&SceneTree, NodeId) + 'static) {
        let id = StringId::new(name);
        let cmd = Command {
            name: name.into(),
            callback: Rc::new(callback),
        };
        match self.commands.insert(id, cmd) {
            Some(_) => log::debug!("CommandRegistry: replaced '{}'", name),
            None => log::debug!("CommandRegistry: registered '{}' ({:?})", name, id),
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.commands.remove(&StringId::new(name)).is_some()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&StringId::new(name))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Runs the command named `name` against `target`. Unknown names are
    /// ignored; returns whether a command ran.
    pub fn execute(&self, name: &str, tree: &SceneTree, target: NodeId) -> bool {
        if name.is_empty() {
            return false;
        }
        self.execute_id(StringId::new(name), tree, target)
    }

    pub fn execute_id(&self, id: StringId, tree: &SceneTree, target: NodeId) -> bool {
        let Some(cmd) = self.commands.get(&id) else {
            log::trace!("CommandRegistry: no command for {:?}", id);
            return false;
        };
        log::trace!("CommandRegistry: executing '{}'", cmd.name);
        let callback = cmd.callback.clone();
        callback(tree, target);
        true
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.commands.values().map(|c| &*c.name).collect();
        names.sort_unstable();
        f.debug_struct("CommandRegistry")
            .field("commands", &names)
            .finish()
    }
}
