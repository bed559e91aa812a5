use crate::commands::Commands;
use stash_cache::{ArtifactCacheFactory, CacheHandle};
use stash_config::CacheSettings;
use stash_core::{CommandEvent, EventBus};

/// Everything a command needs for one run
pub struct RunContext<'a> {
    factory: &'a ArtifactCacheFactory,
    settings: &'a CacheSettings,
}

impl<'a> RunContext<'a> {
    pub fn new(factory: &'a ArtifactCacheFactory, settings: &'a CacheSettings) -> Self {
        Self { factory, settings }
    }

    /// A fresh cache handle for this command
    pub fn cache(&self) -> eyre::Result<CacheHandle> {
        Ok(self.factory.get_or_create(self.settings)?)
    }

    pub fn events(&self) -> &EventBus {
        self.factory.events()
    }
}

impl Commands {
    pub fn execute(self, ctx: &RunContext<'_>) -> eyre::Result<()> {
        let command = self.name().to_string();
        let events = ctx.events();
        events.new_correlation_id();
        events.publish(CommandEvent::CommandStarted {
            command: command.clone(),
        });

        let result = match self {
            Commands::Fetch { key, output } => crate::commands::cache::fetch(ctx, &key, &output),
            Commands::Store { key, file } => crate::commands::cache::store(ctx, &key, &file),
            Commands::Key { file } => crate::commands::key::execute(&file),
        };

        events.publish(CommandEvent::CommandFinished {
            command,
            success: result.is_ok(),
        });
        events.clear_correlation_context();
        result
    }
}
