//! Example cog to copy when writing a new one. Excluded in the default config.

use crate::application::context::Context;
use crate::application::errors::{CommandError, ExtensionError};
use crate::domain::entities::Command;
use crate::plugins::{Cog, CogRegistry};
use async_trait::async_trait;

pub fn setup(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
    registry.add_cog(Example)
}

pub struct Example;

#[async_trait]
impl Cog for Example {
    fn name(&self) -> &str {
        "example"
    }

    fn description(&self) -> &str {
        "Example cog"
    }

    fn emoji(&self) -> Option<&str> {
        Some("🥺")
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("example").with_description("Example command")]
    }

    async fn invoke(&self, name: &str, ctx: &mut Context) -> Result<(), CommandError> {
        match name {
            "example" => {
                ctx.send("Hello world!").await?;
                Ok(())
            }
            _ => Err(CommandError::NotFound(name.to_string())),
        }
    }
}
