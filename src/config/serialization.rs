//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;
use crate::stack::EnhancerSpec;
use serde::Serialize;

/// TOML string literal for `value`, escaped as needed
fn quoted(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

#[derive(Serialize)]
struct StackSection<'a> {
    stack: &'a [EnhancerSpec],
}

impl Config {
    /// Render the config as a commented TOML file
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        let mut output = format!(
            r#"# enhancer configuration
#
# Precedence: environment > this file > defaults
#   ENHANCER_CONFIG     alternative location of this file
#   ENHANCER_LOG_LEVEL  overrides [logging] level
#   RUST_LOG            overrides the log filter entirely

[logging]
level = {level}                  # trace, debug, info, warn, error
file_enabled = {file_enabled}
file_dir = {file_dir}
file_rotation = "{rotation}"     # hourly, daily, never
file_prefix = {prefix}
"#,
            level = quoted(&self.logging.level),
            file_enabled = self.logging.file_enabled,
            file_dir = quoted(&self.logging.file_dir.display().to_string()),
            rotation = self.logging.file_rotation.as_str(),
            prefix = quoted(&self.logging.file_prefix),
        );

        output.push_str(&self.stack_to_toml()?);
        Ok(output)
    }

    fn stack_to_toml(&self) -> Result<String, toml::ser::Error> {
        if self.stack.is_empty() {
            // Show example entries when no stack is configured
            return Ok(r#"
# Enhancer stack, outermost first
#
# [[stack]]
# kind = "only-update-for-keys"
# keys = ["id"]
#
# [[stack]]
# kind = "with-data"
# selector = "user"     # registered by the application
# prop = "user"         # default: "data"
#
# [[stack]]
# kind = "omit-props"
# keys = ["internal"]
"#
            .to_string());
        }

        let body = toml::to_string(&StackSection { stack: &self.stack })?;
        Ok(format!("\n# Enhancer stack, outermost first\n{}", body))
    }
}
