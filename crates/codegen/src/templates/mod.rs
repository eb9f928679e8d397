//! Template system for binding generation
//!
//! The file frame (header and runtime imports) is a Handlebars template; the
//! body is produced by the document printer and spliced in unescaped.

use ethbind_common::{Error, Result};
use handlebars::Handlebars;

/// Name of the template framing a generated binding file
pub const BINDING_TEMPLATE: &str = "binding";

/// Template manager for binding generation
pub struct TemplateManager {
    handlebars: Handlebars<'static>,
}

impl TemplateManager {
    /// Create a new template manager and register all templates
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        Self::register_templates(&mut handlebars)?;

        Ok(Self { handlebars })
    }

    /// Register all built-in templates
    fn register_templates(handlebars: &mut Handlebars) -> Result<()> {
        handlebars
            .register_template_string(BINDING_TEMPLATE, include_str!("binding.hbs"))
            .map_err(|e| Error::codegen(format!("Failed to register binding template: {}", e)))?;

        Ok(())
    }

    /// Render a template with the given data
    pub fn render(&self, template_name: &str, data: &serde_json::Value) -> Result<String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| Error::codegen(format!("Failed to render template {}: {}", template_name, e)))
    }

    /// Get list of available templates
    pub fn available_templates(&self) -> Vec<String> {
        self.handlebars.get_templates().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binding_frame_renders_unescaped_body() {
        let manager = TemplateManager::new().unwrap();
        let rendered = manager
            .render(
                BINDING_TEMPLATE,
                &json!({
                    "contract_name": "Token",
                    "runtime": "ethbind_runtime",
                    "body": "pub const ABI: &str = r#\"[]\"#;\n",
                }),
            )
            .unwrap();

        assert!(rendered.starts_with("//! Bindings for the `Token` contract"));
        assert!(rendered.contains("use ethbind_runtime::{"));
        assert!(rendered.contains("r#\"[]\"#"));
    }

    #[test]
    fn test_missing_field_fails_in_strict_mode() {
        let manager = TemplateManager::new().unwrap();
        let err = manager
            .render(BINDING_TEMPLATE, &json!({"contract_name": "Token"}))
            .unwrap_err();
        assert!(matches!(err, Error::Codegen(_)));
        assert_eq!(manager.available_templates(), vec!["binding".to_string()]);
    }
}
