//! Parsed `{{ … }}` templates.

use handlebars::Handlebars;
use serde::Serialize;

use capsule_core::TemplateKind;

use crate::error::{TemplateError, TemplateResult};

/// A parsed template of one kind.
///
/// Output is plain text: nothing is HTML escaped and unknown fields render
/// as empty strings.
pub struct ConfigTemplate {
    kind: TemplateKind,
    registry: Handlebars<'static>,
}

impl ConfigTemplate {
    pub fn parse(kind: TemplateKind, source: &str) -> TemplateResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(kind.as_str(), source)
            .map_err(|e| TemplateError::TemplateParse {
                kind,
                reason: e.to_string(),
            })?;
        Ok(Self { kind, registry })
    }

    /// Render against `context`. Errors are returned as text so the caller
    /// can attach the node set it was rendering.
    pub fn render<T: Serialize>(&self, context: &T) -> Result<Vec<u8>, String> {
        self.registry
            .render(self.kind.as_str(), context)
            .map(String::into_bytes)
            .map_err(|e| e.to_string())
    }
}
