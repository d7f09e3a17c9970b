//! Template registry: loads every return template from embedded TOML.
//!
//! Each `.toml` file in `packages/parse/templates/` is baked into the
//! binary at compile time via [`include_str!`]. Supporting a new form
//! version means adding a TOML file and listing it below.

use crate::template::{CompiledTemplate, TemplateError, parse_template_toml};

/// TOML templates embedded at compile time.
const TEMPLATE_TOMLS: &[(&str, &str)] = &[
    ("gstr3b_2024", include_str!("../templates/gstr3b_2024.toml")),
    ("gstr3b_2025", include_str!("../templates/gstr3b_2025.toml")),
    ("gstr1", include_str!("../templates/gstr1.toml")),
];

/// Every embedded template, compiled.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<CompiledTemplate>,
}

impl TemplateRegistry {
    /// Parses and compiles every embedded template.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to parse or compile, or if its
    /// `id` does not match the name it is registered under.
    pub fn load() -> Result<Self, TemplateError> {
        let templates = TEMPLATE_TOMLS
            .iter()
            .map(|(name, toml)| {
                let template = parse_template_toml(name, toml)?;
                if template.id != *name {
                    return Err(TemplateError::Invalid {
                        template: (*name).to_owned(),
                        message: format!("id {:?} does not match file name", template.id),
                    });
                }
                template.compile()
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Loaded {} return templates", templates.len());

        Ok(Self { templates })
    }

    /// Looks up a template by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unknown`] if no template has that id.
    pub fn get(&self, id: &str) -> Result<&CompiledTemplate, TemplateError> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| TemplateError::Unknown(id.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledTemplate> {
        self.templates.iter()
    }

    /// Template identifiers in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.id.as_str()).collect()
    }
}
