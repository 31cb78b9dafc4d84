// SPDX-License-Identifier: MIT OR Apache-2.0
//! Template rendering seam.
//!
//! Page templates are opaque fixtures compiled into the binary; this module
//! only wires them into a minijinja environment and renders contexts built
//! by the exporters.

use minijinja::Environment;
use serde::Serialize;

use crate::ExporterError;

/// Template names registered in the environment.
pub const ITEM_TEMPLATE: &str = "_views/item.html.j2";
pub const NOT_FOUND_TEMPLATE: &str = "404.html.j2";
pub const FORMATTING_TEMPLATE: &str = "formatting.html.j2";
pub const LEGAL_TEMPLATES: &[&str] = &[
    "legal/accessibility.html.j2",
    "legal/cookies.html.j2",
    "legal/copyright.html.j2",
    "legal/privacy.html.j2",
];

/// Shared, immutable template environment.
#[derive(Clone)]
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        let add = |env: &mut Environment<'static>, name: &'static str, source: &'static str| {
            // Fixtures are static and known-good; registration cannot fail.
            let _ = env.add_template(name, source);
        };
        add(
            &mut env,
            ITEM_TEMPLATE,
            include_str!("../templates/_views/item.html.j2"),
        );
        add(
            &mut env,
            NOT_FOUND_TEMPLATE,
            include_str!("../templates/404.html.j2"),
        );
        add(
            &mut env,
            FORMATTING_TEMPLATE,
            include_str!("../templates/formatting.html.j2"),
        );
        add(
            &mut env,
            "legal/accessibility.html.j2",
            include_str!("../templates/legal/accessibility.html.j2"),
        );
        add(
            &mut env,
            "legal/cookies.html.j2",
            include_str!("../templates/legal/cookies.html.j2"),
        );
        add(
            &mut env,
            "legal/copyright.html.j2",
            include_str!("../templates/legal/copyright.html.j2"),
        );
        add(
            &mut env,
            "legal/privacy.html.j2",
            include_str!("../templates/legal/privacy.html.j2"),
        );
        Self { env }
    }

    /// Render a named template with the given context.
    pub fn render<C: Serialize>(&self, name: &str, context: C) -> Result<String, ExporterError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn legal_templates_render_with_meta() {
        let engine = TemplateEngine::new();
        for name in LEGAL_TEMPLATES {
            let html = engine
                .render(
                    name,
                    context! { meta => context! {
                        html_title => "Legal",
                        build_time => "2025-07-01T00:00:00+00:00",
                        plausible_domain => "data.bas.ac.uk",
                    }},
                )
                .unwrap();
            assert!(html.contains("<!DOCTYPE html>"));
            assert!(html.contains("data.bas.ac.uk"));
        }
    }

    #[test]
    fn not_found_template_renders() {
        let engine = TemplateEngine::new();
        let html = engine
            .render(
                NOT_FOUND_TEMPLATE,
                context! { meta => context! {
                    html_title => "Not Found",
                    build_time => "2025-07-01T00:00:00+00:00",
                }},
            )
            .unwrap();
        assert!(html.contains("Not found"));
    }
}
