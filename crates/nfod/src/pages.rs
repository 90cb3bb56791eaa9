//! HTML pages, rendered with handlebars.
//!
//! Templates are compiled into the binary and registered once at startup.
//! Every `{{value}}` goes through handlebars' HTML escaping.

use std::sync::Arc;

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

use crate::groups::GroupView;

const VIEWER: &str = "viewer";
const NOT_FOUND: &str = "not_found";

/// Registered page templates. Clones share one registry.
#[derive(Clone)]
pub struct Pages {
    registry: Arc<Handlebars<'static>>,
}

/// One row of the viewer's info table.
#[derive(Serialize)]
struct InfoField<'a> {
    label: &'static str,
    value: &'a str,
}

#[derive(Serialize)]
struct ViewerContext<'a> {
    view: &'a GroupView,
    fields: Vec<InfoField<'a>>,
    col_width: usize,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry
            .register_template_string(VIEWER, include_str!("../templates/viewer.html.hbs"))
            .context("Failed to register viewer template")?;
        registry
            .register_template_string(NOT_FOUND, include_str!("../templates/not_found.html.hbs"))
            .context("Failed to register not-found template")?;

        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn viewer(&self, view: &GroupView) -> Result<String> {
        let mut fields = vec![InfoField {
            label: "File Name",
            value: &view.filename,
        }];
        let optional = [
            ("Pre Date", &view.date),
            ("Files", &view.files),
            ("Size", &view.size_label),
        ];
        for (label, value) in optional {
            if let Some(value) = value {
                fields.push(InfoField { label, value });
            }
        }

        // Label and value cells share one width so the table reads as two even columns.
        let col_width = fields
            .iter()
            .flat_map(|f| [f.label.chars().count(), f.value.chars().count()])
            .max()
            .unwrap_or(0)
            + 2;

        let context = ViewerContext {
            view,
            fields,
            col_width,
        };
        self.registry
            .render(VIEWER, &context)
            .with_context(|| format!("Failed to render viewer for {}", view.id))
    }

    pub fn not_found(&self) -> Result<String> {
        self.registry
            .render(NOT_FOUND, &())
            .context("Failed to render not-found page")
    }
}
