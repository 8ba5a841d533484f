use chrono::{DateTime, Local};

use crate::dataset::Row;
use crate::template::Template;

/// Everything one render needs. Renderers borrow it and never mutate it.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub template: Template,
    pub rows: Vec<Row>,
    pub title: String,
    pub subtitle: Option<String>,
    pub generated_at: DateTime<Local>,
    /// Institution logo source, drawn when `header.show_logo` is set.
    pub logo: Option<String>,
}

impl ReportRequest {
    pub fn new(template: Template, rows: Vec<Row>, title: impl Into<String>) -> Self {
        Self {
            template,
            rows,
            title: title.into(),
            subtitle: None,
            generated_at: Local::now(),
            logo: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Local>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Subtitle, ignoring blank strings.
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Logo source when the letterhead asks for one.
    pub fn logo_source(&self) -> Option<&str> {
        if self.template.header.show_logo {
            self.logo.as_deref().filter(|s| !s.trim().is_empty())
        } else {
            None
        }
    }
}
