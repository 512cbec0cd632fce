//! Page templates for the example server

use crate::config::Settings;
use crate::runner::interpolate;
use std::collections::HashMap;
use std::fs;
use tracing::{debug, warn};

const INDEX_FALLBACK: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>${title}</title>
    <link rel="stylesheet" href="${base}${stylesheet}">
</head>
<body>
    <h1>${title}</h1>
    <p>Version ${version}</p>
    <p><a href="${base}help">Help</a></p>
    <script src="${base}${script}"></script>
</body>
</html>
"#;

const HELP_FALLBACK: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>${title} - Help</title>
    <link rel="stylesheet" href="${base}${stylesheet}">
</head>
<body>
    <h1>${title} help</h1>
    <p>The application is mounted at <code>${mount_path}</code>.</p>
    <p>Status information is available at <a href="${base}__status">${base}__status</a>.</p>
</body>
</html>
"#;

/// Pages rendered from the views folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Index,
    Help,
}

impl View {
    pub fn file_name(self) -> &'static str {
        match self {
            View::Index => "index.html",
            View::Help => "help.html",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            View::Index => INDEX_FALLBACK,
            View::Help => HELP_FALLBACK,
        }
    }
}

/// Mount path with exactly one trailing slash
pub fn base_href(mount_path: &str) -> String {
    format!("{}/", mount_path.trim_end_matches('/'))
}

/// Variables available to templates
pub fn view_vars(settings: &Settings) -> HashMap<String, String> {
    let (stylesheet, script) = if settings.enable_minified_files {
        ("css/app.min.css", "js/app.min.js")
    } else {
        ("css/app.css", "js/app.js")
    };

    let mut vars = HashMap::new();
    vars.insert("title".to_string(), settings.app_name.clone());
    vars.insert("version".to_string(), settings.app_version.clone());
    vars.insert("mount_path".to_string(), settings.mount_path.clone());
    vars.insert("base".to_string(), base_href(&settings.mount_path));
    vars.insert("stylesheet".to_string(), stylesheet.to_string());
    vars.insert("script".to_string(), script.to_string());
    vars
}

/// Render a view, using the built-in page when the views folder has none
pub fn render(view: View, settings: &Settings) -> String {
    let path = settings.views_dir.join(view.file_name());
    let template = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(target: "app", "using built-in {} ({}: {})", view.file_name(), path.display(), e);
            view.fallback().to_string()
        }
    };

    match interpolate(&template, &view_vars(settings)) {
        Ok(page) => page,
        Err(e) => {
            warn!(target: "app", "failed to render {}: {}", view.file_name(), e);
            template
        }
    }
}
