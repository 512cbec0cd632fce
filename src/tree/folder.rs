//! Materialized folder trees

use crate::tree::TreeSpec;
use colored::Colorize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`FolderTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(usize);

/// One directory of a declared tree
#[derive(Debug, Clone)]
pub struct FolderNode {
    name: String,
    path: PathBuf,
    parent: Option<FolderId>,
    children: Vec<(String, FolderId)>,
}

/// On-disk state of a folder, used for display only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    Exists,
    Missing,
    NotADirectory,
    Unreadable,
}

impl fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FolderStatus::Exists => "exists",
            FolderStatus::Missing => "missing",
            FolderStatus::NotADirectory => "not a directory",
            FolderStatus::Unreadable => "unreadable",
        };
        f.write_str(label)
    }
}

impl FolderNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of this folder
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parent(&self) -> Option<FolderId> {
        self.parent
    }

    /// Path of a file or folder below this one
    pub fn child_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        // "/bootstrap" style arguments are relative to this node, not the filesystem root
        let relative = relative.strip_prefix("/").unwrap_or(relative);
        self.path.join(relative)
    }

    /// Glob matching every file below this folder, optionally filtered by extension
    pub fn glob_pattern(&self, extension: Option<&str>) -> String {
        let base = glob_base(&self.path);
        match extension {
            Some(ext) => format!("{}/**/*.{}", base, ext.trim_start_matches('.')),
            None => format!("{}/**/*", base),
        }
    }

    /// Check existence and readability of the folder
    pub fn status(&self) -> FolderStatus {
        match fs::metadata(&self.path) {
            Ok(meta) if meta.is_dir() => match fs::read_dir(&self.path) {
                Ok(_) => FolderStatus::Exists,
                Err(_) => FolderStatus::Unreadable,
            },
            Ok(_) => FolderStatus::NotADirectory,
            Err(e) if e.kind() == io::ErrorKind::NotFound => FolderStatus::Missing,
            Err(_) => FolderStatus::Unreadable,
        }
    }
}

/// A tree of folders rooted at a project directory
#[derive(Debug, Clone)]
pub struct FolderTree {
    nodes: Vec<FolderNode>,
}

impl FolderTree {
    /// Build the tree for a root directory from a declarative description.
    ///
    /// Nothing is created on disk.
    pub fn build(root: impl Into<PathBuf>, spec: &TreeSpec) -> Self {
        let root = root.into();
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());

        let mut tree = FolderTree {
            nodes: vec![FolderNode {
                name: root_name,
                path: root,
                parent: None,
                children: Vec::new(),
            }],
        };
        tree.attach(FolderId(0), spec);
        tree
    }

    fn attach(&mut self, parent: FolderId, spec: &TreeSpec) {
        for (name, children) in spec.entries() {
            let path = self.nodes[parent.0].path.join(name);
            let id = FolderId(self.nodes.len());
            self.nodes.push(FolderNode {
                name: name.to_string(),
                path,
                parent: Some(parent),
                children: Vec::new(),
            });
            self.nodes[parent.0].children.push((name.to_string(), id));
            if let Some(children) = children {
                self.attach(id, children);
            }
        }
    }

    pub fn root(&self) -> &FolderNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: FolderId) -> &FolderNode {
        &self.nodes[id.0]
    }

    /// Children of a node in declaration order
    pub fn children(&self, id: FolderId) -> impl Iterator<Item = (FolderId, &FolderNode)> {
        self.nodes[id.0]
            .children
            .iter()
            .map(move |(_, child)| (*child, &self.nodes[child.0]))
    }

    /// Look up a folder by its slash-separated path from the root, e.g. `working/app/static`
    pub fn folder(&self, name: &str) -> Option<&FolderNode> {
        self.folder_id(name).map(|id| self.node(id))
    }

    pub fn folder_id(&self, name: &str) -> Option<FolderId> {
        let mut current = FolderId(0);
        for part in name.split('/').filter(|p| !p.is_empty()) {
            current = self.nodes[current.0]
                .children
                .iter()
                .find(|(child, _)| child == part)
                .map(|(_, id)| *id)?;
        }
        Some(current)
    }

    /// Number of folders excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Render the tree with the status of each folder
    pub fn render_status(&self, width: usize) -> String {
        let mut out = String::new();
        self.render_node(FolderId(0), 0, width, &mut out);
        out
    }

    fn render_node(&self, id: FolderId, depth: usize, width: usize, out: &mut String) {
        for (child_id, child) in self.children(id) {
            let prefix = if depth == 0 {
                "  |--- ".to_string()
            } else {
                format!("  |{}|--- ", " ".repeat(depth * 4 - 1))
            };
            let status = child.status();
            let label = status.to_string();
            let pad = width.saturating_sub(prefix.len() + child.name.len() + label.len());
            let colored_label = match status {
                FolderStatus::Exists => label.green(),
                FolderStatus::Missing => label.yellow(),
                _ => label.red(),
            };
            out.push_str(&format!(
                "{}{}{}{}\n",
                prefix,
                child.name,
                " ".repeat(pad.max(1)),
                colored_label
            ));
            if !child.children.is_empty() {
                self.render_node(child_id, depth + 1, width, out);
                out.push_str("  |\n");
            }
        }
    }
}

fn glob_base(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_spec() -> TreeSpec {
        TreeSpec::new()
            .branch(
                "app",
                TreeSpec::new().branch("static", TreeSpec::new().leaf("css").leaf("js")),
            )
            .leaf("logs")
    }

    #[test]
    fn test_paths_compose_from_parent() {
        let tree = FolderTree::build("/project", &sample_spec());
        let css = tree.folder("app/static/css").unwrap();
        assert_eq!(css.path(), Path::new("/project/app/static/css"));

        let parent = tree.node(css.parent().unwrap());
        assert_eq!(parent.name(), "static");
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_child_path_and_globs() {
        let tree = FolderTree::build("/project", &sample_spec());
        let js = tree.folder("app/static/js").unwrap();
        assert_eq!(
            js.child_path("app.min.js"),
            PathBuf::from("/project/app/static/js/app.min.js")
        );
        assert_eq!(
            js.child_path("/bootstrap"),
            PathBuf::from("/project/app/static/js/bootstrap")
        );
        assert_eq!(js.glob_pattern(None), "/project/app/static/js/**/*");
        assert_eq!(js.glob_pattern(Some("js")), "/project/app/static/js/**/*.js");
        assert_eq!(js.glob_pattern(Some(".css")), "/project/app/static/js/**/*.css");
    }

    #[test]
    fn test_unknown_folder_lookup() {
        let tree = FolderTree::build("/project", &sample_spec());
        assert!(tree.folder("app/views").is_none());
        assert_eq!(tree.folder("").unwrap().path(), Path::new("/project"));
    }

    #[test]
    fn test_status_reports_disk_state() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("app/static/css")).unwrap();
        fs::write(temp_dir.path().join("logs"), "not a dir").unwrap();

        let tree = FolderTree::build(temp_dir.path(), &sample_spec());
        assert_eq!(tree.folder("app/static/css").unwrap().status(), FolderStatus::Exists);
        assert_eq!(tree.folder("app/static/js").unwrap().status(), FolderStatus::Missing);
        assert_eq!(tree.folder("logs").unwrap().status(), FolderStatus::NotADirectory);
    }

    #[test]
    fn test_render_lists_every_folder() {
        let temp_dir = TempDir::new().unwrap();
        let tree = FolderTree::build(temp_dir.path(), &sample_spec());
        let rendered = tree.render_status(60);
        for name in ["app", "static", "css", "js", "logs"] {
            assert!(rendered.contains(name), "missing {} in {}", name, rendered);
        }
        assert!(rendered.contains("missing"));
    }
}
