//! The project layout used by the build tasks

use crate::tree::{FolderNode, FolderTree, TreeSpec};

/// Folders the build, test and clean tasks reference by name
pub const REQUIRED_FOLDERS: &[&str] = &[
    "app",
    "app/static",
    "app/static/css",
    "app/static/js",
    "app/static/lib",
    "test",
    "test/client",
    "test/e2e",
    "test/server",
    "test/mocks",
    "logs",
    "working",
    "working/app",
    "working/app/static",
    "working/app/static/css",
    "working/app/static/js",
    "working/app/static/lib",
    "coverage",
    "dist",
    ".sass-cache",
];

fn app_tree() -> TreeSpec {
    TreeSpec::new()
        .branch(
            "static",
            TreeSpec::new().leaf("css").leaf("js").leaf("img").leaf("lib"),
        )
        .leaf("views")
        .leaf("routes")
}

/// Default layout of a project
pub fn default_tree() -> TreeSpec {
    TreeSpec::new()
        .branch("app", app_tree())
        .branch(
            "test",
            TreeSpec::new()
                .leaf("client")
                .leaf("e2e")
                .leaf("server")
                .leaf("mocks"),
        )
        .leaf("logs")
        .branch("working", TreeSpec::new().branch("app", app_tree()))
        .leaf("coverage")
        .leaf("dist")
        .leaf(".sass-cache")
}

/// Named handles into a validated project tree
#[derive(Debug, Clone)]
pub struct Layout {
    tree: FolderTree,
}

impl Layout {
    /// Wrap a tree. Callers validate it against [`REQUIRED_FOLDERS`] first.
    pub fn new(tree: FolderTree) -> Self {
        Layout { tree }
    }

    pub fn tree(&self) -> &FolderTree {
        &self.tree
    }

    pub fn root(&self) -> &FolderNode {
        self.tree.root()
    }

    /// Folder by slash-separated name; falls back to the root for names outside the tree
    pub fn get(&self, name: &str) -> &FolderNode {
        self.tree.folder(name).unwrap_or_else(|| self.tree.root())
    }

    pub fn app(&self) -> &FolderNode {
        self.get("app")
    }

    pub fn test(&self) -> &FolderNode {
        self.get("test")
    }

    pub fn logs(&self) -> &FolderNode {
        self.get("logs")
    }

    pub fn dist(&self) -> &FolderNode {
        self.get("dist")
    }

    pub fn working(&self) -> &FolderNode {
        self.get("working")
    }

    /// Staged copy of the application inside the working folder
    pub fn build(&self) -> &FolderNode {
        self.get("working/app")
    }
}

/// Return the required folders missing from a tree
pub fn missing_folders(tree: &FolderTree) -> Vec<&'static str> {
    REQUIRED_FOLDERS
        .iter()
        .copied()
        .filter(|name| tree.folder(name).is_none())
        .collect()
}
