use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One node of the presentational file tree. Directories carry `children`,
/// files never do.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

/// Build a hierarchical tree from a flat list of repository paths.
///
/// Only paths under `base_path` are considered; the base prefix is kept in
/// each node's `path` but not represented as a node itself. Directories sort
/// before files at every level, then lexicographically by name.
pub fn build_file_tree(paths: &[String], base_path: &str) -> Vec<FileTreeNode> {
    let mut root: Vec<FileTreeNode> = Vec::new();

    for path in paths {
        if !path.starts_with(base_path) {
            continue;
        }
        let relative = path[base_path.len()..].trim_start_matches('/');
        if relative.is_empty() {
            continue;
        }

        let parts: Vec<&str> = relative.split('/').collect();
        let mut level = &mut root;
        for (i, part) in parts.iter().enumerate() {
            let is_file = i == parts.len() - 1;
            let full_path = if base_path.is_empty() {
                parts[..=i].join("/")
            } else {
                format!("{}/{}", base_path, parts[..=i].join("/"))
            };

            let idx = match level.iter().position(|n| n.name == *part) {
                Some(idx) => idx,
                None => {
                    level.push(FileTreeNode {
                        name: (*part).to_string(),
                        path: full_path,
                        kind: if is_file {
                            NodeKind::File
                        } else {
                            NodeKind::Directory
                        },
                        children: if is_file { None } else { Some(Vec::new()) },
                    });
                    level.len() - 1
                }
            };

            if !is_file {
                level = level[idx].children.get_or_insert_with(Vec::new);
            }
        }
    }

    sort_tree(&mut root);
    root
}

fn sort_tree(nodes: &mut [FileTreeNode]) {
    nodes.sort_by(|a, b| {
        let rank = |n: &FileTreeNode| match n.kind {
            NodeKind::Directory => 0,
            NodeKind::File => 1,
        };
        rank(a).cmp(&rank(b)).then_with(|| a.name.cmp(&b.name))
    });
    for node in nodes {
        if let Some(children) = node.children.as_mut() {
            sort_tree(children);
        }
    }
}
