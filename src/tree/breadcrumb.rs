//! Breadcrumbs: the chain of folders from the root down to the current one.
//!
//! A breadcrumb can be computed from the tree ([`resolve_path`]) or carried by the
//! client as an opaque path token ([`parse_path_token`], [`build_path_token`]). A
//! client token is display data only; mutations always resolve parents through the tree.

use serde::{Deserialize, Serialize};

use super::namespace::NamespaceTree;
use super::node::FolderNode;
use super::ROOT_ID;

/// One breadcrumb entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub id: String,
    pub name: String,
}

impl Crumb {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

impl From<&FolderNode> for Crumb {
    fn from(folder: &FolderNode) -> Self {
        Self::new(folder.id.clone(), folder.name.clone())
    }
}

/// Root-to-leaf path of folders for `folder_id`, walking `find_parent` upwards.
///
/// Unknown IDs (and file IDs) yield the root-only path.
pub fn resolve_path(tree: &NamespaceTree, folder_id: &str) -> Vec<Crumb> {
    let root = Crumb::from(tree.root());
    let Some(folder) = tree.find_folder(folder_id) else {
        return vec![root];
    };
    if folder.id == ROOT_ID {
        return vec![root];
    }

    let mut chain = vec![Crumb::from(folder)];
    let mut current = folder.id.as_str();
    while let Some(parent) = tree.find_parent(current) {
        chain.push(Crumb::from(parent));
        current = parent.id.as_str();
    }
    chain.reverse();
    chain
}

/// Decode a client path token into a breadcrumb starting at `root`.
///
/// An absent, empty or undecodable token gives `[root]`. Segments missing an ID or a
/// name are skipped, as are segments naming the root (it is always implicit).
pub fn parse_path_token(token: Option<&str>, root: Crumb) -> Vec<Crumb> {
    let mut path = vec![root];
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return path;
    };
    let Ok(decoded) = urlencoding::decode(token) else {
        return path;
    };

    for part in decoded.split('/').filter(|p| !p.is_empty()) {
        let mut fields = part.split('|');
        let (Some(id), Some(name)) = (fields.next(), fields.next()) else {
            continue;
        };
        let (Ok(id), Ok(name)) = (urlencoding::decode(id), urlencoding::decode(name)) else {
            continue;
        };
        if id.is_empty() || name.is_empty() || id == ROOT_ID {
            continue;
        }
        path.push(Crumb::new(id, name));
    }
    path
}

/// Encode the path obtained by navigating from `current` into `next`.
///
/// The root is implicit and never encoded; an empty string means "at the root".
pub fn build_path_token(current: &[Crumb], next: &Crumb) -> String {
    let segments: Vec<String> = current
        .iter()
        .chain(std::iter::once(next))
        .filter(|c| !c.is_root())
        .map(|c| {
            format!(
                "{}|{}",
                urlencoding::encode(&c.id),
                urlencoding::encode(&c.name)
            )
        })
        .collect();

    if segments.is_empty() {
        return String::new();
    }
    urlencoding::encode(&segments.join("/")).into_owned()
}

/// A navigable breadcrumb, always starting at the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Breadcrumb {
    crumbs: Vec<Crumb>,
}

impl Breadcrumb {
    /// Breadcrumb positioned at the root.
    pub fn at_root(root: Crumb) -> Self {
        Self { crumbs: vec![root] }
    }

    /// Server-authoritative breadcrumb for `folder_id`.
    pub fn resolve(tree: &NamespaceTree, folder_id: &str) -> Self {
        Self {
            crumbs: resolve_path(tree, folder_id),
        }
    }

    /// Client-carried breadcrumb decoded from `token`.
    pub fn from_token(token: Option<&str>, root: Crumb) -> Self {
        Self {
            crumbs: parse_path_token(token, root),
        }
    }

    pub fn crumbs(&self) -> &[Crumb] {
        &self.crumbs
    }

    /// The folder the breadcrumb currently points at.
    pub fn current(&self) -> &Crumb {
        // Never empty: the root entry is never popped.
        &self.crumbs[self.crumbs.len() - 1]
    }

    /// Number of entries below the root.
    pub fn depth(&self) -> usize {
        self.crumbs.len() - 1
    }

    /// Navigate into a folder. Entering the root resets to the root.
    pub fn enter(&mut self, folder: Crumb) {
        if folder.is_root() {
            self.crumbs.truncate(1);
        } else {
            self.crumbs.push(folder);
        }
    }

    /// Navigate back to the parent entry (or stay at the root) and return it.
    pub fn back(&mut self) -> &Crumb {
        if self.crumbs.len() > 1 {
            self.crumbs.pop();
        }
        self.current()
    }

    /// Encode this breadcrumb as a client path token.
    pub fn to_token(&self) -> String {
        match self.crumbs.split_last() {
            Some((last, rest)) => build_path_token(rest, last),
            None => String::new(),
        }
    }

    pub fn into_crumbs(self) -> Vec<Crumb> {
        self.crumbs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::FileNode;
    use crate::tree::ROOT_NAME;

    fn root() -> Crumb {
        Crumb::new(ROOT_ID, ROOT_NAME)
    }

    fn sample_tree() -> NamespaceTree {
        let mut tree = NamespaceTree::new(ROOT_NAME);
        tree.insert_child(ROOT_ID, FolderNode::new("1", "Docs", None).into())
            .unwrap();
        tree.insert_child("1", FolderNode::new("2", "Work", None).into())
            .unwrap();
        tree.insert_child("2", FolderNode::new("3", "2024", None).into())
            .unwrap();
        tree.insert_child("2", FileNode::new("4", "a.txt", "", "4.txt", 1).into())
            .unwrap();
        tree
    }

    fn names(path: &[Crumb]) -> Vec<&str> {
        path.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_resolve_path_nested() {
        let tree = sample_tree();
        let path = resolve_path(&tree, "3");
        assert_eq!(names(&path), vec![ROOT_NAME, "Docs", "Work", "2024"]);
        assert_eq!(path[0].id, ROOT_ID);
        assert_eq!(path[3].id, "3");
    }

    #[test]
    fn test_resolve_path_root() {
        let tree = sample_tree();
        assert_eq!(resolve_path(&tree, ROOT_ID), vec![root()]);
    }

    #[test]
    fn test_resolve_path_fails_closed() {
        let tree = sample_tree();
        assert_eq!(resolve_path(&tree, "99"), vec![root()]);
        // A file is not a folder.
        assert_eq!(resolve_path(&tree, "4"), vec![root()]);
    }

    #[test]
    fn test_parse_path_token_empty_or_missing() {
        assert_eq!(parse_path_token(None, root()), vec![root()]);
        assert_eq!(parse_path_token(Some(""), root()), vec![root()]);
    }

    #[test]
    fn test_parse_path_token_malformed() {
        // Invalid UTF-8 after percent-decoding.
        assert_eq!(parse_path_token(Some("%FF%FE"), root()), vec![root()]);
        // No separators at all.
        assert_eq!(parse_path_token(Some("garbage"), root()), vec![root()]);
    }

    #[test]
    fn test_parse_path_token_plain_segments() {
        let path = parse_path_token(Some("1%7CDocs%2F2%7CWork"), root());
        assert_eq!(
            path,
            vec![root(), Crumb::new("1", "Docs"), Crumb::new("2", "Work")]
        );
    }

    #[test]
    fn test_parse_path_token_skips_incomplete_segments() {
        let path = parse_path_token(Some("1|Docs/|NoId/2|/root|Again/3|Deep"), root());
        assert_eq!(
            path,
            vec![root(), Crumb::new("1", "Docs"), Crumb::new("3", "Deep")]
        );
    }

    #[test]
    fn test_build_and_parse_token() {
        let current = vec![root(), Crumb::new("1", "Docs")];
        let token = build_path_token(&current, &Crumb::new("2", "Q1/Q2 | notes"));

        let path = parse_path_token(Some(&token), root());
        assert_eq!(
            path,
            vec![
                root(),
                Crumb::new("1", "Docs"),
                Crumb::new("2", "Q1/Q2 | notes")
            ]
        );
    }

    #[test]
    fn test_build_path_token_root_only() {
        assert_eq!(build_path_token(&[root()], &root()), "");
        assert_eq!(build_path_token(&[], &root()), "");
    }

    #[test]
    fn test_breadcrumb_navigation() {
        let mut crumb = Breadcrumb::at_root(root());
        assert_eq!(crumb.depth(), 0);

        crumb.enter(Crumb::new("1", "Docs"));
        crumb.enter(Crumb::new("2", "Work"));
        assert_eq!(crumb.depth(), 2);
        assert_eq!(crumb.current().id, "2");

        assert_eq!(crumb.back().id, "1");
        assert_eq!(crumb.back().id, ROOT_ID);
        // Already at the root.
        assert_eq!(crumb.back().id, ROOT_ID);
        assert_eq!(crumb.crumbs(), &[root()]);
    }

    #[test]
    fn test_breadcrumb_enter_root_resets() {
        let mut crumb = Breadcrumb::at_root(root());
        crumb.enter(Crumb::new("1", "Docs"));
        crumb.enter(root());
        assert_eq!(crumb.crumbs(), &[root()]);
    }

    #[test]
    fn test_breadcrumb_token_round_trip() {
        let tree = sample_tree();
        let resolved = Breadcrumb::resolve(&tree, "3");

        let carried = Breadcrumb::from_token(Some(&resolved.to_token()), root());
        assert_eq!(carried, resolved);
        assert_eq!(Breadcrumb::at_root(root()).to_token(), "");
    }

    #[test]
    fn test_breadcrumb_serializes_as_array() {
        let crumb = Breadcrumb::at_root(root());
        let json = serde_json::to_value(&crumb).unwrap();
        assert_eq!(json, serde_json::json!([{ "id": "root", "name": "My Files" }]));
    }
}
