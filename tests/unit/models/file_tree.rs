use super::*;

fn sample_tree() -> FileTree {
    let template: TemplateItem = serde_json::from_str(
        r#"{
            "folderName": "root",
            "items": [
                { "filename": "package", "fileExtension": "json", "content": "{}" },
                {
                    "folderName": "app",
                    "items": [
                        { "filename": "page", "fileExtension": "tsx", "content": "A" },
                        {
                            "folderName": "about",
                            "items": [
                                { "filename": "page", "fileExtension": "tsx", "content": "about" }
                            ]
                        }
                    ]
                },
                { "filename": "README", "fileExtension": "", "content": "readme" }
            ]
        }"#,
    )
    .unwrap();
    FileTree::from_template(&template)
}

#[test]
fn test_every_file_path_navigates_back_to_itself() {
    let tree = sample_tree();
    for id in tree.files() {
        let path = tree.path_of(id).unwrap();
        assert_eq!(tree.navigate(&path), Some(id), "{path}");
    }
}

#[test]
fn test_files_are_listed_depth_first_left_to_right() {
    let tree = sample_tree();
    let paths: Vec<_> = tree
        .files()
        .into_iter()
        .map(|id| tree.path_of(id).unwrap())
        .collect();
    assert_eq!(
        paths,
        vec!["package.json", "app/page.tsx", "app/about/page.tsx", "README"]
    );
}

#[test]
fn test_template_round_trip_keeps_order() {
    let tree = sample_tree();
    let again = FileTree::from_template(&tree.to_template());
    assert_eq!(again.to_template(), tree.to_template());
}

#[test]
fn test_resolve_prefers_node_identity_over_value() {
    let mut tree = FileTree::new("root");
    let a = tree.add_file("", FileNode::new("util", "ts", "same")).unwrap();
    tree.add_folder("", "lib").unwrap();
    let b = tree
        .add_file("lib", FileNode::new("util", "ts", "same"))
        .unwrap();

    let probe = FileNode::new("util", "ts", "same");
    assert_eq!(tree.resolve_path(Some(a), &probe).unwrap(), "util.ts");
    assert_eq!(tree.resolve_path(Some(b), &probe).unwrap(), "lib/util.ts");
}

#[test]
fn test_resolve_by_value_for_detached_node() {
    let tree = sample_tree();
    let probe = FileNode::new("page", "tsx", "about");
    assert_eq!(
        tree.resolve_path(None, &probe).unwrap(),
        "app/about/page.tsx"
    );
}

#[test]
fn test_resolve_reports_identity_conflict_for_identical_files() {
    let mut tree = FileTree::new("root");
    tree.add_folder("", "a").unwrap();
    tree.add_folder("", "b").unwrap();
    tree.add_file("a", FileNode::new("x", "rs", "")).unwrap();
    tree.add_file("b", FileNode::new("x", "rs", "")).unwrap();

    let err = tree
        .resolve_path(None, &FileNode::new("x", "rs", ""))
        .unwrap_err();
    assert_eq!(
        err,
        FileTreeError::IdentityConflict {
            name: "x.rs".to_string(),
            candidates: vec!["a/x.rs".to_string(), "b/x.rs".to_string()],
        }
    );
}

#[test]
fn test_rename_file_moves_its_identity() {
    let mut tree = sample_tree();
    let page = tree.navigate("app/page.tsx").unwrap();
    tree.rename_file("app", page, "layout", "tsx").unwrap();

    assert_eq!(tree.path_of(page).unwrap(), "app/layout.tsx");
    assert_eq!(tree.navigate("app/layout.tsx"), Some(page));
    assert_eq!(tree.navigate("app/page.tsx"), None);
    assert_eq!(
        tree.resolve_path(None, &FileNode::new("page", "tsx", "A")),
        Err(FileTreeError::NotFound("page.tsx".to_string()))
    );
}

#[test]
fn test_rename_conflict_leaves_tree_unchanged() {
    let mut tree = FileTree::new("root");
    let a = tree.add_file("", FileNode::new("a", "ts", "1")).unwrap();
    tree.add_file("", FileNode::new("b", "ts", "2")).unwrap();
    let before = tree.to_template();

    let err = tree.rename_file("", a, "b", "ts").unwrap_err();
    assert!(matches!(err, FileTreeError::NameConflict { .. }));
    assert_eq!(tree.to_template(), before);

    // Same name with another extension is fine.
    tree.rename_file("", a, "b", "js").unwrap();
}

#[test]
fn test_add_rejects_duplicates_and_empty_names() {
    let mut tree = sample_tree();
    assert!(matches!(
        tree.add_file("app", FileNode::new("page", "tsx", "")),
        Err(FileTreeError::NameConflict { .. })
    ));
    assert_eq!(
        tree.add_file("app", FileNode::new("", "tsx", "")),
        Err(FileTreeError::Validation("filename"))
    );
    assert!(matches!(
        tree.add_folder("", "app"),
        Err(FileTreeError::NameConflict { .. })
    ));
    assert_eq!(
        tree.add_file("missing", FileNode::new("x", "ts", "")),
        Err(FileTreeError::NotFound("missing".to_string()))
    );
}

#[test]
fn test_delete_missing_node_reports_not_found() {
    let mut tree = sample_tree();
    let page = tree.navigate("app/page.tsx").unwrap();
    tree.delete_file("app", page).unwrap();
    assert!(!tree.contains(page));

    assert!(matches!(
        tree.delete_file("app", page),
        Err(FileTreeError::NotFound(_))
    ));
}

#[test]
fn test_delete_folder_removes_subtree() {
    let mut tree = sample_tree();
    let app = tree.navigate("app").unwrap();
    let nested = tree.navigate("app/about/page.tsx").unwrap();
    tree.delete_folder("", app).unwrap();

    assert!(!tree.contains(app));
    assert!(!tree.contains(nested));
    assert_eq!(tree.files().len(), 2);
}

#[test]
fn test_rename_folder_rewrites_descendant_paths() {
    let mut tree = sample_tree();
    let app = tree.navigate("app").unwrap();
    let nested = tree.navigate("app/about/page.tsx").unwrap();
    tree.rename_folder("", app, "src").unwrap();
    assert_eq!(tree.path_of(nested).unwrap(), "src/about/page.tsx");
    assert!(tree.is_descendant_of(nested, app));
}

#[test]
fn test_single_file_project() {
    let tree = FileTree::single_file(FileNode::new("index", "html", "<p/>"));
    let root = tree.root();
    assert_eq!(tree.path_of(root).unwrap(), "index.html");
    assert_eq!(tree.navigate("index.html"), Some(root));
    assert_eq!(tree.files(), vec![root]);
    assert!(matches!(
        tree.folder_at(""),
        Err(FileTreeError::NotAFolder(_))
    ));
}

#[test]
fn test_set_content_returns_previous() {
    let mut tree = sample_tree();
    let page = tree.navigate("app/page.tsx").unwrap();
    let old = tree.set_content(page, "B".to_string()).unwrap();
    assert_eq!(old, "A");
    assert_eq!(tree.file(page).unwrap().content, "B");
}
