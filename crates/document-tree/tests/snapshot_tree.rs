use document_tree::{DocumentTree, NodeSpec, SnapshotTree, TreeError, TEXT_TAG};

const CHAT_JSON: &str = r#"{
  "tag": "main",
  "children": [
    {"tag": "section", "children": [
      {"tag": "div", "children": [{"text": "First message."}]},
      {"tag": "div", "children": [
        {"text": "Second "},
        {"tag": "code", "children": [{"text": "message"}]},
        {"text": " body."}
      ]}
    ]}
  ]
}"#;

#[test]
fn json_snapshot_exposes_walk_accessors() {
    let tree = SnapshotTree::from_json_str(CHAT_JSON).unwrap();
    let root = tree.root();
    assert_eq!(tree.tag(root), "main");

    let section = tree.children(root)[0];
    let divs = tree.children(section);
    assert_eq!(divs.len(), 2);
    assert_eq!(tree.parent(divs[1]), Some(section));
    assert_eq!(tree.text_content(divs[1]), "Second message body.");

    let text_nodes = tree.text_nodes(divs[1]);
    assert_eq!(text_nodes.len(), 3);
    assert!(text_nodes.iter().all(|id| tree.tag(*id) == TEXT_TAG));
}

#[test]
fn text_root_is_rejected() {
    let err = SnapshotTree::from_spec(&NodeSpec::text("loose")).unwrap_err();
    assert!(matches!(err, TreeError::Parse(_)));
}

#[test]
fn text_node_with_children_is_rejected() {
    let mut spec = NodeSpec::text("parent");
    spec.children.push(NodeSpec::text("child"));
    let root = NodeSpec::element("root", vec![spec]);
    assert!(matches!(
        SnapshotTree::from_spec(&root),
        Err(TreeError::TextNodeChildren(_))
    ));
}

#[test]
fn malformed_json_maps_to_parse_error() {
    assert!(matches!(
        SnapshotTree::from_json_str("{not json"),
        Err(TreeError::Parse(_))
    ));
}
