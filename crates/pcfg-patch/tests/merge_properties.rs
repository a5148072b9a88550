use pcfg_patch::{merge, upsert_entity, PatchStrategies, PatchStrategy};
use pcfg_tree::{Document, Mapping, Node, NodePath, Scalar};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Node> {
    prop_oneof![
        Just(Node::null()),
        any::<bool>().prop_map(|b| Node::scalar(Scalar::bool(b))),
        (0i64..5).prop_map(|i| Node::scalar(Scalar::int(i))),
        "[a-c]{1,3}".prop_map(|s| Node::string(s)),
    ]
}

fn tree() -> impl Strategy<Value = Node> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Node::sequence),
            prop::collection::btree_map("[a-d]", inner, 0..4)
                .prop_map(|m| Node::mapping(m.into_iter().collect::<Mapping>())),
        ]
    })
}

fn entity() -> impl Strategy<Value = Node> {
    prop::collection::btree_map("[a-d]", tree(), 0..4).prop_map(|m| {
        let mut map = Mapping::new();
        map.insert("name".into(), Node::string("ctx"));
        map.extend(m);
        Node::mapping(map)
    })
}

#[test]
fn test_replace_example_from_metadata_shape() {
    let strategies = PatchStrategies::new().with(
        "contexts.discoverySources".parse().unwrap(),
        PatchStrategy::Replace,
    );
    let mut doc = Document::parse(
        "contexts:\n  - name: c\n    discoverySources:\n      - name: A\n      - name: B\n",
    )
    .unwrap();
    let incoming = Document::parse("name: c\ndiscoverySources:\n  - name: C\n")
        .unwrap()
        .into_root();
    let contexts = doc.root_mut().get_mut("contexts").unwrap();
    let changed =
        upsert_entity(contexts, &incoming, &NodePath::single("contexts"), &strategies).unwrap();
    assert!(changed);
    assert_eq!(
        doc.to_yaml_string(),
        "contexts:\n  - name: c\n    discoverySources:\n      - name: C\n"
    );
}

proptest! {
    #[test]
    fn prop_merge_with_self_is_noop(node in tree()) {
        let mut target = node.clone();
        prop_assert!(!merge(&node, &mut target));
        prop_assert_eq!(target, node);
    }

    #[test]
    fn prop_merge_is_idempotent(incoming in tree(), existing in tree()) {
        let mut target = existing;
        merge(&incoming, &mut target);
        let once = target.clone();
        prop_assert!(!merge(&incoming, &mut target));
        prop_assert_eq!(target, once);
    }

    #[test]
    fn prop_upsert_is_idempotent(incoming in entity(), existing in entity()) {
        let strategies = PatchStrategies::new()
            .with("contexts.a".parse().unwrap(), PatchStrategy::Replace);
        let path = NodePath::single("contexts");
        let mut collection = Node::sequence(vec![existing]);
        upsert_entity(&mut collection, &incoming, &path, &strategies).unwrap();
        prop_assert!(!upsert_entity(&mut collection, &incoming, &path, &strategies).unwrap());
        prop_assert_eq!(collection.as_sequence().unwrap().len(), 1);
    }

    #[test]
    fn prop_merged_mapping_contains_incoming_keys(incoming in entity(), existing in entity()) {
        let mut target = existing;
        merge(&incoming, &mut target);
        let merged = target.as_mapping().unwrap();
        for key in incoming.as_mapping().unwrap().keys() {
            prop_assert!(merged.contains_key(key));
        }
    }
}
