//! Key-wise union of an incoming subtree into a target node

use pcfg_tree::{Node, NodeValue, Sequence};

/// Merge `incoming` into `target`, reporting whether `target` changed
///
/// - Mapping into mapping: missing keys are appended, present keys recurse.
/// - Scalar onto scalar: incoming wins; a value equal up to presentation
///   (quoting, `True` vs `true`) is left untouched.
/// - Sequence into sequence: items with a `name` matching an existing item
///   merge into it, items equal to an existing item are skipped, the rest
///   are appended. Incoming items repeating a name are first merged into
///   one, so applying the same sequence twice changes nothing the second
///   time. Names match on scalar text, whatever the tag.
/// - Differing kinds: incoming replaces the value outright.
///
/// The target keeps its own comments; nodes that are added bring theirs.
pub fn merge(incoming: &Node, target: &mut Node) -> bool {
    match (incoming.value(), target.value_mut()) {
        (NodeValue::Mapping(inc), NodeValue::Mapping(tgt)) => {
            let mut changed = false;
            for (key, child) in inc {
                match tgt.get_mut(key) {
                    Some(existing) => changed |= merge(child, existing),
                    None => {
                        tgt.insert(key.clone(), child.clone());
                        changed = true;
                    }
                }
            }
            changed
        }
        (NodeValue::Scalar(inc), NodeValue::Scalar(tgt)) => {
            if inc.same_value(tgt) {
                false
            } else {
                *tgt = inc.clone();
                true
            }
        }
        (NodeValue::Sequence(inc), NodeValue::Sequence(tgt)) => merge_items(inc, tgt),
        _ => {
            target.set_value(incoming.value().clone());
            true
        }
    }
}

fn merge_items(incoming: &Sequence, target: &mut Sequence) -> bool {
    let mut changed = false;
    for item in &collapse_named(incoming) {
        if let Some(name) = item.get_text("name") {
            if let Some(existing) = target.iter_mut().find(|t| t.get_text("name") == Some(name)) {
                changed |= merge(item, existing);
                continue;
            }
        }
        if !target.iter().any(|t| t.same_content(item)) {
            target.push(item.clone());
            changed = true;
        }
    }
    changed
}

/// Incoming items with each repeated `name` folded into its first occurrence
fn collapse_named(items: &Sequence) -> Sequence {
    let mut out = Sequence::with_capacity(items.len());
    for item in items {
        let first = item
            .get_text("name")
            .and_then(|name| out.iter().position(|o: &Node| o.get_text("name") == Some(name)));
        match first {
            Some(index) => {
                merge(item, &mut out[index]);
            }
            None => out.push(item.clone()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcfg_tree::Document;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::parse(text).unwrap()
    }

    fn merged(target: &str, incoming: &str) -> (String, bool) {
        let mut target = doc(target);
        let changed = merge(doc(incoming).root(), target.root_mut());
        (target.to_yaml_string(), changed)
    }

    #[test]
    fn missing_keys_are_appended() {
        let (out, changed) = merged("x: 1\ny: 2\n", "z: 3\nx: 1\n");
        assert!(changed);
        assert_eq!(out, "x: 1\ny: 2\nz: 3\n");
    }

    #[test]
    fn unconfigured_fields_keep_existing_siblings() {
        let (out, changed) = merged("opts:\n  x: 1\n  y: 2\n", "opts:\n  x: 1\n");
        assert!(!changed);
        assert_eq!(out, "opts:\n  x: 1\n  y: 2\n");
    }

    #[test]
    fn scalar_change_keeps_comments() {
        let (out, changed) = merged("# endpoint\nurl: https://a # old\n", "url: https://b\n");
        assert!(changed);
        assert_eq!(out, "# endpoint\nurl: https://b # old\n");
    }

    #[test]
    fn equal_value_keeps_formatting() {
        let (out, changed) = merged("port: '8080'\nflag: True\n", "port: \"8080\"\nflag: true\n");
        assert!(!changed);
        assert_eq!(out, "port: '8080'\nflag: True\n");
    }

    #[test]
    fn kind_change_replaces() {
        let (out, changed) = merged("opts: none\n", "opts:\n  a: 1\n");
        assert!(changed);
        assert_eq!(out, "opts:\n  a: 1\n");
    }

    #[test]
    fn named_items_merge_in_place() {
        let (out, changed) = merged(
            "list:\n  - name: a\n    v: 1\n  - name: b\n",
            "list:\n  - name: a\n    v: 2\n  - name: c\n",
        );
        assert!(changed);
        assert_eq!(out, "list:\n  - name: a\n    v: 2\n  - name: b\n  - name: c\n");
    }

    #[test]
    fn plain_items_union() {
        let (out, changed) = merged("tags: [a]\n", "tags:\n  - a\n  - b\n");
        assert!(changed);
        assert_eq!(out, "tags: [a, b]\n");
        let (out, _) = merged("tags:\n- a\n", "tags: [b]\n");
        assert_eq!(out, "tags:\n- a\n- b\n");
    }

    #[test]
    fn repeated_incoming_names_collapse() {
        let incoming = doc("list:\n  - name: a\n    v: 1\n  - name: a\n    v: 2\n    w: 3\n");
        let mut target = doc("list: []\n");
        assert!(merge(incoming.root(), target.root_mut()));
        assert!(!merge(incoming.root(), target.root_mut()));
        assert_eq!(target.to_yaml_string(), "list:\n  - name: a\n    v: 2\n    w: 3\n");
    }

    #[test]
    fn names_match_whatever_the_tag() {
        let (out, changed) = merged(
            "ports:\n  - name: 8080\n    tls: false\n",
            "ports:\n  - name: '8080'\n    tls: true\n",
        );
        assert!(changed);
        assert_eq!(out, "ports:\n  - name: '8080'\n    tls: true\n");
    }
}
