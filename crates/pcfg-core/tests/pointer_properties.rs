use std::collections::BTreeSet;

use pcfg_core::{keys, ConfigClient, ConfigResult, Target};
use pcfg_test_utils::{k8s_context, tmc_context, TestStore};
use pcfg_tree::{find, Key};
use proptest::prelude::*;

const NAMES: [&str; 5] = ["k0", "k1", "k2", "t0", "t1"];

#[derive(Debug, Clone)]
enum Op {
    Set { name: usize, make_current: bool },
    Remove(usize),
    MakeCurrent(usize),
    ClearCurrent(bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NAMES.len(), any::<bool>())
            .prop_map(|(name, make_current)| Op::Set { name, make_current }),
        (0..NAMES.len()).prop_map(Op::Remove),
        (0..NAMES.len()).prop_map(Op::MakeCurrent),
        any::<bool>().prop_map(Op::ClearCurrent),
    ]
}

fn target_of(name: &str) -> Target {
    if name.starts_with('k') {
        Target::Kubernetes
    } else {
        Target::MissionControl
    }
}

fn apply(client: &ConfigClient, op: &Op) -> ConfigResult<()> {
    match *op {
        Op::Set { name, make_current } => {
            let name = NAMES[name];
            let ctx = match target_of(name) {
                Target::Kubernetes => k8s_context(name, "https://k"),
                _ => tmc_context(name, "https://t"),
            };
            client.set_context(&ctx, make_current)
        }
        Op::Remove(name) => client.remove_context(NAMES[name]),
        Op::MakeCurrent(name) => client.set_current_context(NAMES[name]),
        Op::ClearCurrent(kubernetes) => client.remove_current_context(if kubernetes {
            Target::Kubernetes
        } else {
            Target::MissionControl
        }),
    }
}

type Pointers = (Vec<(Target, String)>, Option<String>);

/// Non-empty current context pointers and current server, as stored
fn stored_pointers(client: &ConfigClient) -> ConfigResult<Pointers> {
    client.store().read(|tx| -> ConfigResult<Pointers> {
        let text = |path: &[Key]| {
            find(tx.root(), path)
                .ok()
                .and_then(|node| node.as_scalar())
                .map(|scalar| scalar.text().to_string())
                .filter(|name| !name.is_empty())
        };
        let contexts = Target::SUPPORTED
            .into_iter()
            .filter_map(|target| {
                text(&[Key::any(keys::CURRENT_CONTEXT), Key::any(target.as_str())])
                    .map(|name| (target, name))
            })
            .collect();
        Ok((contexts, text(&[Key::any(keys::CURRENT_SERVER)])))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_current_pointers_never_dangle(ops in proptest::collection::vec(op(), 1..16)) {
        let fixture = TestStore::new();
        let client = fixture.client();
        let mut existing = BTreeSet::new();

        for op in &ops {
            let result = apply(&client, op);
            match op {
                Op::Set { name, .. } => {
                    prop_assert!(result.is_ok());
                    existing.insert(NAMES[*name]);
                }
                Op::Remove(name) => {
                    prop_assert_eq!(result.is_ok(), existing.remove(NAMES[*name]));
                }
                Op::MakeCurrent(name) => {
                    prop_assert_eq!(result.is_ok(), existing.contains(NAMES[*name]));
                }
                Op::ClearCurrent(_) => {
                    if let Err(err) = result {
                        prop_assert!(err.is_not_found());
                    }
                }
            }

            let names: BTreeSet<String> =
                client.list_contexts().unwrap().into_iter().map(|ctx| ctx.name).collect();
            let expected: BTreeSet<String> = existing.iter().map(ToString::to_string).collect();
            prop_assert_eq!(&names, &expected);

            let (contexts, server) = stored_pointers(&client).unwrap();
            for (target, name) in contexts {
                prop_assert!(existing.contains(name.as_str()));
                prop_assert_eq!(target_of(&name), target);
            }
            if let Some(server) = server {
                prop_assert!(client.server_exists(&server).unwrap());
            }
        }
    }
}
