use pcfg_core::{ServerType, Target};
use pcfg_store::{Layout, CONFIG_FILE, NEXT_GEN_FILE};
use pcfg_test_utils::{global_server, k8s_context, management_server, TestStore};
use pretty_assertions::assert_eq;

#[test]
fn set_server_back_fills_context() -> anyhow::Result<()> {
    let fixture = TestStore::new();
    let client = fixture.client();
    client.set_server(&management_server("mc", "https://mc"), true)?;

    let ctx = client.get_context("mc")?;
    assert_eq!(ctx.target, Target::Kubernetes);
    assert!(ctx.is_management_cluster());
    assert_eq!(ctx.endpoint()?, "https://mc");
    assert_eq!(client.get_current_context(Target::Kubernetes)?.name, "mc");
    assert_eq!(client.get_current_server()?.name, "mc");

    client.set_server(&global_server("saas", "https://saas"), false)?;
    assert_eq!(client.get_context("saas")?.target, Target::MissionControl);
    assert_eq!(client.get_current_server()?.name, "mc");
    Ok(())
}

#[test]
fn server_round_trips_through_legacy_file() -> anyhow::Result<()> {
    let fixture = TestStore::with_layout(Layout::Legacy);
    let client = fixture.client();
    let server = management_server("mc", "https://mc");
    client.set_server(&server, false)?;

    assert_eq!(client.get_server("mc")?, server);
    assert_eq!(client.list_servers()?, vec![server]);
    assert!(fixture.read(CONFIG_FILE).unwrap().starts_with("servers:\n  - name: mc\n"));
    assert!(fixture.read(NEXT_GEN_FILE).unwrap().starts_with("contexts:\n  - name: mc\n"));
    Ok(())
}

#[test]
fn remove_server_drops_context_and_pointers() -> anyhow::Result<()> {
    let fixture = TestStore::new();
    let client = fixture.client();
    client.set_server(&management_server("mc", "https://mc"), true)?;
    client.set_context(&k8s_context("other", "https://o"), false)?;

    client.remove_server("mc")?;
    assert!(!client.server_exists("mc")?);
    assert!(!client.context_exists("mc")?);
    assert!(client.get_current_server().unwrap_err().is_not_found());
    assert!(client.get_current_context(Target::Kubernetes).unwrap_err().is_not_found());
    assert!(client.context_exists("other")?);

    assert!(client.remove_server("mc").unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn set_current_server_moves_context_pointer() -> anyhow::Result<()> {
    let fixture = TestStore::new();
    let client = fixture.client();
    client.set_server(&management_server("a", "https://a"), true)?;
    client.set_server(&management_server("b", "https://b"), false)?;

    client.set_current_server("b")?;
    assert_eq!(client.get_current_server()?.name, "b");
    assert_eq!(client.get_current_context(Target::Kubernetes)?.name, "b");

    assert!(client.set_current_server("ghost").unwrap_err().is_not_found());
    assert_eq!(client.get_current_server()?.name, "b");
    Ok(())
}

#[test]
fn remove_current_server_only_clears_matching_name() -> anyhow::Result<()> {
    let fixture = TestStore::new();
    let client = fixture.client();
    client.set_server(&management_server("a", "https://a"), true)?;

    client.remove_current_server("b")?;
    assert_eq!(client.get_current_server()?.name, "a");

    client.remove_current_server("a")?;
    assert!(client.get_current_server().unwrap_err().is_not_found());
    assert!(client.get_current_context(Target::Kubernetes).unwrap_err().is_not_found());
    assert!(client.server_exists("a")?);
    Ok(())
}

#[test]
fn dangling_current_server_is_reported() {
    let fixture = TestStore::with_layout(Layout::Legacy);
    fixture.write(CONFIG_FILE, "current: gone\n");
    let err = fixture.client().get_current_server().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "current server \"gone\" not found");
}

#[test]
fn servers_written_by_hand_are_listed() -> anyhow::Result<()> {
    let fixture = TestStore::with_layout(Layout::Legacy);
    fixture.write(
        CONFIG_FILE,
        "\
servers:
  - name: hand
    type: global
    globalOpts:
      endpoint: https://hand
current: hand
",
    );
    let client = fixture.client();
    let servers = client.list_servers()?;
    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].server_type, ServerType::Global);
    assert!(servers[0].is_global());
    assert_eq!(client.get_current_server()?, global_server("hand", "https://hand"));
    Ok(())
}
