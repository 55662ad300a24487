//! Create/read/delete lifecycle against both bundled executors.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use grant_reconcile::remote::{
    GrantRow, IntegrationGrantBuilder, MemoryRemote, SqliteRemote, Statement,
};
use grant_reconcile::{
    ControllerConfig, GrantIdentity, GrantSpec, GrantState, IntegrationGrantController,
    ReadOutcome, ReconcileError, RemoteError, RemoteExecutor,
};

const INTEGRATION: &str = "my_storage_int";

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn memory_controller() -> IntegrationGrantController<MemoryRemote> {
    init_tracing();
    let remote = Arc::new(MemoryRemote::new());
    remote.create_integration(INTEGRATION);
    IntegrationGrantController::new(remote, ControllerConfig::default())
}

fn roles(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn revokes(statements: &[Statement]) -> Vec<(String, String, String)> {
    statements
        .iter()
        .filter_map(|s| match s {
            Statement::Revoke {
                object,
                privilege,
                role,
                ..
            } => Some((object.clone(), privilege.clone(), role.clone())),
            _ => None,
        })
        .collect()
}

/// Full create/read/delete cycle, usable with any executor.
async fn run_lifecycle<E: RemoteExecutor>(
    controller: &IntegrationGrantController<E>,
) -> anyhow::Result<()> {
    let spec = GrantSpec::new(INTEGRATION)
        .privilege("")
        .role("ANALYST")
        .with_grant_option(false);

    let state = controller.create(&spec).await?;
    assert_eq!(
        GrantIdentity::decode(&state.id)?,
        GrantIdentity::new(INTEGRATION, "USAGE", false)
    );
    assert_eq!(state.spec.roles, roles(&["ANALYST"]));

    let read = controller.read(&state.id).await?;
    assert_eq!(read, ReadOutcome::Present(state.clone()));

    controller.delete(&state).await?;
    controller.delete(&state).await?;

    assert_eq!(controller.read(&state.id).await?, ReadOutcome::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_memory() -> anyhow::Result<()> {
    let controller = memory_controller();
    run_lifecycle(&controller).await?;

    let expected = (INTEGRATION.to_string(), "USAGE".to_string(), "ANALYST".to_string());
    assert_eq!(
        revokes(&controller.remote().statements()),
        vec![expected.clone(), expected]
    );
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_sqlite() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let remote = SqliteRemote::open(dir.path().join("catalog.db"))?;
    remote.create_integration(INTEGRATION)?;

    let controller = IntegrationGrantController::new(Arc::new(remote), ControllerConfig::default());
    run_lifecycle(&controller).await
}

#[tokio::test]
async fn test_create_issues_one_grant_per_role() {
    let controller = memory_controller();
    let spec = GrantSpec::new(INTEGRATION)
        .privilege("usage")
        .roles(["B", "A", "B"])
        .with_grant_option(true);

    let state = controller.create(&spec).await.unwrap();
    assert_eq!(state.spec.roles, roles(&["A", "B"]));
    assert_eq!(state.spec.privilege, "USAGE");
    assert!(state.spec.grant_option);

    let sql: Vec<String> = controller
        .remote()
        .statements()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(
        sql,
        vec![
            r#"GRANT USAGE ON INTEGRATION "my_storage_int" TO ROLE "A" WITH GRANT OPTION"#,
            r#"GRANT USAGE ON INTEGRATION "my_storage_int" TO ROLE "B" WITH GRANT OPTION"#,
            r#"SHOW GRANTS ON INTEGRATION "my_storage_int""#,
        ]
    );
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).roles(["R1", "R2"]))
        .await
        .unwrap();

    let first = controller.read(&state.id).await.unwrap();
    let second = controller.read(&state.id).await.unwrap();
    assert_eq!(first, second);
    assert!(first.is_present());
}

#[tokio::test]
async fn test_read_reflects_drift() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).roles(["R1", "R2"]))
        .await
        .unwrap();

    // Someone else adds one role and removes another.
    let b = IntegrationGrantBuilder::new(INTEGRATION);
    controller.remote().execute(&b.grant("R3", "USAGE", false)).await.unwrap();
    controller.remote().execute(&b.revoke("R1", "USAGE")).await.unwrap();

    let observed = controller.read(&state.id).await.unwrap().into_state().unwrap();
    assert_eq!(observed.spec.roles, roles(&["R2", "R3"]));
    assert_eq!(observed.id, state.id);
}

#[tokio::test]
async fn test_read_ignores_other_privileges_and_shares() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("R1"))
        .await
        .unwrap();

    let b = IntegrationGrantBuilder::new(INTEGRATION);
    controller.remote().execute(&b.grant("OWNER", "OWNERSHIP", false)).await.unwrap();
    controller.remote().execute(&b.grant("DELEGATE", "USAGE", true)).await.unwrap();
    controller.remote().grant_to_share(INTEGRATION, "PARTNER", "USAGE").unwrap();

    let observed = controller.read(&state.id).await.unwrap().into_state().unwrap();
    assert_eq!(observed.spec.roles, roles(&["R1"]));
}

#[tokio::test]
async fn test_revoked_out_of_band_is_not_found() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("ANALYST"))
        .await
        .unwrap();

    let b = IntegrationGrantBuilder::new(INTEGRATION);
    controller.remote().execute(&b.revoke("ANALYST", "USAGE")).await.unwrap();

    assert_eq!(controller.read(&state.id).await.unwrap(), ReadOutcome::NotFound);
}

#[tokio::test]
async fn test_dropped_integration_is_not_found() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("ANALYST"))
        .await
        .unwrap();

    assert!(controller.remote().drop_integration(INTEGRATION));
    assert_eq!(controller.read(&state.id).await.unwrap(), ReadOutcome::NotFound);

    // Nothing left to revoke; delete still succeeds.
    controller.delete(&state).await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_integration_strict() {
    init_tracing();
    let remote = Arc::new(MemoryRemote::new());
    let config = ControllerConfig {
        tolerate_missing_on_delete: false,
        ..ControllerConfig::default()
    };
    let controller = IntegrationGrantController::new(remote, config);

    let state = GrantState::new(&GrantIdentity::new("gone", "USAGE", false), roles(&["R"]));
    let err = controller.delete(&state).await.unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Remote(RemoteError::ObjectNotFound { .. })
    ));
}

#[tokio::test]
async fn test_grant_option_is_part_of_identity() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("R").with_grant_option(false))
        .await
        .unwrap();

    let with_option = GrantIdentity::new(INTEGRATION, "USAGE", true).encode();
    assert_ne!(with_option, state.id);
    assert_eq!(controller.read(&with_option).await.unwrap(), ReadOutcome::NotFound);
}

#[tokio::test]
async fn test_all_privilege_reads_back() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).privilege("all").role("ADMIN"))
        .await
        .unwrap();

    assert_eq!(state.spec.privilege, "ALL");
    assert_eq!(state.spec.roles, roles(&["ADMIN"]));

    controller.delete(&state).await.unwrap();
    assert_eq!(controller.read(&state.id).await.unwrap(), ReadOutcome::NotFound);
}

#[tokio::test]
async fn test_invalid_privilege_sends_nothing() {
    let controller = memory_controller();
    let err = controller
        .create(&GrantSpec::new(INTEGRATION).privilege("SELECT").role("R"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::InvalidPrivilege { .. }));
    assert!(controller.remote().statements().is_empty());
}

#[tokio::test]
async fn test_empty_resource_name_sends_nothing() {
    let controller = memory_controller();
    let err = controller.create(&GrantSpec::new("").role("R")).await.unwrap_err();

    assert!(matches!(err, ReconcileError::EmptyResourceName));
    assert!(controller.remote().statements().is_empty());
}

#[tokio::test]
async fn test_malformed_identity_sends_nothing() {
    let controller = memory_controller();

    let err = controller.read("grant.v1:3:foo,5:USAGE,perhaps").await.unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedIdentity { .. }));

    let state = GrantState {
        id: "not|an|id".to_string(),
        spec: GrantSpec::new(INTEGRATION).role("R"),
    };
    let err = controller.delete(&state).await.unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedIdentity { .. }));

    assert!(controller.remote().statements().is_empty());
}

#[tokio::test]
async fn test_remote_failure_propagates() {
    let controller = memory_controller();
    controller.remote().fail_next("insufficient privileges to operate on integration");

    let err = controller
        .create(&GrantSpec::new(INTEGRATION).role("R"))
        .await
        .unwrap_err();
    match err {
        ReconcileError::Remote(RemoteError::Rejected(message)) => {
            assert_eq!(message, "insufficient privileges to operate on integration");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_read_query_failure_is_an_error() {
    let controller = memory_controller();
    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("R"))
        .await
        .unwrap();

    controller.remote().fail_next("connection reset");
    let err = controller.read(&state.id).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Remote(RemoteError::Rejected(_))));
}

#[tokio::test]
async fn test_create_without_read_back() {
    init_tracing();
    let remote = Arc::new(MemoryRemote::new());
    remote.create_integration(INTEGRATION);
    let config = ControllerConfig {
        read_after_create: false,
        ..ControllerConfig::default()
    };
    let controller = IntegrationGrantController::new(remote, config);

    let state = controller
        .create(&GrantSpec::new(INTEGRATION).role("R"))
        .await
        .unwrap();
    assert_eq!(state.spec.roles, roles(&["R"]));
    assert!(controller.remote().statements().iter().all(|s| !s.is_query()));
}

#[tokio::test]
async fn test_create_without_roles_is_rejected() {
    let controller = memory_controller();
    let err = controller.create(&GrantSpec::new(INTEGRATION)).await.unwrap_err();

    assert!(matches!(err, ReconcileError::EmptyRoleSet));
    assert!(controller.remote().statements().is_empty());
}

#[tokio::test]
async fn test_identity_with_unknown_privilege_sends_nothing() {
    let controller = memory_controller();
    let id = "grant.v1:14:my_storage_int,6:SELECT,false";

    let err = controller.read(id).await.unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedIdentity { .. }));

    let state = GrantState {
        id: id.to_string(),
        spec: GrantSpec::new(INTEGRATION).privilege("SELECT").role("R"),
    };
    let err = controller.delete(&state).await.unwrap_err();
    assert!(matches!(err, ReconcileError::MalformedIdentity { .. }));

    assert!(controller.remote().statements().is_empty());
}

#[tokio::test]
async fn test_legacy_name_with_v1_prefix_reads_back() {
    let name = "grant.v1:x";
    let remote = Arc::new(MemoryRemote::new());
    remote.create_integration(name);
    let controller = IntegrationGrantController::new(remote, ControllerConfig::default());

    let created = controller
        .create(&GrantSpec::new(name).role("R"))
        .await
        .unwrap();

    let read = controller
        .read("grant.v1:x|||USAGE|false")
        .await
        .unwrap()
        .into_state()
        .unwrap();
    assert_eq!(read, created);
}

#[tokio::test]
async fn test_legacy_identity_is_upgraded_on_read() {
    let controller = memory_controller();
    controller
        .create(&GrantSpec::new(INTEGRATION).role("ANALYST").with_grant_option(true))
        .await
        .unwrap();

    let legacy = format!("{}|||USAGE|true", INTEGRATION);
    let observed = controller.read(&legacy).await.unwrap().into_state().unwrap();

    assert!(!GrantIdentity::is_legacy_encoding(&observed.id));
    assert_eq!(
        observed.identity().unwrap(),
        GrantIdentity::new(INTEGRATION, "USAGE", true)
    );
    assert_eq!(observed.spec.roles, roles(&["ANALYST"]));
}

#[tokio::test]
async fn test_replacement_is_delete_then_create() {
    let controller = memory_controller();
    let old = controller
        .create(&GrantSpec::new(INTEGRATION).role("R"))
        .await
        .unwrap();

    controller.delete(&old).await.unwrap();
    let new = controller
        .create(&GrantSpec::new(INTEGRATION).privilege("OWNERSHIP").role("R"))
        .await
        .unwrap();

    assert_ne!(old.id, new.id);
    assert_eq!(controller.read(&old.id).await.unwrap(), ReadOutcome::NotFound);
    assert!(controller.read(&new.id).await.unwrap().is_present());
}

/// Accepts every grant but never records it.
struct BlackHole;

#[async_trait]
impl RemoteExecutor for BlackHole {
    async fn execute(&self, _statement: &Statement) -> grant_reconcile::remote::Result<()> {
        Ok(())
    }

    async fn query_grants(&self, _statement: &Statement) -> grant_reconcile::remote::Result<Vec<GrantRow>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_vanished_after_create() {
    init_tracing();
    let controller = IntegrationGrantController::new(Arc::new(BlackHole), ControllerConfig::default());

    let err = controller
        .create(&GrantSpec::new(INTEGRATION).role("R"))
        .await
        .unwrap_err();
    match err {
        ReconcileError::VanishedAfterCreate { identity } => {
            assert_eq!(
                GrantIdentity::decode(&identity).unwrap(),
                GrantIdentity::new(INTEGRATION, "USAGE", false)
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
