//! Test fixtures for common scenarios.

use std::sync::Arc;

use grant_reconcile::remote::MemoryRemote;
use grant_reconcile::{ControllerConfig, GrantSpec, IntegrationGrantController};

/// Integration created by [`ControllerFixture::new`].
pub const FIXTURE_INTEGRATION: &str = "my_storage_int";

/// A controller over an in-memory remote with one integration in place.
pub struct ControllerFixture {
    /// In-memory remote, shared with the controller.
    pub remote: Arc<MemoryRemote>,
    /// Controller under test.
    pub controller: IntegrationGrantController<MemoryRemote>,
    /// Integration the fixture created.
    pub integration: String,
}

impl ControllerFixture {
    /// Create a fixture with default configuration.
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    /// Create a fixture with custom configuration.
    pub fn with_config(config: ControllerConfig) -> Self {
        Self::with_integration(FIXTURE_INTEGRATION, config)
    }

    /// Create a fixture around a named integration.
    pub fn with_integration(name: &str, config: ControllerConfig) -> Self {
        let remote = Arc::new(MemoryRemote::new());
        remote.create_integration(name);
        let controller = IntegrationGrantController::new(Arc::clone(&remote), config);

        Self {
            remote,
            controller,
            integration: name.to_string(),
        }
    }

    /// A declared grant on the fixture's integration with no roles yet.
    pub fn spec(&self) -> GrantSpec {
        GrantSpec::new(&self.integration)
    }

    /// Render every statement the remote has received, oldest first.
    pub fn statement_log(&self) -> Vec<String> {
        self.remote
            .statements()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for ControllerFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grant_reconcile::ReadOutcome;

    #[tokio::test]
    async fn test_fixture_create_and_read() {
        let fixture = ControllerFixture::new();
        let state = fixture
            .controller
            .create(&fixture.spec().role("ANALYST"))
            .await
            .unwrap();

        assert_eq!(state.id, "grant.v1:14:my_storage_int,5:USAGE,false");
        assert!(fixture.controller.read(&state.id).await.unwrap().is_present());
    }

    #[tokio::test]
    async fn test_fixture_logs_statements() {
        let fixture = ControllerFixture::with_config(ControllerConfig {
            read_after_create: false,
            ..ControllerConfig::default()
        });
        fixture
            .controller
            .create(&fixture.spec().role("ANALYST"))
            .await
            .unwrap();

        assert_eq!(
            fixture.statement_log(),
            vec![r#"GRANT USAGE ON INTEGRATION "my_storage_int" TO ROLE "ANALYST""#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_fixtures_are_isolated() {
        let a = ControllerFixture::with_integration("int_a", ControllerConfig::default());
        let b = ControllerFixture::with_integration("int_b", ControllerConfig::default());

        let state = a.controller.create(&a.spec().role("R")).await.unwrap();
        assert_eq!(b.controller.read(&state.id).await.unwrap(), ReadOutcome::NotFound);
    }
}
