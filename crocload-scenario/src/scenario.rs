use crate::flows::{self, Session};
use async_trait::async_trait;
use crocload_config::{CrocloadConfig, HttpConfig, ScenarioConfig};
use crocload_runner::{Scenario, VuContext};

/// Register/login once, then public batch, create, list and pace
#[derive(Debug, Clone)]
pub struct CrocodileScenario {
    http: HttpConfig,
    scenario: ScenarioConfig,
}

impl CrocodileScenario {
    pub fn new(http: HttpConfig, scenario: ScenarioConfig) -> Self {
        Self { http, scenario }
    }

    pub fn from_config(config: &CrocloadConfig) -> Self {
        Self::new(config.http.clone(), config.scenario.clone())
    }
}

#[async_trait]
impl Scenario for CrocodileScenario {
    type Data = Session;

    async fn setup(&self, ctx: &VuContext) -> anyhow::Result<Session> {
        flows::setup(ctx, &self.http, &self.scenario).await
    }

    async fn iteration(&self, ctx: &VuContext, session: &Session) -> anyhow::Result<()> {
        flows::public_endpoints(ctx, &self.http, &self.scenario).await;
        flows::create(ctx, &self.http, &self.scenario, session).await;
        flows::listing(ctx, &self.http, &self.scenario, session).await;
        ctx.sleep(self.scenario.pacing).await;
        Ok(())
    }
}
