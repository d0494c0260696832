//! The four request flows of the crocodile scenario

use crate::assertions::{all_older_than, croc_name, first_name_contains, random_suffix, FIRST_NAME_PATH};
use anyhow::Context;
use crocload_config::{HttpConfig, ScenarioConfig};
use crocload_http::{HttpRequest, NAME_TAG};
use crocload_runner::VuContext;
use tracing::{debug, warn};

pub const REGISTER_PATH: &str = "/user/register/";
pub const LOGIN_PATH: &str = "/auth/token/login/";
pub const MY_CROCODILES_PATH: &str = "/my/crocodiles/";

pub const PUBLIC_GROUP: &str = "Public endpoints";
pub const CREATE_GROUP: &str = "Create crocs";
pub const LISTING_GROUP: &str = "Get crocs";

pub const PUBLIC_CROCS_TAG: &str = "PublicCrocs";
pub const CREATE_TAG: &str = "Create";

pub const CREATED_USER_CHECK: &str = "Created user";
pub const LOGGED_IN_CHECK: &str = "Logged in successfully";
pub const CROC_CREATED_CHECK: &str = "Croc created successfully";

const SUFFIX_LEN: usize = 5;

/// Credential produced once by setup and shared by every iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
}

pub fn public_crocodile_path(id: u32) -> String {
    format!("/public/crocodiles/{}/", id)
}

pub fn older_than_check(minimum_age: u32) -> String {
    format!("Crocs are older than {} years of age", minimum_age)
}

pub fn listing_check(substring: &str) -> String {
    format!("{} contains {}", FIRST_NAME_PATH, substring)
}

/// Register (tolerating an existing account) and log in.
///
/// Both checks are advisory: an empty token is handed on as is.
pub async fn setup(
    ctx: &VuContext,
    http: &HttpConfig,
    scenario: &ScenarioConfig,
) -> anyhow::Result<Session> {
    let register = ctx
        .request(HttpRequest::post(http.url(REGISTER_PATH)).form([
            ("first_name", scenario.first_name.as_str()),
            ("last_name", scenario.last_name.as_str()),
            ("username", scenario.username.as_str()),
            ("password", scenario.password.as_str()),
        ]))
        .await
        .context("registering user")?;
    if !ctx.check(CREATED_USER_CHECK, register.status == 201) {
        debug!("Registration returned {}, account probably exists", register.status);
    }

    let login = ctx
        .request(HttpRequest::post(http.url(LOGIN_PATH)).form([
            ("username", scenario.username.as_str()),
            ("password", scenario.password.as_str()),
        ]))
        .await
        .context("logging in")?;

    let token = login
        .json_field("access")
        .and_then(|access| access.as_str().map(str::to_string))
        .unwrap_or_default();
    if !ctx.check(LOGGED_IN_CHECK, !token.is_empty()) {
        warn!("Login returned {} without an access token", login.status);
    }

    Ok(Session { token })
}

/// Fetch the public crocodiles as one concurrent batch and check their ages.
///
/// Here and in the flows below a transport error only fails the check; the request
/// itself is already counted in `http_req_failed` with status 0.
pub async fn public_endpoints(ctx: &VuContext, http: &HttpConfig, scenario: &ScenarioConfig) {
    let group = ctx.group(PUBLIC_GROUP);
    let requests = scenario
        .public_crocodile_ids
        .iter()
        .map(|id| HttpRequest::get(http.url(&public_crocodile_path(*id))).tag(NAME_TAG, PUBLIC_CROCS_TAG))
        .collect();

    let ages: Vec<Option<f64>> = group
        .batch(requests)
        .await
        .into_iter()
        .map(|res| match res {
            Ok(res) => res.json_field("age").and_then(|age| age.as_f64()),
            Err(e) => {
                warn!("Public crocodile request failed: {}", e);
                None
            }
        })
        .collect();
    group.check(
        &older_than_check(scenario.minimum_age),
        all_older_than(&ages, scenario.minimum_age),
    );
}

/// Create one crocodile with a random name suffix
pub async fn create(
    ctx: &VuContext,
    http: &HttpConfig,
    scenario: &ScenarioConfig,
    session: &Session,
) {
    let group = ctx.group(CREATE_GROUP);
    let name = croc_name(&scenario.name_prefix, &random_suffix(SUFFIX_LEN));

    let created = group
        .request(
            HttpRequest::post(http.url(MY_CROCODILES_PATH))
                .bearer(&session.token)
                .tag(NAME_TAG, CREATE_TAG)
                .form([
                    ("name", name.as_str()),
                    ("sex", scenario.sex.as_str()),
                    ("date_of_birth", scenario.date_of_birth.as_str()),
                ]),
        )
        .await
        .map(|res| res.status == 201)
        .unwrap_or_else(|e| {
            warn!("Creating {} failed: {}", name, e);
            false
        });

    group.check(CROC_CREATED_CHECK, created);
}

/// List the user's crocodiles and inspect the first entry's name
pub async fn listing(
    ctx: &VuContext,
    http: &HttpConfig,
    scenario: &ScenarioConfig,
    session: &Session,
) {
    let group = ctx.group(LISTING_GROUP);
    let matched = match group
        .request(HttpRequest::get(http.url(MY_CROCODILES_PATH)).bearer(&session.token))
        .await
    {
        Ok(res) => first_name_contains(&res.body, &scenario.listing_substring),
        Err(e) => {
            warn!("Listing crocodiles failed: {}", e);
            false
        }
    };

    group.check(&listing_check(&scenario.listing_substring), matched);
}
