use crate::{
    error::Error,
    http_client::{HttpClient, HyperHttpClient, DEFAULT_TIMEOUT},
    schema_store::DEFAULT_SCHEMA_ROOT,
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

pub const ENVIRONMENT_VARIABLE: &str = "APICHECK_ENV";
pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const ENVIRONMENT_DIRECTORY: &str = "environment-config";
pub const DEFAULT_AUTH_PATH: &str = "/api/authenticate";

#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new<S1: Into<String>, S2: Into<String>>(username: S1, password: S2) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

#[derive(Debug)]
pub struct SessionConfiguration {
    base_url: Option<String>,
    credentials: Option<Credentials>,
    schema_root: PathBuf,
    timeout: Option<Duration>,
    auth_path: String,
    http_client: Option<Arc<dyn HttpClient + Send + Sync>>,
}

impl SessionConfiguration {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: None,
            schema_root: PathBuf::from(DEFAULT_SCHEMA_ROOT),
            timeout: Some(DEFAULT_TIMEOUT),
            auth_path: String::from(DEFAULT_AUTH_PATH),
            http_client: None,
        }
    }

    /// Loads `environment-config/testdata.<env>.env` (where `<env>` comes
    /// from `APICHECK_ENV`, `local` by default) into the process environment,
    /// then reads `BASE_URL`, `USER_NAME` and `PASSWORD`.
    pub fn from_env() -> Result<Self, Error> {
        let environment =
            env::var(ENVIRONMENT_VARIABLE).unwrap_or_else(|_| String::from(DEFAULT_ENVIRONMENT));
        let file_name = format!("testdata.{}.env", environment);
        let env_file = Path::new(ENVIRONMENT_DIRECTORY).join(file_name);

        match dotenvy::from_path(&env_file) {
            Ok(()) => tracing::info!(
                environment = %environment,
                file = %env_file.display(),
                "loaded environment file"
            ),
            Err(e) if e.not_found() => tracing::debug!(
                file = %env_file.display(),
                "no environment file, using process environment"
            ),
            Err(e) => {
                return Err(Error::Configuration(format!(
                    "Failed to load {}: {}",
                    env_file.display(),
                    e
                )));
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from `BASE_URL`, `USER_NAME` and `PASSWORD`
    /// as returned by `lookup`.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, Error> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    Error::Configuration(format!("{} environment variable is not set.", key))
                })
        };

        let mut configuration = Self::new();
        configuration.set_base_url(required("BASE_URL")?);
        configuration.set_credentials(required("USER_NAME")?, required("PASSWORD")?);

        Ok(configuration)
    }

    pub fn set_base_url<S: Into<String>>(&mut self, base_url: S) {
        self.base_url = Some(base_url.into());
    }

    pub fn base_url(&self) -> Option<&String> {
        self.base_url.as_ref()
    }

    pub fn set_credentials<S1: Into<String>, S2: Into<String>>(
        &mut self,
        username: S1,
        password: S2,
    ) {
        self.credentials = Some(Credentials::new(username, password));
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_schema_root<P: Into<PathBuf>>(&mut self, schema_root: P) {
        self.schema_root = schema_root.into();
    }

    pub fn schema_root(&self) -> &Path {
        &self.schema_root
    }

    /// `None` disables the client-side timeout.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn set_auth_path<S: Into<String>>(&mut self, auth_path: S) {
        self.auth_path = auth_path.into();
    }

    pub fn auth_path(&self) -> &str {
        &self.auth_path
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient + Send + Sync> {
        self.http_client
            .clone()
            .unwrap_or_else(|| Arc::new(HyperHttpClient::with_timeout(self.timeout)))
    }

    pub fn set_http_client(&mut self, http_client: Arc<dyn HttpClient + Send + Sync>) {
        self.http_client = Some(http_client);
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
