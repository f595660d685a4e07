use std::net::SocketAddr;

use serde::Deserialize;
use metrix_core::error::{MetrixError, Result};
use metrix_core::store::StoreUrl;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub store: StoreSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            auth: AuthSection::default(),
            store: StoreSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetrixError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.listen_addr()?;
        if self.auth.token.is_empty() {
            return Err(MetrixError::Config("auth.token must not be empty".into()));
        }
        self.store_url()?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen.parse().map_err(|_| {
            MetrixError::Config(format!(
                "server.listen must be a valid socket address: {:?}",
                self.server.listen
            ))
        })
    }

    /// Store connection string. Absence is fatal: there is no default store.
    pub fn store_url(&self) -> Result<StoreUrl> {
        match self.store.url.as_deref() {
            Some(url) => StoreUrl::parse(url),
            None => Err(MetrixError::Config(
                "store.url is required (or set STORE_URL)".into(),
            )),
        }
    }

    /// Apply process-environment overrides: `PORT`, `STORE_URL`, `AUTH_TOKEN`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| MetrixError::Config(format!("PORT must be a port number: {port:?}")))?;
            let mut addr = self.listen_addr()?;
            addr.set_port(port);
            self.server.listen = addr.to_string();
        }
        if let Some(url) = var("STORE_URL") {
            self.store.url = Some(url);
        }
        if let Some(token) = var("AUTH_TOKEN") {
            self.auth.token = token;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Static bearer token required on mutating routes.
    #[serde(default = "default_token")]
    pub token: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            token: default_token(),
        }
    }
}

fn default_token() -> String {
    "CURSORPROTOTYPE".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub url: Option<String>,
}
