//! App-only authentication against SharePoint Online.
//!
//! Two steps: discover the tenant realm from the bearer challenge returned by
//! the site, then exchange the client id/secret for an access token at the
//! Azure ACS endpoint.

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{Result, SpmapError};

const ACS_TOKEN_URL: &str = "https://accounts.accesscontrol.windows.net";

/// Well-known principal id of SharePoint Online
pub const SHAREPOINT_PRINCIPAL: &str = "00000003-0000-0ff1-ce00-000000000000";

/// Bearer token for REST calls
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
}

/// Realm and resource principal advertised by the site's bearer challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub realm: String,
    pub principal: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<String>,
}

/// Parse `WWW-Authenticate: Bearer realm="...",client_id="..."`.
///
/// Parameters may come in any order; empty values count as absent.
pub fn parse_challenge(header: &str) -> Result<Challenge> {
    let param = Regex::new(r#"(\w+)="([^"]*)""#)
        .map_err(|e| SpmapError::Auth(format!("Bad challenge pattern: {}", e)))?;

    let mut realm = None;
    let mut principal = None;
    for caps in param.captures_iter(header) {
        let value = &caps[2];
        if value.is_empty() {
            continue;
        }
        match &caps[1] {
            "realm" => realm = Some(value.to_string()),
            "client_id" => principal = Some(value.to_string()),
            _ => {}
        }
    }

    let realm = realm.ok_or_else(|| {
        SpmapError::Auth(format!("No realm in WWW-Authenticate header: {}", header))
    })?;
    let principal = principal.unwrap_or_else(|| SHAREPOINT_PRINCIPAL.to_string());

    Ok(Challenge { realm, principal })
}

/// Ask the site for its bearer challenge.
async fn discover_challenge(http: &Client, site_url: &str) -> Result<Challenge> {
    let response = http
        .get(format!("{}/_vti_bin/client.svc", site_url))
        .header("Authorization", "Bearer")
        .send()
        .await
        .map_err(|e| SpmapError::Auth(format!("Network error contacting {}: {}", site_url, e)))?;

    if response.status() != StatusCode::UNAUTHORIZED {
        return Err(SpmapError::Auth(format!(
            "Expected a bearer challenge from {}, got {}",
            site_url,
            response.status()
        )));
    }

    let header = response
        .headers()
        .get(reqwest::header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| SpmapError::Auth(format!("{} sent no WWW-Authenticate header", site_url)))?;

    parse_challenge(header)
}

fn parse_expiry(expires_on: Option<&str>) -> Option<DateTime<Utc>> {
    let secs: i64 = expires_on?.trim().parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Acquire an app-only access token for `site_url`.
pub async fn acquire_token(
    http: &Client,
    site_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken> {
    let host = url::Url::parse(site_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| SpmapError::Config(format!("Site URL has no host: {}", site_url)))?;

    let challenge = discover_challenge(http, site_url).await?;
    log::debug!("Tenant realm: {}", challenge.realm);

    let form = [
        ("grant_type", "client_credentials".to_string()),
        ("client_id", format!("{}@{}", client_id, challenge.realm)),
        ("client_secret", client_secret.to_string()),
        (
            "resource",
            format!("{}/{}@{}", challenge.principal, host, challenge.realm),
        ),
    ];

    let response = http
        .post(format!("{}/{}/tokens/OAuth/2", ACS_TOKEN_URL, challenge.realm))
        .form(&form)
        .send()
        .await
        .map_err(|e| SpmapError::Auth(format!("Network error requesting token: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(SpmapError::Auth(format!("Token endpoint error {}: {}", status, body)));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SpmapError::Auth(format!("Failed to parse token response: {}", e)))?;

    match parse_expiry(token.expires_on.as_deref()) {
        Some(at) => log::info!("Authenticated to {} (token valid until {})", host, at.to_rfc3339()),
        None => log::info!("Authenticated to {}", host),
    }

    Ok(AccessToken {
        value: token.access_token,
    })
}
