use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use super::auth::{acquire_token, AccessToken};
use super::{
    FileEntry, FolderEntry, FolderHandle, FolderListing, HierarchyClient, ItemKind, PropertyBag,
    PropertySource,
};
use crate::error::{Result, SpmapError};

const ACCEPT_JSON: &str = "application/json;odata=nometadata";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteItem {
    name: String,
    server_relative_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListingResponse {
    #[serde(default)]
    folders: Vec<RemoteItem>,
    #[serde(default)]
    files: Vec<RemoteItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FolderProbe {
    exists: bool,
    server_relative_url: String,
}

/// Quote a path as an OData string literal (`'` doubled).
pub fn odata_literal(path: &str) -> String {
    format!("'{}'", path.replace('\'', "''"))
}

/// Percent-encode a query value; spaces become `%20`, not `+`.
fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Build `{site}/_api/web/{endpoint}?@target='{path}'{extra}`.
///
/// The path travels as an aliased parameter so it never becomes part of the
/// URL path itself.
pub fn api_url(site_url: &str, endpoint: &str, path: &str, extra_query: &str) -> String {
    format!(
        "{}/_api/web/{}?@target={}{}",
        site_url.trim_end_matches('/'),
        endpoint,
        encode_query_value(&odata_literal(path)),
        extra_query
    )
}

fn parse_listing(body: ListingResponse) -> FolderListing {
    FolderListing {
        folders: body
            .folders
            .into_iter()
            .map(|f| FolderEntry {
                handle: FolderHandle::new(f.server_relative_url.clone()),
                name: f.name,
                path: f.server_relative_url,
            })
            .collect(),
        files: body
            .files
            .into_iter()
            .map(|f| FileEntry {
                name: f.name,
                path: f.server_relative_url,
            })
            .collect(),
    }
}

/// SharePoint REST client authenticated with an app-only token
pub struct SharePointClient {
    http: Client,
    site_url: String,
    token: AccessToken,
}

impl SharePointClient {
    /// Authenticate and build a client for `site_url`
    pub async fn connect(
        site_url: &str,
        client_id: &str,
        client_secret: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpmapError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let token = acquire_token(&http, site_url, client_id, client_secret).await?;

        Ok(Self {
            http,
            site_url: site_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Single GET returning decoded JSON, or a message describing the failure
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, String> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token.value)
            .header("Accept", ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(format!("SharePoint API error {}: {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))
    }
}

#[async_trait]
impl HierarchyClient for SharePointClient {
    async fn resolve_root(&self, root_path: &str) -> Result<FolderHandle> {
        let url = api_url(
            &self.site_url,
            "GetFolderByServerRelativeUrl(@target)",
            root_path,
            "&$select=Exists,ServerRelativeUrl",
        );
        let probe: FolderProbe = self.get_json(&url).await.map_err(|message| SpmapError::Listing {
            path: root_path.to_string(),
            message,
        })?;

        if !probe.exists {
            return Err(SpmapError::Listing {
                path: root_path.to_string(),
                message: "Root folder does not exist".to_string(),
            });
        }

        Ok(FolderHandle::new(probe.server_relative_url))
    }

    async fn list_children(&self, folder: &FolderHandle) -> Result<FolderListing> {
        let url = api_url(
            &self.site_url,
            "GetFolderByServerRelativeUrl(@target)",
            folder.as_str(),
            "&$expand=Folders,Files\
             &$select=Folders/Name,Folders/ServerRelativeUrl,Files/Name,Files/ServerRelativeUrl",
        );
        let body: ListingResponse = self.get_json(&url).await.map_err(|message| SpmapError::Listing {
            path: folder.as_str().to_string(),
            message,
        })?;

        Ok(parse_listing(body))
    }
}

#[async_trait]
impl PropertySource for SharePointClient {
    async fn fetch_properties(&self, kind: ItemKind, path: &str) -> Result<PropertyBag> {
        let endpoint = match kind {
            ItemKind::Folder => "GetFolderByServerRelativeUrl(@target)/ListItemAllFields/Properties",
            ItemKind::File => "GetFileByServerRelativeUrl(@target)/ListItemAllFields/Properties",
        };
        let url = api_url(&self.site_url, endpoint, path, "");
        let values: Map<String, Value> =
            self.get_json(&url).await.map_err(|message| SpmapError::Metadata {
                path: path.to_string(),
                message,
            })?;

        Ok(PropertyBag::new(values))
    }
}
