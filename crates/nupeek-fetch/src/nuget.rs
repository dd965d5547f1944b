//! NuGet V3 feed client.
//!
//! The service index is fetched once per source and cached. Versions come from the
//! flat container; the registration resource, when advertised, is only consulted to
//! drop unlisted versions.

use std::collections::HashSet;

use nupeek_version::PackageVersion;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::error::{Error, Result};
use crate::http::{HttpClient, read_body};
use crate::source::PackageSource;

const FLAT_CONTAINER: &str = "PackageBaseAddress/3.0.0";
const REGISTRATIONS: &str = "RegistrationsBaseUrl";

#[derive(Deserialize)]
struct ServiceIndex {
    #[serde(default)]
    resources: Vec<ServiceResource>,
}

#[derive(Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    kind: String,
}

#[derive(Deserialize)]
struct FlatVersions {
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Deserialize)]
struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: CatalogEntry,
}

#[derive(Deserialize)]
struct CatalogEntry {
    version: String,
    listed: Option<bool>,
}

#[derive(Clone, Debug)]
struct Endpoints {
    flat_container: String,
    registrations: Option<String>,
}

/// A [`PackageSource`] speaking the NuGet V3 protocol.
pub struct NuGetV3Source<C> {
    name: String,
    index_url: String,
    client: C,
    endpoints: OnceCell<Endpoints>,
}

impl<C: HttpClient> NuGetV3Source<C> {
    pub fn new(name: impl Into<String>, index_url: impl Into<String>, client: C) -> Self {
        Self {
            name: name.into(),
            index_url: index_url.into(),
            client,
            endpoints: OnceCell::new(),
        }
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn endpoints(&self) -> Result<&Endpoints> {
        self.endpoints
            .get_or_try_init(|| async {
                let index: ServiceIndex = self
                    .get_json(&self.index_url)
                    .await?
                    .ok_or_else(|| Error::Status {
                        url: self.index_url.clone(),
                        status: 404,
                    })?;
                let endpoints = parse_endpoints(&self.index_url, &index)?;
                tracing::debug!(
                    source = %self.name,
                    flat_container = %endpoints.flat_container,
                    registrations = ?endpoints.registrations,
                    "loaded service index"
                );
                Ok::<_, Error>(endpoints)
            })
            .await
    }

    /// GET `url` into `sink`. `Ok(false)` on 404.
    async fn get_bytes(&self, url: &str, sink: &mut Vec<u8>) -> Result<bool> {
        let response = self.client.get(url).await.map_err(|e| Error::http(url, e))?;
        if response.status == 404 {
            return Ok(false);
        }
        if !response.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        read_body(response.body, sink)
            .await
            .map_err(|e| Error::http(url, e))?;
        Ok(true)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let mut buf = Vec::new();
        if !self.get_bytes(url, &mut buf).await? {
            return Ok(None);
        }
        serde_json::from_slice(&buf)
            .map(Some)
            .map_err(|source| Error::Json {
                url: url.to_string(),
                source,
            })
    }

    async fn unlisted_versions(&self, base: &str, id: &str) -> Result<HashSet<PackageVersion>> {
        let url = format!("{}/{}/index.json", base.trim_end_matches('/'), id);
        let Some(index) = self.get_json::<RegistrationIndex>(&url).await? else {
            return Ok(HashSet::new());
        };

        let mut unlisted = HashSet::new();
        for page in index.items {
            let leaves = match page.items {
                Some(items) => items,
                None => match self.get_json::<RegistrationPageBody>(&page.id).await? {
                    Some(body) => body.items,
                    None => continue,
                },
            };
            for leaf in leaves {
                if leaf.catalog_entry.listed == Some(false) {
                    if let Ok(version) = PackageVersion::parse(&leaf.catalog_entry.version) {
                        unlisted.insert(version);
                    }
                }
            }
        }
        Ok(unlisted)
    }
}

#[derive(Deserialize)]
struct RegistrationPageBody {
    #[serde(default)]
    items: Vec<RegistrationLeaf>,
}

fn parse_endpoints(index_url: &str, index: &ServiceIndex) -> Result<Endpoints> {
    let flat_container = index
        .resources
        .iter()
        .find(|r| r.kind == FLAT_CONTAINER)
        .map(|r| r.id.trim_end_matches('/').to_string())
        .ok_or_else(|| Error::MissingResource {
            url: index_url.to_string(),
            resource: FLAT_CONTAINER,
        })?;

    let registrations = index
        .resources
        .iter()
        .find(|r| r.kind.starts_with(REGISTRATIONS))
        .map(|r| r.id.trim_end_matches('/').to_string());

    Ok(Endpoints {
        flat_container,
        registrations,
    })
}

/// Flat-container path segment for an archive: `<id>/<version>/<id>.<version>.nupkg`, lower-cased.
pub(crate) fn archive_segment(id: &str, version: &PackageVersion) -> String {
    let id = id.to_ascii_lowercase();
    let version = version.normalized().to_ascii_lowercase();
    format!("{id}/{version}/{id}.{version}.nupkg")
}

impl<C: HttpClient> PackageSource for NuGetV3Source<C> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<PackageVersion>> {
        let endpoints = self.endpoints().await?.clone();
        let lower_id = id.to_ascii_lowercase();

        let url = format!("{}/{}/index.json", endpoints.flat_container, lower_id);
        let Some(flat) = self.get_json::<FlatVersions>(&url).await? else {
            return Ok(Vec::new());
        };

        let mut versions: Vec<PackageVersion> = flat
            .versions
            .iter()
            .filter_map(|v| PackageVersion::parse(v).ok())
            .filter(|v| !v.is_prerelease())
            .collect();

        if let Some(registrations) = &endpoints.registrations {
            let unlisted = self.unlisted_versions(registrations, &lower_id).await?;
            versions.retain(|v| !unlisted.contains(v));
        }

        tracing::debug!(source = %self.name, id, count = versions.len(), "listed versions");
        Ok(versions)
    }

    async fn copy_archive(&self, id: &str, version: &PackageVersion, sink: &mut Vec<u8>) -> Result<bool> {
        let endpoints = self.endpoints().await?;
        let url = format!("{}/{}", endpoints.flat_container, archive_segment(id, version));
        let start = sink.len();
        let found = self.get_bytes(&url, sink).await?;
        tracing::debug!(
            source = %self.name,
            %url,
            found,
            bytes = sink.len() - start,
            "archive request"
        );
        Ok(found)
    }
}
