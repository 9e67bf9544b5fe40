//! Azure Cosmos DB (SQL API) over its REST interface.
//!
//! Each pooled connection owns a blocking HTTP client; requests are signed
//! with the account master key as described in
//! <https://learn.microsoft.com/rest/api/cosmos-db/access-control-on-cosmosdb-resources>.
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use log::*;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use url::Url;

use crate::documents::{HasMeta, PartitionKey, Partitioned};
use crate::ids::{Entity, Id, IdGen};
use crate::persistence::{Storage, StoreError};

type HmacSha256 = Hmac<Sha256>;

const API_VERSION: &str = "2018-12-31";
const MS_DATE: &str = "x-ms-date";
const MS_VERSION: &str = "x-ms-version";
const MS_CONTINUATION: &str = "x-ms-continuation";
const MS_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Where a container lives and how to sign requests against it.
pub struct CosmosAccount {
    endpoint: Url,
    key: Vec<u8>,
    database: String,
    container: String,
}

pub struct CosmosContainer {
    client: Client,
    account: Arc<CosmosAccount>,
    idgen: IdGen,
}

#[derive(Debug)]
pub struct CosmosConnectionManager {
    account: Arc<CosmosAccount>,
}

#[derive(Deserialize)]
struct DocumentFeed<D> {
    #[serde(rename = "Documents")]
    documents: Vec<D>,
}

impl CosmosAccount {
    pub fn new(
        endpoint: &str,
        key: &str,
        database: &str,
        container: &str,
    ) -> Result<Self, StoreError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::Credentials(format!("endpoint {:?}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::Credentials(format!(
                "endpoint {} cannot carry a path",
                endpoint
            )));
        }
        let key = BASE64
            .decode(key.trim().as_bytes())
            .map_err(|e| StoreError::Credentials(format!("master key: {}", e)))?;

        Ok(CosmosAccount {
            endpoint,
            key,
            database: database.to_string(),
            container: container.to_string(),
        })
    }

    fn database_link(&self) -> String {
        format!("dbs/{}", self.database)
    }

    fn container_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    fn document_link(&self, id: &str) -> String {
        format!("{}/docs/{}", self.container_link(), id)
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorization(
        &self,
        verb: &Method,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, StoreError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| StoreError::Credentials(e.to_string()))?;
        mac.update(string_to_sign(verb, resource_type, resource_link, date).as_bytes());
        let sig = BASE64.encode(&mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", sig);
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }
}

impl fmt::Debug for CosmosAccount {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("CosmosAccount")
            .field("endpoint", &self.endpoint.as_str())
            .field("database", &self.database)
            .field("container", &self.container)
            .finish()
    }
}

fn string_to_sign(verb: &Method, resource_type: &str, resource_link: &str, date: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.as_str().to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase()
    )
}

fn rfc1123_now() -> String {
    Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The partition key header is a JSON array; header values must stay ASCII,
/// so anything else is written as `\u` escapes.
fn partition_header(partition: &PartitionKey) -> Result<String, StoreError> {
    let json = serde_json::to_string(&[partition.as_str()]).map_err(StoreError::Encoding)?;
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                let _ = write!(out, "\\u{:04x}", unit);
            }
        }
    }
    Ok(out)
}

fn check(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    match status {
        StatusCode::NOT_FOUND => Err(StoreError::NotFound),
        StatusCode::CONFLICT => Err(StoreError::Conflict),
        _ => {
            let text = resp.text().unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
            warn!("Store replied {}: {}", status, body);
            Err(StoreError::Remote {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl CosmosContainer {
    pub fn connect(account: Arc<CosmosAccount>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(StoreError::Transport)?;
        debug!("Connected to {:?}", account);
        Ok(CosmosContainer {
            client,
            account,
            idgen: IdGen::new(),
        })
    }

    fn request(
        &self,
        method: Method,
        resource_type: &str,
        resource_link: &str,
        url: Url,
    ) -> Result<RequestBuilder, StoreError> {
        let date = rfc1123_now();
        let auth = self
            .account
            .authorization(&method, resource_type, resource_link, &date)?;
        trace!("{} {}", method, url);

        Ok(self
            .client
            .request(method, url)
            .header(MS_DATE, date)
            .header(MS_VERSION, API_VERSION)
            .header(AUTHORIZATION, auth)
            .header(ACCEPT, "application/json"))
    }

    fn document_request(
        &self,
        method: Method,
        id: &str,
        partition: &PartitionKey,
    ) -> Result<RequestBuilder, StoreError> {
        let account = &self.account;
        let url = account.url(&[
            "dbs",
            &account.database,
            "colls",
            &account.container,
            "docs",
            id,
        ]);
        Ok(self
            .request(method, "docs", &account.document_link(id), url)?
            .header(MS_PARTITION_KEY, partition_header(partition)?))
    }

    fn send(req: RequestBuilder) -> Result<Response, StoreError> {
        check(req.send().map_err(StoreError::Transport)?)
    }

    fn create_if_missing(
        &self,
        resource_type: &str,
        parent_link: &str,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let req = self
            .request(Method::POST, resource_type, parent_link, url)?
            .json(body);
        match Self::send(req) {
            Ok(_) => {
                info!("Created {} {}", resource_type, body["id"]);
                Ok(())
            }
            Err(StoreError::Conflict) => {
                debug!("Found existing {} {}", resource_type, body["id"]);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Storage for CosmosContainer {
    fn setup<D: Entity + Partitioned>(&self) -> Result<(), StoreError> {
        let account = &self.account;
        self.create_if_missing(
            "dbs",
            "",
            account.url(&["dbs"]),
            &json!({ "id": account.database }),
        )?;
        self.create_if_missing(
            "colls",
            &account.database_link(),
            account.url(&["dbs", &account.database, "colls"]),
            &json!({
                "id": account.container,
                "partitionKey": { "paths": [D::PARTITION_PATH], "kind": "Hash" },
            }),
        )
    }

    fn read_all<D: DeserializeOwned + Entity>(&self) -> Result<Vec<D>, StoreError> {
        let account = &self.account;
        let link = account.container_link();
        let mut documents = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let url = account.url(&["dbs", &account.database, "colls", &account.container, "docs"]);
            let mut req = self.request(Method::GET, "docs", &link, url)?;
            if let Some(token) = continuation.take() {
                req = req.header(MS_CONTINUATION, token);
            }
            let resp = Self::send(req)?;
            continuation = resp
                .headers()
                .get(MS_CONTINUATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let page: DocumentFeed<D> = resp.json().map_err(StoreError::Transport)?;
            trace!("Read page of {} documents", page.documents.len());
            documents.extend(page.documents);

            if continuation.is_none() {
                break;
            }
        }
        debug!("Read {} documents from {}", documents.len(), link);
        Ok(documents)
    }

    fn create<D>(&self, document: &mut D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned,
    {
        if document.meta().id.is_unassigned() {
            document.meta_mut().id = self.idgen.generate();
        }
        let account = &self.account;
        let link = account.container_link();
        let url = account.url(&["dbs", &account.database, "colls", &account.container, "docs"]);
        let req = self
            .request(Method::POST, "docs", &link, url)?
            .header(MS_PARTITION_KEY, partition_header(&document.partition_key())?)
            .json(&*document);

        let created = Self::send(req)?.json().map_err(StoreError::Transport)?;
        debug!("Created {}", document.meta().id);
        Ok(created)
    }

    fn replace<D>(&self, document: &D) -> Result<D, StoreError>
    where
        D: Serialize + DeserializeOwned + HasMeta + Partitioned,
    {
        let id = document.meta().id.as_str();
        let req = self
            .document_request(Method::PUT, id, &document.partition_key())?
            .json(document);

        let replaced = Self::send(req)?.json().map_err(StoreError::Transport)?;
        debug!("Replaced {}", id);
        Ok(replaced)
    }

    fn delete<D: Entity>(&self, id: &Id<D>, partition: &PartitionKey) -> Result<(), StoreError> {
        let req = self.document_request(Method::DELETE, id.as_str(), partition)?;
        Self::send(req)?;
        debug!("Deleted {}", id);
        Ok(())
    }
}

impl CosmosConnectionManager {
    pub fn new(account: CosmosAccount) -> Self {
        CosmosConnectionManager {
            account: Arc::new(account),
        }
    }
}

impl r2d2::ManageConnection for CosmosConnectionManager {
    type Connection = CosmosContainer;
    type Error = StoreError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        CosmosContainer::connect(self.account.clone())
    }

    fn is_valid(&self, _: &mut Self::Connection) -> Result<(), Self::Error> {
        Ok(())
    }

    fn has_broken(&self, _: &mut Self::Connection) -> bool {
        false
    }
}
