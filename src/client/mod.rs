//! Public operations of the catalog API.
//!
//! [`CatalogClient`] knows the resource endpoints and composes the object
//! encoder with the [`RequestExecutor`]: it picks the URL and method, builds
//! the body, and hands both to the executor.
//!
//! # Example
//!
//! ```rust,no_run
//! use catalog_client::client::{CatalogClient, FindObjects};
//! use catalog_client::config::ClientConfig;
//! use catalog_client::models::{CatalogObject, PropertyValue};
//!
//! # async fn example() -> Result<(), anyhow::Error> {
//! let client = CatalogClient::new(&ClientConfig::new("my-api-token"))?;
//!
//! let found = client.find_objects(&FindObjects::new("Dogs")).await?;
//! println!("{found}");
//!
//! let fido = CatalogObject::new("en", "Fido")
//!     .with_parent("7")
//!     .with_property(PropertyValue::new("3", "text", "brown"));
//! let created = client.create_object(&fido, &[], None).await?;
//! println!("created {}", created["id"]);
//! # Ok(())
//! # }
//! ```

mod query;
mod resource;

use std::path::{Path, PathBuf};

use log::debug;
use md5::{Digest, Md5};
use serde_json::Value;
use url::{Url, form_urlencoded};

pub use query::{DEFAULT_LANG, FindObjects};
pub use resource::Resource;

use crate::config::ClientConfig;
use crate::encoder::{encode, encode_query_string};
use crate::http::{ApiMethod, CatalogError, MULTIPART_FORM_DATA, ReqwestTransport, RequestExecutor, Transport};
use crate::models::{CatalogObject, EntityId, Expand};

pub struct CatalogClient<T = ReqwestTransport> {
    executor: RequestExecutor<T>,
    base_url: Url,
}

impl CatalogClient<ReqwestTransport> {
    /// Creates a client for the API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Url`] if host and protocol do not form a valid
    /// URL, or [`CatalogError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, CatalogError> {
        let executor = RequestExecutor::with_timeout(&config.token, config.timeout())?
            .with_retry_policy(config.retry_policy())
            .with_default_content_type(config.content_type());
        Ok(Self::with_executor(executor, config.base_url()?))
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn with_executor(executor: RequestExecutor<T>, base_url: Url) -> Self {
        Self { executor, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    /// Fetches one object. `expand` is sent only when non-empty.
    pub async fn get_object(&self, id: impl Into<EntityId>, expand: &[Expand]) -> Result<Value, CatalogError> {
        let id = id.into();
        let query = expand_query(&[], expand);
        self.call(Resource::Objects, Some(&id), ApiMethod::Get, &query, &[], None)
            .await
    }

    /// Lists objects matching arbitrary filter parameters.
    pub async fn get_objects(&self, params: &[(&str, &str)], expand: &[Expand]) -> Result<Value, CatalogError> {
        let query = expand_query(params, expand);
        self.call(Resource::Objects, None, ApiMethod::Get, &query, &[], None)
            .await
    }

    pub async fn find_objects(&self, find: &FindObjects) -> Result<Value, CatalogError> {
        let params = find.params();
        let params: Vec<(&str, &str)> = params.iter().map(|(key, value)| (*key, value.as_str())).collect();
        self.get_objects(&params, &find.expand).await
    }

    /// Creates an object, attaching `images` in order.
    ///
    /// `main_image` must be one of `images`; the API identifies it by the MD5
    /// of its contents.
    pub async fn create_object(
        &self,
        object: &CatalogObject,
        images: &[PathBuf],
        main_image: Option<&Path>,
    ) -> Result<Value, CatalogError> {
        let body = object_body(object, images, main_image).await?;
        debug!(name = object.name.as_str(), images = images.len(); "Creating catalog object");
        self.call(
            Resource::Objects,
            None,
            ApiMethod::Post,
            &body,
            images,
            Some(MULTIPART_FORM_DATA),
        )
        .await
    }

    /// Updates an object. The API takes updates as a multipart POST to the
    /// object's URL.
    pub async fn update_object(
        &self,
        id: impl Into<EntityId>,
        object: &CatalogObject,
        images: &[PathBuf],
        main_image: Option<&Path>,
    ) -> Result<Value, CatalogError> {
        let id = id.into();
        let body = object_body(object, images, main_image).await?;
        debug!(id:% = id, images = images.len(); "Updating catalog object");
        self.call(
            Resource::Objects,
            Some(&id),
            ApiMethod::Post,
            &body,
            images,
            Some(MULTIPART_FORM_DATA),
        )
        .await
    }

    /// Replaces an object with a PUT. Images cannot be sent this way.
    pub async fn replace_object(&self, id: impl Into<EntityId>, object: &CatalogObject) -> Result<Value, CatalogError> {
        let id = id.into();
        let body = encode_query_string(object)?;
        self.call(Resource::Objects, Some(&id), ApiMethod::Put, &body, &[], None)
            .await
    }

    /// Changes individual fields of an object.
    pub async fn patch_object(&self, id: impl Into<EntityId>, fields: &[(&str, &str)]) -> Result<Value, CatalogError> {
        let id = id.into();
        let body = form_query(fields);
        self.call(Resource::Objects, Some(&id), ApiMethod::Patch, &body, &[], None)
            .await
    }

    pub async fn find_property(&self, name: &str, lang: &str) -> Result<Value, CatalogError> {
        self.find_by_name(Resource::Properties, name, lang).await
    }

    pub async fn create_property(&self, name: &str, lang: &str, kind: &str) -> Result<Value, CatalogError> {
        let body = form_query(&[("name", name), ("lang", lang), ("type", kind)]);
        self.call(Resource::Properties, None, ApiMethod::Post, &body, &[], None)
            .await
    }

    pub async fn find_unit(&self, name: &str, lang: &str) -> Result<Value, CatalogError> {
        self.find_by_name(Resource::Units, name, lang).await
    }

    pub async fn create_unit(&self, name: &str, lang: &str, kind: &str) -> Result<Value, CatalogError> {
        let body = form_query(&[("name", name), ("lang", lang), ("type", kind)]);
        self.call(Resource::Units, None, ApiMethod::Post, &body, &[], None)
            .await
    }

    pub async fn find_property_category(&self, name: &str, lang: &str) -> Result<Value, CatalogError> {
        self.find_by_name(Resource::PropertyCategories, name, lang).await
    }

    pub async fn create_property_category(&self, name: &str, lang: &str) -> Result<Value, CatalogError> {
        let body = form_query(&[("name", name), ("lang", lang)]);
        self.call(Resource::PropertyCategories, None, ApiMethod::Post, &body, &[], None)
            .await
    }

    async fn find_by_name(&self, resource: Resource, name: &str, lang: &str) -> Result<Value, CatalogError> {
        let query = form_query(&[("filter[name]", name), ("lang", lang)]);
        self.call(resource, None, ApiMethod::Get, &query, &[], None).await
    }

    /// Sends `method` to `resource` (or one entity of it) after checking the
    /// resource accepts that method.
    pub async fn call(
        &self,
        resource: Resource,
        id: Option<&EntityId>,
        method: ApiMethod,
        body: &str,
        files: &[PathBuf],
        content_type: Option<&str>,
    ) -> Result<Value, CatalogError> {
        if !resource.allows(method) {
            return Err(CatalogError::MethodNotAllowed {
                method: method.to_string(),
                resource: resource.path(),
            });
        }

        let url = self.resource_url(resource, id)?;
        self.executor
            .execute(&url, method, body, files, content_type)
            .await
    }

    /// `<base>/<resource>` or `<base>/<resource>/<id>`.
    pub fn resource_url(&self, resource: Resource, id: Option<&EntityId>) -> Result<Url, CatalogError> {
        let mut url = self.base_url.join(resource.path())?;
        if let Some(id) = id {
            url.path_segments_mut()
                .map_err(|_| CatalogError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
                .push(id.as_str());
        }
        Ok(url)
    }
}

/// Encodes `object` and, when given, adds `main_image` as the hex MD5 of that
/// file. Fails before any I/O if the main image is not among `images`.
async fn object_body(
    object: &CatalogObject,
    images: &[PathBuf],
    main_image: Option<&Path>,
) -> Result<String, CatalogError> {
    let mut fields = encode(object)?;
    if let Some(path) = main_image {
        if !images.iter().any(|image| image == path) {
            return Err(CatalogError::MainImageNotAttached { path: path.to_path_buf() });
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| CatalogError::Attachment {
            path: path.to_path_buf(),
            source,
        })?;
        fields.insert("main_image", hex::encode(Md5::digest(&bytes)));
    }
    Ok(fields.to_query_string())
}

fn form_query(pairs: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn expand_query(params: &[(&str, &str)], expand: &[Expand]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(params);
    if !expand.is_empty() {
        serializer.append_pair("expand", &Expand::join(expand));
    }
    serializer.finish()
}
