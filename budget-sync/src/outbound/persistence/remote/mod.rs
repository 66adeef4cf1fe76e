//! Remote REST backend built on [`HttpTransport`].
//!
//! Endpoints follow `/users/{userId}/{collection}[/{id}]`. Creates and
//! updates are sent idempotent so transport retries cannot apply a change
//! twice.

mod dto;

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::domain::ports::EntityBackend;
use crate::domain::{EntityId, Error, OwnerId};
use crate::outbound::http::{HttpTransport, RequestConfig, RetryPolicy};

pub use dto::{
    CategoryDto, CategoryPatchDto, NewCategoryDto, NewTransactionDto, TransactionDto,
    TransactionPatchDto, WireEntity,
};

/// REST backend for one entity collection.
pub struct RemoteApi<E> {
    transport: HttpTransport,
    base_url: Url,
    retry: RetryPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E: WireEntity> RemoteApi<E> {
    /// Backend rooted at `base_url`, e.g. `https://api.example.com/v1/`.
    pub fn new(transport: HttpTransport, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            transport,
            base_url,
            retry,
            _entity: PhantomData,
        }
    }

    fn endpoint(&self, owner: &OwnerId, id: Option<&EntityId>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| Error::unknown(format!("API base URL {} cannot carry a path", self.base_url)))?;
            segments
                .pop_if_empty()
                .push("users")
                .push(owner.as_ref())
                .push(E::COLLECTION);
            if let Some(id) = id {
                segments.push(&id.to_string());
            }
        }
        Ok(url)
    }

    fn body<T: serde::Serialize>(dto: &T) -> Result<Value, Error> {
        serde_json::to_value(dto)
            .map_err(|err| Error::unknown(format!("failed to encode {} body: {err}", E::NOUN)))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        config: RequestConfig,
    ) -> Result<T, Error> {
        let config = config.with_retry(self.retry);
        self.transport
            .request(url, &config)
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl<E: WireEntity> EntityBackend<E> for RemoteApi<E> {
    async fn get_all(&self, owner: &OwnerId) -> Result<Vec<E>, Error> {
        let url = self.endpoint(owner, None)?;
        let dtos: Vec<E::Dto> = self.send(&url, RequestConfig::get()).await?;
        let mut entities = Vec::with_capacity(dtos.len());
        for dto in dtos {
            let entity = E::from_dto(dto)?;
            if entity.owner_id() == owner {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    async fn create(&self, owner: &OwnerId, draft: &E::Draft) -> Result<E, Error> {
        let url = self.endpoint(owner, None)?;
        let body = Self::body(&E::draft_to_dto(owner, draft)?)?;
        let dto: E::Dto = self
            .send(&url, RequestConfig::post(body).idempotent())
            .await?;
        E::from_dto(dto)
    }

    async fn update(&self, owner: &OwnerId, id: &EntityId, patch: &E::Patch) -> Result<E, Error> {
        let url = self.endpoint(owner, Some(id))?;
        let body = Self::body(&E::patch_to_dto(patch)?)?;
        let dto: E::Dto = self
            .send(&url, RequestConfig::put(body).idempotent())
            .await?;
        E::from_dto(dto)
    }

    async fn delete(&self, owner: &OwnerId, id: &EntityId) -> Result<(), Error> {
        let url = self.endpoint(owner, Some(id))?;
        self.send::<Value>(&url, RequestConfig::delete())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests;
