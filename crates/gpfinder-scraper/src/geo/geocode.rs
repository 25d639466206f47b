//! Postcode → coordinate lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use gpfinder_core::{Coordinate, Postcode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::error::{GeoError, ScraperError};
use crate::fetch::Fetch;
use crate::store::{RawStore, StoreKey};

/// Resolves a postcode to the coordinate of its centroid.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, postcode: &Postcode) -> Result<Coordinate, GeoError>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    result: Option<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Geocoder backed by the postcodes.io lookup API
/// (`GET {base}/postcodes/{postcode}`).
pub struct PostcodesIoGeocoder {
    fetch: Arc<dyn Fetch>,
    base_url: String,
}

impl PostcodesIoGeocoder {
    pub fn new(fetch: Arc<dyn Fetch>, base_url: impl Into<String>) -> Self {
        Self {
            fetch,
            base_url: base_url.into(),
        }
    }

    fn lookup_url(&self, postcode: &Postcode) -> String {
        format!(
            "{}/postcodes/{}",
            self.base_url.trim_end_matches('/'),
            utf8_percent_encode(postcode.as_str(), NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl Geocoder for PostcodesIoGeocoder {
    async fn geocode(&self, postcode: &Postcode) -> Result<Coordinate, GeoError> {
        let body = match self.fetch.fetch(&self.lookup_url(postcode)).await {
            Ok(body) => body,
            Err(ScraperError::NotFound { .. }) => {
                return Err(GeoError::NoCoordinates {
                    postcode: postcode.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let response: LookupResponse =
            serde_json::from_str(&body).map_err(|source| GeoError::Deserialize {
                postcode: postcode.clone(),
                source,
            })?;

        match response.result {
            Some(LookupResult {
                latitude: Some(lat),
                longitude: Some(lng),
            }) => Ok(Coordinate { lat, lng }),
            _ => Err(GeoError::NoCoordinates {
                postcode: postcode.clone(),
            }),
        }
    }
}

/// Wraps a [`Geocoder`] with an in-memory memo and the raw store.
///
/// Successful lookups are persisted under [`StoreKey::Geocode`] so re-runs
/// reproduce identical distances without network access. Failures are
/// neither memoised nor persisted.
pub struct StoreBackedGeocoder<G> {
    inner: G,
    store: Arc<dyn RawStore>,
    memo: Mutex<HashMap<Postcode, Coordinate>>,
}

impl<G: Geocoder> StoreBackedGeocoder<G> {
    pub fn new(inner: G, store: Arc<dyn RawStore>) -> Self {
        Self {
            inner,
            store,
            memo: Mutex::new(HashMap::new()),
        }
    }

    fn remembered(&self, postcode: &Postcode) -> Option<Coordinate> {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(postcode)
            .copied()
    }

    fn remember(&self, postcode: &Postcode, coordinate: Coordinate) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(postcode.clone(), coordinate);
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for StoreBackedGeocoder<G> {
    async fn geocode(&self, postcode: &Postcode) -> Result<Coordinate, GeoError> {
        if let Some(coordinate) = self.remembered(postcode) {
            return Ok(coordinate);
        }

        let key = StoreKey::Geocode {
            postcode: postcode.clone(),
        };
        if let Some(bytes) = self.store.get(&key).await? {
            match serde_json::from_slice::<Coordinate>(&bytes) {
                Ok(coordinate) => {
                    tracing::debug!(postcode = %postcode, "geocode cache hit");
                    self.remember(postcode, coordinate);
                    return Ok(coordinate);
                }
                Err(e) => {
                    tracing::warn!(postcode = %postcode, error = %e, "stored geocode is corrupt; refetching");
                }
            }
        }

        let coordinate = self.inner.geocode(postcode).await?;
        let bytes = serde_json::to_vec(&coordinate).map_err(|source| {
            GeoError::Store(crate::error::StoreError::Encode {
                key: key.to_string(),
                source,
            })
        })?;
        self.store.put(&key, &bytes).await?;
        self.remember(postcode, coordinate);
        Ok(coordinate)
    }
}
