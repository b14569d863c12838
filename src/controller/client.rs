//! Values API client
//!
//! Every value lives in the controller's device tree under a
//! `<device>.<target>` key. Reads go to
//! `GET /values/<device path>/<target>/?prettyprint=1&key=<key>`, writes are
//! two POSTs to `/values/`: the new value into the pending slot, then a
//! `<device>.write` call that commits pending values to the hardware.

use serde_json::Value;
use tracing::Span;
use url::Url;

use crate::config::ControllerConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, Transport};
use crate::values::schema;
use crate::values::{DeviceValue, Reading, SyncStatus, ValueRef};

/// Client for one temperature controller.
///
/// Holds no state besides its configuration; each call is one or more
/// blocking HTTP exchanges.
pub struct ValueClient<T: Transport = HttpTransport> {
    config: ControllerConfig,
    base_url: Url,
    transport: T,
    span: Span,
}

impl ValueClient<HttpTransport> {
    pub fn new(config: ControllerConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ValueClient<T> {
    pub fn with_transport(config: ControllerConfig, transport: T) -> ClientResult<Self> {
        let base_url = Url::parse(&config.base_url())?;
        let span = tracing::info_span!("bftc", host = %config.host, port = config.port);

        Ok(Self {
            config,
            base_url,
            transport,
            span,
        })
    }

    /// Run all operations of this client inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn span(&self) -> &Span {
        &self.span
    }

    // ========================================================================
    // URLs
    // ========================================================================

    fn api_key(&self) -> ClientResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ClientError::Config("No key provided for value request".to_string()))
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> ClientResult<Url> {
        let key = self.api_key()?;
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::Config(format!("Invalid controller host: {}", self.config.host)))?;
            path.clear().push("values").extend(segments).push("");
        }
        url.query_pairs_mut()
            .append_pair("prettyprint", "1")
            .append_pair("key", key);
        Ok(url)
    }

    /// Read URL of `value_ref`.
    pub fn value_url(&self, value_ref: &ValueRef) -> ClientResult<Url> {
        self.endpoint(value_ref.path_segments())
    }

    /// Write URL shared by all set and apply calls.
    pub fn values_url(&self) -> ClientResult<Url> {
        self.endpoint(std::iter::empty())
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Read one value together with its synchronization status.
    ///
    /// A request that fails at the transport level does not return an error:
    /// the reading is `NaN` with [`SyncStatus::Error`] so polling loops keep
    /// running. Bodies that cannot be decoded are errors.
    pub fn get_value(&self, device: &str, target: &str) -> ClientResult<Reading<DeviceValue>> {
        let _enter = self.span.enter();
        self.read(&ValueRef::new(device, target))
    }

    /// Write `value`, apply it, then read it back.
    ///
    /// Returns the synchronization status of the read-back value.
    pub fn set_value(
        &self,
        device: &str,
        target: &str,
        value: impl Into<DeviceValue>,
    ) -> ClientResult<SyncStatus> {
        let _enter = self.span.enter();
        self.write(&ValueRef::new(device, target), value.into())
    }

    /// Commit pending values of `device` to the hardware.
    pub fn apply_values(&self, device: &str) -> ClientResult<()> {
        let _enter = self.span.enter();
        self.apply(device)
    }

    /// Whether `device.target` is currently synchronized.
    pub fn check_synced(&self, device: &str, target: &str) -> ClientResult<bool> {
        let _enter = self.span.enter();
        Ok(self.read(&ValueRef::new(device, target))?.is_synchronized())
    }

    pub(crate) fn read(&self, value_ref: &ValueRef) -> ClientResult<Reading<DeviceValue>> {
        let url = self.value_url(value_ref)?;
        tracing::debug!("GET: {}", url.path());

        let body = match self.transport.get(&url) {
            Ok(body) => body,
            Err(e) => {
                match e.body().and_then(schema::decode_api_error) {
                    Some(api) => tracing::error!("Reading {} failed: {}", value_ref, api),
                    None => tracing::error!("Reading {} failed: {}", value_ref, e),
                }
                return Ok(Reading::unreachable());
            }
        };

        let reading = schema::decode_reading(&body, value_ref)?;
        if let SyncStatus::Pending(status) = &reading.status {
            tracing::warn!(
                "Value {} = {} is not synchronized (status {})",
                value_ref,
                reading.value,
                status
            );
        } else if reading.status.is_error() {
            tracing::warn!("Controller reports an error status for {}", value_ref);
        }

        Ok(reading)
    }

    pub(crate) fn write(&self, value_ref: &ValueRef, value: DeviceValue) -> ClientResult<SyncStatus> {
        self.post_values(&schema::set_value_body(value_ref, &value))?;
        self.apply(&value_ref.device)?;

        let status = self.read(value_ref)?.status;
        if status.is_synchronized() {
            tracing::info!("{} set to {} and synchronized", value_ref, value);
        } else {
            tracing::warn!("{} set to {} but status is {}", value_ref, value, status);
        }
        Ok(status)
    }

    fn apply(&self, device: &str) -> ClientResult<()> {
        self.post_values(&schema::apply_values_body(device))
    }

    fn post_values(&self, body: &Value) -> ClientResult<()> {
        let url = self.values_url()?;
        tracing::debug!("POST: {} - Body: {}", url.path(), body);

        match self.transport.post_json(&url, body) {
            Ok(response) => {
                // Some firmware answers 200 with an error object
                if let Some(api) = schema::decode_api_error(&response) {
                    return Err(api.into());
                }
                tracing::debug!("Response: {}", response.trim());
                Ok(())
            }
            Err(e) => Err(match e.body().and_then(schema::decode_api_error) {
                Some(api) => api.into(),
                None => e.into(),
            }),
        }
    }
}
