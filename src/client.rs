//! HTTP client that answers every call with a [`ResponseEnvelope`].
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    auth::{Auth, CredentialStore, DEFAULT_AUTH_HEADER},
    headers::Headers,
    listener::{
        status_listener, RequestInterceptor, ResponseInterceptor, StatusKey, StatusListeners,
    },
    metadata::RequestInfo,
    request::{
        build_body, infer_request_type, method_carries_body, resolve_url, Credentials,
        RequestOptions, RequestParams, ResponseType,
    },
    response::{self, ResponseEnvelope},
    transport::{ReqwestTransport, Transport},
    Error, Result,
};
use http::{HeaderName, HeaderValue, Method};
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// An HTTP client that never fails a call with an error.
///
/// Success, HTTP errors and transport failures all come back as a
/// [`ResponseEnvelope`]. The client is cheap to clone; clones share
/// configuration, so a setter called on one is seen by all.
///
/// # Examples
///
/// ```no_run
/// use fetchwrap::{Auth, Client, RequestParams};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), fetchwrap::Error> {
/// let client = Client::builder()
///     .base_path("https://api.example.com")
///     .auth(Auth::bearer("secret-token"))
///     .build()?;
///
/// // GET request
/// let user = client.get("/users/123", RequestParams::new()).await;
/// println!("{} {:?}", user.status, user.data);
///
/// // POST request; the fields form the JSON body
/// let created = client
///     .post(
///         "/users",
///         RequestParams::new()
///             .field("name", json!("Alice"))
///             .field("email", json!("alice@example.com")),
///     )
///     .await;
/// if !created.success {
///     eprintln!("create failed: {} {}", created.status, created.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Arc<dyn Transport>,
    base_path: String,
    state: RwLock<ClientState>,
}

/// Settings that may change after construction.
#[derive(Clone, Default)]
struct ClientState {
    headers: Headers,
    auth_header: Option<(String, String)>,
    credentials: Option<Credentials>,
    on_request: Option<RequestInterceptor>,
    on_response: Option<ResponseInterceptor>,
    listeners: StatusListeners,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fetchwrap::Client;
    ///
    /// # fn example() -> Result<(), fetchwrap::Error> {
    /// let client = Client::builder()
    ///     .base_path("https://api.example.com")
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Makes a request.
    ///
    /// Resolves `path` against the base path, merges headers, encodes the
    /// body, runs the request interceptor, sends, normalizes, dispatches
    /// status listeners (first attempts only) and runs the response
    /// interceptor.
    pub async fn call(
        &self,
        method: Method,
        path: impl AsRef<str>,
        params: RequestParams,
    ) -> ResponseEnvelope {
        let url = resolve_url(&self.inner.base_path, path.as_ref());
        self.execute(method, url, params).await
    }

    /// Makes a GET request.
    pub async fn get(&self, path: impl AsRef<str>, params: RequestParams) -> ResponseEnvelope {
        self.call(Method::GET, path, params).await
    }

    /// Makes a POST request.
    pub async fn post(&self, path: impl AsRef<str>, params: RequestParams) -> ResponseEnvelope {
        self.call(Method::POST, path, params).await
    }

    /// Makes a PUT request.
    pub async fn put(&self, path: impl AsRef<str>, params: RequestParams) -> ResponseEnvelope {
        self.call(Method::PUT, path, params).await
    }

    /// Makes a PATCH request.
    pub async fn patch(&self, path: impl AsRef<str>, params: RequestParams) -> ResponseEnvelope {
        self.call(Method::PATCH, path, params).await
    }

    /// Makes a DELETE request. The body is sent like for POST.
    pub async fn delete(&self, path: impl AsRef<str>, params: RequestParams) -> ResponseEnvelope {
        self.call(Method::DELETE, path, params).await
    }

    /// Sends a fully built request, decoding the body as JSON.
    ///
    /// No base path, default headers or auth header are applied, and no
    /// interceptors or status listeners run.
    pub async fn raw(&self, url: impl Into<String>, options: RequestOptions) -> ResponseEnvelope {
        self.raw_as(url, options, ResponseType::Json).await
    }

    /// Like [`raw`](Client::raw), with an explicit response type.
    pub async fn raw_as(
        &self,
        url: impl Into<String>,
        options: RequestOptions,
        response_type: ResponseType,
    ) -> ResponseEnvelope {
        let info = RequestInfo::new(url.into(), options, response_type);
        self.send(info).await
    }

    /// Sends the request described by `envelope.metadata` again.
    ///
    /// The stored URL, method, headers, body and credentials are replayed as
    /// they were sent; headers or auth changed on the client since then are
    /// not applied. The retry count goes up by one, which keeps status
    /// listeners from firing for the new attempt. Client-level interceptors
    /// still run. Nothing limits how often a request is retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fetchwrap::Client;
    /// use http::StatusCode;
    ///
    /// # fn example() -> Result<(), fetchwrap::Error> {
    /// let client = Client::builder().base_path("https://api.example.com").build()?;
    ///
    /// // Retry every 503 once.
    /// client.on_status(StatusCode::SERVICE_UNAVAILABLE, |client: Client, response| async move {
    ///     Some(client.retry(&response).await)
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub async fn retry<T>(&self, envelope: &ResponseEnvelope<T>) -> ResponseEnvelope {
        let metadata = &envelope.metadata;
        let mut options = metadata.request_options.clone();
        options.retry_count = metadata.retry_count + 1;

        tracing::info!(
            request = %metadata.request_name,
            retry_count = options.retry_count,
            "Retrying request"
        );

        let info = RequestInfo::new(metadata.url.clone(), options, metadata.response_type);
        self.dispatch(&self.state(), info, None, None).await
    }

    /// Merges `headers` into the default headers; new values win.
    pub fn set_headers(&self, headers: Headers) {
        self.write_state(|state| state.headers.merge(&headers));
    }

    /// Replaces the authorization header value.
    ///
    /// Keeps the header name chosen at construction, `Authorization` otherwise.
    pub fn set_authorization(&self, value: impl Into<String>) {
        let value = value.into();
        self.write_state(|state| {
            let name = state
                .auth_header
                .take()
                .map(|(name, _)| name)
                .unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string());
            state.auth_header = Some((name, value));
        });
    }

    /// Sets the credentials policy used when a call does not pick one.
    pub fn set_credentials(&self, credentials: Credentials) {
        self.write_state(|state| state.credentials = Some(credentials));
    }

    /// Sets the request interceptor used when a call has none of its own.
    pub fn on_request<F>(&self, f: F)
    where
        F: Fn(&RequestInfo) + Send + Sync + 'static,
    {
        self.write_state(|state| state.on_request = Some(Arc::new(f)));
    }

    /// Sets the response interceptor used when a call has none of its own.
    pub fn on_response<F>(&self, f: F)
    where
        F: Fn(&ResponseEnvelope) + Send + Sync + 'static,
    {
        self.write_state(|state| state.on_response = Some(Arc::new(f)));
    }

    /// Registers the listener for a status code, or for every status with
    /// [`StatusKey::Any`]. Replaces any listener already registered for it.
    pub fn on_status<F, Fut>(&self, status: impl Into<StatusKey>, f: F)
    where
        F: Fn(Client, ResponseEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<ResponseEnvelope>> + Send + 'static,
    {
        let key = status.into();
        let listener = status_listener(f);
        self.write_state(|state| state.listeners.insert(key, listener));
    }

    /// Base path prepended to relative call paths.
    pub fn base_path(&self) -> &str {
        &self.inner.base_path
    }

    /// The headers every call starts from: defaults plus the auth header.
    pub fn default_headers(&self) -> Headers {
        let state = self.state();
        let mut headers = state.headers;
        if let Some((name, value)) = state.auth_header {
            headers.insert(name, value);
        }
        headers
    }

    async fn execute(
        &self,
        method: Method,
        url: String,
        params: RequestParams,
    ) -> ResponseEnvelope {
        let state = self.state();
        let RequestParams {
            headers: call_headers,
            body,
            fields,
            credentials,
            mode,
            response_type,
            on_request,
            on_response,
        } = params;

        let mut headers = state.headers.clone();
        if let Some((name, value)) = &state.auth_header {
            headers.insert(name.clone(), value.clone());
        }
        headers.merge(&call_headers);

        let request_type = infer_request_type(&headers);
        let body = if method_carries_body(&method) {
            Some(build_body(body, fields, request_type, &mut headers))
        } else {
            None
        };

        let options = RequestOptions {
            method,
            headers,
            body,
            credentials: credentials.or(state.credentials),
            mode,
            retry_count: 0,
        };
        let info = RequestInfo::new(url, options, response_type.unwrap_or_default());
        self.dispatch(&state, info, on_request, on_response).await
    }

    /// Runs one attempt: request interceptor, transport, status listeners
    /// on the first attempt only, then the response interceptor.
    async fn dispatch(
        &self,
        state: &ClientState,
        info: RequestInfo,
        on_request: Option<RequestInterceptor>,
        on_response: Option<ResponseInterceptor>,
    ) -> ResponseEnvelope {
        let retry_count = info.request_options.retry_count;

        if let Some(on_request) = on_request.as_ref().or(state.on_request.as_ref()) {
            on_request(&info);
        }

        let mut envelope = self.send(info).await;

        if retry_count == 0 && !state.listeners.is_empty() {
            envelope = state.listeners.dispatch(self, envelope).await;
        }

        if let Some(on_response) = on_response.as_ref().or(state.on_response.as_ref()) {
            on_response(&envelope);
        }

        envelope
    }

    async fn send(&self, info: RequestInfo) -> ResponseEnvelope {
        tracing::debug!(
            method = %info.method,
            url = %info.url,
            retry_count = info.request_options.retry_count,
            "Executing HTTP request"
        );

        let start_time = Instant::now();
        match self
            .inner
            .transport
            .send(&info.url, &info.request_options)
            .await
        {
            Ok(response) => {
                response::from_transport_response(info, response, start_time.elapsed())
            }
            Err(e) => response::from_transport_error(info, &e, start_time.elapsed()),
        }
    }

    fn state(&self) -> ClientState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_state(&self, f: impl FnOnce(&mut ClientState)) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut *state);
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Client")
            .field("base_path", &self.inner.base_path)
            .field("headers", &state.headers)
            .field("credentials", &state.credentials)
            .field("status_listeners", &state.listeners)
            .finish_non_exhaustive()
    }
}

/// Construction options that can be loaded from configuration.
///
/// # Examples
///
/// ```
/// use fetchwrap::{ClientBuilder, ClientConfig};
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "basePath": "https://api.example.com",
///     "credentials": "include",
///     "headers": { "X-Client": "docs" },
///     "auth": { "type": "bearer", "token": "secret" }
/// }"#).unwrap();
///
/// let client = ClientBuilder::from_config(config).build().unwrap();
/// assert_eq!(client.base_path(), "https://api.example.com");
/// assert_eq!(client.default_headers().get("Authorization"), Some("Bearer secret"));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub headers: Option<Headers>,
    #[serde(default)]
    pub auth: Option<Auth>,
}

/// Builder for configuring and creating a [`Client`].
///
/// Default headers start as `Content-Type: application/json`, so bodies are
/// JSON-encoded unless a call says otherwise.
///
/// # Examples
///
/// ```no_run
/// use fetchwrap::{Auth, ClientBuilder, Credentials};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), fetchwrap::Error> {
/// let client = ClientBuilder::new()
///     .base_path("https://api.example.com")
///     .auth(Auth::basic("user", "pass"))
///     .credentials(Credentials::Include)
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .on_request(|info| println!("-> {}", info.request_name))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_path: String,
    default_headers: Headers,
    auth: Option<Auth>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    credentials: Option<Credentials>,
    on_request: Option<RequestInterceptor>,
    on_response: Option<ResponseInterceptor>,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_path: String::new(),
            default_headers: Headers::from([("Content-Type", "application/json")]),
            auth: None,
            credential_store: None,
            credentials: None,
            on_request: None,
            on_response: None,
            transport: None,
            timeout: None,
        }
    }

    /// Creates a builder from loaded configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new();
        if let Some(base_path) = config.base_path {
            builder = builder.base_path(base_path);
        }
        if let Some(credentials) = config.credentials {
            builder = builder.credentials(credentials);
        }
        if let Some(headers) = config.headers {
            builder = builder.default_headers(headers);
        }
        if let Some(auth) = config.auth {
            builder = builder.auth(auth);
        }
        builder
    }

    /// Creates a builder from a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid [`ClientConfig`].
    pub fn from_config_json(json: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(json)
            .map_err(|e| Error::ConfigurationError(format!("Invalid client config: {}", e)))?;
        Ok(Self::from_config(config))
    }

    /// Sets the prefix for relative paths. Absolute URLs ignore it.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header name: {}", e)))?;
        HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::InvalidHeader(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name.as_ref(), value.as_ref());
        Ok(self)
    }

    /// Merges headers into the defaults; new values win.
    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.default_headers.merge(&headers);
        self
    }

    /// Sets the auth descriptor. It is turned into a header once, in [`build`](ClientBuilder::build).
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets where bearer tokens are looked up by key.
    pub fn credential_store(mut self, store: impl CredentialStore + 'static) -> Self {
        self.credential_store = Some(Arc::new(store));
        self
    }

    /// Credentials policy applied when a call does not pick one.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Request interceptor used when a call has none of its own.
    pub fn on_request<F>(mut self, f: F) -> Self
    where
        F: Fn(&RequestInfo) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(f));
        self
    }

    /// Response interceptor used when a call has none of its own.
    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&ResponseEnvelope) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(f));
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the request timeout of the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is combined with a custom transport, or
    /// if the default transport cannot be created.
    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match (self.transport, self.timeout) {
            (Some(_), Some(_)) => {
                return Err(Error::ConfigurationError(
                    "A timeout only applies to the default transport".to_string(),
                ))
            }
            (Some(transport), None) => transport,
            (None, timeout) => {
                let http_client = reqwest::Client::builder().build().map_err(|e| {
                    Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
                })?;
                let mut transport = ReqwestTransport::from_client(http_client);
                if let Some(timeout) = timeout {
                    transport = transport.with_timeout(timeout);
                }
                Arc::new(transport)
            }
        };

        let auth_header = self
            .auth
            .as_ref()
            .and_then(|auth| auth.header_entry(self.credential_store.as_deref()));
        if self.auth.is_some() && auth_header.is_none() {
            tracing::debug!("Auth descriptor produced no header");
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_path: self.base_path,
                state: RwLock::new(ClientState {
                    headers: self.default_headers,
                    auth_header,
                    credentials: self.credentials,
                    on_request: self.on_request,
                    on_response: self.on_response,
                    listeners: StatusListeners::default(),
                }),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
