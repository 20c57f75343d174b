//! Signed calls to the social-network REST API.
//!
//! [`ApiClient::call`] is the single dispatcher: it validates the ids and
//! parameters against the operation's [`EndpointDescriptor`], refuses to go
//! further without an access token, signs, sends and decodes. The typed
//! methods (`get_profile`, `set_status`, ...) only assemble arguments for it.
//!
//! ```rust,no_run
//! # fn run() -> myspaceid::Result<()> {
//! use myspaceid::{ApiClient, ClientConfig, Token};
//!
//! let config = ClientConfig::from_env()?;
//! let access_token = Token::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]");
//! let api = ApiClient::from_config(&config, Some(&access_token))?;
//!
//! let user_id = api.get_userid()?;
//! let profile = api.get_profile(&user_id, Some("full"))?;
//! println!("{}", profile["basicprofile"]["name"]);
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;

use serde_json::{json, Value};
use url::Url;

use crate::client::Client;
use crate::endpoints::{EndpointDescriptor, Operation, ResponseKind};
use crate::transport::HttpTransport;
use crate::validation::validate;
use crate::{ApiError, ClientConfig, Error, Result, Secrets, Token};

const API_ERROR_MESSAGE: &str = "MySpace REST API returned an error";
const DEFAULT_BUTTON_SURFACE: &str = "canvas";

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    /// Body of an operation that returns text as-is (status and mood
    /// updates, activity feeds).
    Raw(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn into_raw(self) -> Option<String> {
        match self {
            ApiResponse::Raw(body) => Some(body),
            ApiResponse::Json(_) => None,
        }
    }

    fn into_value(self) -> Value {
        match self {
            ApiResponse::Json(value) => value,
            ApiResponse::Raw(body) => Value::String(body),
        }
    }

    fn into_text(self) -> String {
        match self {
            ApiResponse::Raw(body) => body,
            ApiResponse::Json(value) => value.to_string(),
        }
    }
}

/// Client for the REST operations listed in [`Operation`].
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    client: Client<T>,
    api_root: Url,
}

#[cfg(feature = "blocking")]
impl ApiClient<crate::transport::ReqwestTransport> {
    /// Client over a `reqwest` transport honouring the timeout and user agent
    /// of `config`.
    pub fn from_config(config: &ClientConfig, access_token: Option<&Token>) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::from_config(config)?;
        Ok(ApiClient::with_config(config, access_token, transport))
    }
}

impl<T> ApiClient<T>
where
    T: HttpTransport,
{
    pub fn new(secrets: Secrets, api_root: Url, transport: T) -> Self {
        ApiClient {
            client: Client::new(secrets, transport),
            api_root,
        }
    }

    pub fn with_config(config: &ClientConfig, access_token: Option<&Token>, transport: T) -> Self {
        let secrets = match access_token {
            Some(token) => config.secrets().with_token(token),
            None => config.secrets(),
        };
        ApiClient::new(secrets, config.api_root().clone(), transport)
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    pub fn secrets(&self) -> &Secrets {
        self.client.secrets()
    }

    /// Run `operation` with the given path ids and named parameters.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidParameter`] when an id or parameter breaks the
    ///   operation's schema.
    /// * [`Error::MissingToken`] when the client holds no access token.
    /// * [`Error::Api`] when the provider answers outside the operation's
    ///   success statuses.
    /// * [`Error::ResponseParse`] when a JSON operation returns something else.
    ///
    /// Nothing is sent unless validation and the token check pass.
    pub fn call(
        &self,
        operation: Operation,
        ids: &[&str],
        params: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let descriptor = operation.descriptor();
        validate(descriptor, ids, params)?;
        if !self.client.secrets().has_token() {
            return Err(Error::MissingToken);
        }
        let url = descriptor.url(&self.api_root, ids);
        let response = self
            .client
            .request(descriptor.verb.method(), url)
            .parameters(params)
            .send()?;
        decode(descriptor, response.status, response.text())
    }

    fn call_json(&self, operation: Operation, ids: &[&str], params: &Params) -> Result<Value> {
        Ok(self.call(operation, ids, &params.pairs())?.into_value())
    }

    fn call_raw(&self, operation: Operation, ids: &[&str], params: &Params) -> Result<String> {
        Ok(self.call(operation, ids, &params.pairs())?.into_text())
    }

    pub fn get_user_info(&self) -> Result<Value> {
        self.call_json(Operation::UserInfo, &[], &Params::default())
    }

    /// Id of the user who granted the access token.
    pub fn get_userid(&self) -> Result<String> {
        let info = self.get_user_info()?;
        match info.get("userId") {
            Some(Value::Number(id)) => Ok(id.to_string()),
            Some(Value::String(id)) => Ok(id.clone()),
            _ => Err(Error::ResponseParse {
                source: <serde_json::Error as serde::de::Error>::missing_field("userId"),
                body: info.to_string(),
            }),
        }
    }

    /// `detail_type` is one of `basic`, `full` or `extended`.
    pub fn get_profile<U: Display>(&self, user_id: U, detail_type: Option<&str>) -> Result<Value> {
        let user_id = user_id.to_string();
        let params = Params::default().opt("detailtype", detail_type);
        self.call_json(Operation::Profile, &[&user_id], &params)
    }

    /// `list` is one of `top`, `online`, `app`; `show` is a `|`-joined subset
    /// of `mood`, `status`, `online`.
    pub fn get_friends<U: Display>(
        &self,
        user_id: U,
        page: Option<i64>,
        page_size: Option<i64>,
        list: Option<&str>,
        show: Option<&str>,
    ) -> Result<Value> {
        let user_id = user_id.to_string();
        let params = Params::default()
            .opt("page", page)
            .opt("page_size", page_size)
            .opt("list", list)
            .opt("show", show);
        self.call_json(Operation::Friends, &[&user_id], &params)
    }

    pub fn get_friendship<U, F>(&self, user_id: U, friend_ids: &[F]) -> Result<Value>
    where
        U: Display,
        F: Display,
    {
        let user_id = user_id.to_string();
        let friend_ids = join(friend_ids, ";");
        self.call_json(Operation::Friendship, &[&user_id, &friend_ids], &Params::default())
    }

    pub fn get_mood<U: Display>(&self, user_id: U) -> Result<Value> {
        self.call_user_json(Operation::Mood, user_id)
    }

    /// Moods the user can pick from, with their ids.
    pub fn get_moods<U: Display>(&self, user_id: U) -> Result<Value> {
        self.call_user_json(Operation::Moods, user_id)
    }

    pub fn set_mood<U: Display, M: Display>(&self, user_id: U, mood: M) -> Result<String> {
        let user_id = user_id.to_string();
        let params = Params::default().set("mood", mood);
        self.call_raw(Operation::SetMood, &[&user_id], &params)
    }

    pub fn get_photos<U: Display>(
        &self,
        user_id: U,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Value> {
        self.call_paged(Operation::Photos, &[&user_id.to_string()], page, page_size)
    }

    pub fn get_photo<U: Display, P: Display>(&self, user_id: U, photo_id: P) -> Result<Value> {
        let ids = [user_id.to_string(), photo_id.to_string()];
        self.call_json(Operation::Photo, &[&ids[0], &ids[1]], &Params::default())
    }

    pub fn get_albums<U: Display>(
        &self,
        user_id: U,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Value> {
        self.call_paged(Operation::Albums, &[&user_id.to_string()], page, page_size)
    }

    /// Photos of one album.
    pub fn get_album<U: Display, A: Display>(
        &self,
        user_id: U,
        album_id: A,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Value> {
        let ids = [user_id.to_string(), album_id.to_string()];
        self.call_paged(Operation::Album, &[&ids[0], &ids[1]], page, page_size)
    }

    /// `privacy` is one of `Everyone`, `FriendsOnly`, `Me`.
    pub fn create_album<U: Display>(
        &self,
        user_id: U,
        title: &str,
        location: Option<&str>,
        privacy: Option<&str>,
    ) -> Result<Value> {
        let user_id = user_id.to_string();
        let params = Params::default()
            .set("title", title)
            .opt("location", location)
            .opt("privacy", privacy);
        self.call_json(Operation::CreateAlbum, &[&user_id], &params)
    }

    pub fn get_status<U: Display>(&self, user_id: U) -> Result<Value> {
        self.call_user_json(Operation::Status, user_id)
    }

    pub fn set_status<U: Display>(&self, user_id: U, status: &str) -> Result<String> {
        let user_id = user_id.to_string();
        let params = Params::default().set("status", status);
        self.call_raw(Operation::SetStatus, &[&user_id], &params)
    }

    pub fn get_videos<U: Display>(
        &self,
        user_id: U,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Value> {
        self.call_paged(Operation::Videos, &[&user_id.to_string()], page, page_size)
    }

    pub fn get_video<U: Display, V: Display>(&self, user_id: U, video_id: V) -> Result<Value> {
        let ids = [user_id.to_string(), video_id.to_string()];
        self.call_json(Operation::Video, &[&ids[0], &ids[1]], &Params::default())
    }

    /// The user's activity stream as an Atom document.
    pub fn get_activities<U: Display>(&self, user_id: U, query: &ActivityQuery) -> Result<String> {
        let user_id = user_id.to_string();
        self.call_raw(Operation::Activities, &[&user_id], &query.params())
    }

    pub fn get_friends_activities<U: Display>(
        &self,
        user_id: U,
        query: &ActivityQuery,
    ) -> Result<String> {
        let user_id = user_id.to_string();
        self.call_raw(Operation::FriendsActivities, &[&user_id], &query.params())
    }

    pub fn get_indicators<U: Display>(&self, user_id: U) -> Result<Value> {
        self.call_user_json(Operation::Indicators, user_id)
    }

    /// Send an application notification to a set of users.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] when there are no recipients or the content
    /// is empty, in addition to the failures of [`ApiClient::call`].
    pub fn send_notification<A: Display>(
        &self,
        app_id: A,
        notification: &Notification,
    ) -> Result<Value> {
        if notification.content().is_empty() {
            return Err(Error::invalid_parameter("content", "cannot be None or empty"));
        }
        let app_id = app_id.to_string();
        let mut params = Params::default()
            .set("recipients", notification.recipient_ids().join(","))
            .set("templateParameters", notification.template_parameters());
        if !notification.media_items.is_empty() {
            params = params.set("mediaItems", json!(notification.media_items).to_string());
        }
        self.call_json(Operation::SendNotification, &[&app_id], &params)
    }

    fn call_user_json<U: Display>(&self, operation: Operation, user_id: U) -> Result<Value> {
        let user_id = user_id.to_string();
        self.call_json(operation, &[&user_id], &Params::default())
    }

    fn call_paged(
        &self,
        operation: Operation,
        ids: &[&str],
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Value> {
        let params = Params::default()
            .opt("page", page)
            .opt("page_size", page_size);
        self.call_json(operation, ids, &params)
    }
}

fn decode(descriptor: &EndpointDescriptor, status: u16, body: String) -> Result<ApiResponse> {
    if !descriptor.accepts_status(status) {
        tracing::warn!(
            operation = descriptor.name,
            status,
            "provider answered with a non-success status"
        );
        return Err(ApiError {
            message: API_ERROR_MESSAGE.to_string(),
            status,
            body,
        }
        .into());
    }
    match descriptor.response {
        ResponseKind::Raw => Ok(ApiResponse::Raw(body)),
        ResponseKind::Json => match serde_json::from_str(&body) {
            Ok(value) => Ok(ApiResponse::Json(value)),
            Err(source) => Err(Error::ResponseParse { source, body }),
        },
    }
}

fn join<I: Display>(items: &[I], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Named parameters in insertion order; absent values are never added.
#[derive(Debug, Default)]
struct Params(Vec<(&'static str, String)>);

impl Params {
    fn set<V: Display>(mut self, name: &'static str, value: V) -> Self {
        self.0.push((name, value.to_string()));
        self
    }

    fn opt<V: Display>(self, name: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    fn pairs(&self) -> Vec<(&str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }
}

/// Filters for the activity feeds. Unset fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub culture: Option<String>,
    pub activity_types: Option<String>,
    pub extensions: Option<String>,
    pub page_size: Option<i64>,
}

impl ActivityQuery {
    fn params(&self) -> Params {
        Params::default()
            .opt("culture", self.culture.as_deref())
            .opt("activityTypes", self.activity_types.as_deref())
            .opt("extensions", self.extensions.as_deref())
            .opt("pageSize", self.page_size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationButton {
    pub label: String,
    pub surface: String,
}

/// An application notification.
///
/// ```rust
/// use myspaceid::Notification;
///
/// let notification = Notification::new("You have a new gift!")
///     .recipient(1234567)
///     .button0("Open", "canvas");
/// assert!(notification.template_parameters().contains("button0_label"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    recipients: Vec<String>,
    content: String,
    button0: NotificationButton,
    button1: NotificationButton,
    media_items: Vec<String>,
}

impl Notification {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Notification {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn recipient<R: Display>(mut self, user_id: R) -> Self {
        self.recipients.push(user_id.to_string());
        self
    }

    pub fn recipients<I, R>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Display,
    {
        self.recipients
            .extend(user_ids.into_iter().map(|id| id.to_string()));
        self
    }

    /// An empty `surface` falls back to `canvas`.
    pub fn button0<L: Into<String>, S: Into<String>>(mut self, label: L, surface: S) -> Self {
        self.button0 = NotificationButton {
            label: label.into(),
            surface: surface.into(),
        };
        self
    }

    /// An empty `surface` falls back to `canvas`.
    pub fn button1<L: Into<String>, S: Into<String>>(mut self, label: L, surface: S) -> Self {
        self.button1 = NotificationButton {
            label: label.into(),
            surface: surface.into(),
        };
        self
    }

    pub fn media_item<M: Into<String>>(mut self, uri: M) -> Self {
        self.media_items.push(uri.into());
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn recipient_ids(&self) -> &[String] {
        &self.recipients
    }

    /// JSON array of `{"key", "value"}` objects sent as `templateParameters`.
    ///
    /// A button appears only when its label is non-empty.
    pub fn template_parameters(&self) -> String {
        let mut entries = vec![json!({"key": "content", "value": self.content})];
        for (prefix, button) in [("button0", &self.button0), ("button1", &self.button1)].iter() {
            if button.label.is_empty() {
                continue;
            }
            let surface = if button.surface.is_empty() {
                DEFAULT_BUTTON_SURFACE
            } else {
                button.surface.as_str()
            };
            entries.push(json!({"key": format!("{}_surface", prefix), "value": surface}));
            entries.push(json!({"key": format!("{}_label", prefix), "value": button.label}));
        }
        Value::Array(entries).to_string()
    }
}
