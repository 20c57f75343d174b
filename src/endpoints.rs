//! Static endpoint table.
//!
//! Every API operation is described once: URL template, verb, the schema of
//! its path slots and named parameters, the shape of its response and the
//! statuses that count as success. [`crate::validation`] and
//! [`crate::ApiClient`] consult this table and nothing else.

use std::fmt;

use http::Method;
use url::Url;

pub const REQUEST_TOKEN_PATH: &str = "/request_token";
pub const AUTHORIZATION_PATH: &str = "/authorize";
pub const ACCESS_TOKEN_PATH: &str = "/access_token";

pub const LIST_VALUES: &[&str] = &["top", "online", "app"];
pub const SHOW_VALUES: &[&str] = &["mood", "status", "online"];
pub const DETAIL_TYPES: &[&str] = &["basic", "full", "extended"];
pub const PRIVACY_VALUES: &[&str] = &["Everyone", "FriendsOnly", "Me"];

const OK: &[u16] = &[200];
const CREATED: &[u16] = &[200, 201];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UserInfo,
    Profile,
    Friends,
    Friendship,
    Mood,
    Moods,
    SetMood,
    Photos,
    Photo,
    Albums,
    Album,
    CreateAlbum,
    Status,
    SetStatus,
    Videos,
    Video,
    Activities,
    FriendsActivities,
    Indicators,
    SendNotification,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::UserInfo,
        Operation::Profile,
        Operation::Friends,
        Operation::Friendship,
        Operation::Mood,
        Operation::Moods,
        Operation::SetMood,
        Operation::Photos,
        Operation::Photo,
        Operation::Albums,
        Operation::Album,
        Operation::CreateAlbum,
        Operation::Status,
        Operation::SetStatus,
        Operation::Videos,
        Operation::Video,
        Operation::Activities,
        Operation::FriendsActivities,
        Operation::Indicators,
        Operation::SendNotification,
    ];

    pub fn descriptor(self) -> &'static EndpointDescriptor {
        match self {
            Operation::UserInfo => &USER_INFO,
            Operation::Profile => &PROFILE,
            Operation::Friends => &FRIENDS,
            Operation::Friendship => &FRIENDSHIP,
            Operation::Mood => &MOOD,
            Operation::Moods => &MOODS,
            Operation::SetMood => &SET_MOOD,
            Operation::Photos => &PHOTOS,
            Operation::Photo => &PHOTO,
            Operation::Albums => &ALBUMS,
            Operation::Album => &ALBUM,
            Operation::CreateAlbum => &CREATE_ALBUM,
            Operation::Status => &STATUS,
            Operation::SetStatus => &SET_STATUS,
            Operation::Videos => &VIDEOS,
            Operation::Video => &VIDEO,
            Operation::Activities => &ACTIVITIES,
            Operation::FriendsActivities => &FRIENDS_ACTIVITIES,
            Operation::Indicators => &INDICATORS,
            Operation::SendNotification => &SEND_NOTIFICATION,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    /// Tunneled as POST with `X-HTTP-Method-Override: PUT`.
    Put,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    /// Body handed back untouched.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Positive integer.
    Identifier,
    NonNegative,
    OneOf(&'static [&'static str]),
    /// `|`-joined subset of the listed values.
    SubsetOf(&'static [&'static str]),
    /// Non-negative integers joined by the separator.
    IdList(char),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
    pub rule: Rule,
}

const fn required(name: &'static str, rule: Rule) -> ParamSpec {
    ParamSpec {
        name,
        required: true,
        rule,
    }
}

const fn optional(name: &'static str, rule: Rule) -> ParamSpec {
    ParamSpec {
        name,
        required: false,
        rule,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: &'static str,
    pub verb: Verb,
    /// Path relative to the API root, one `%s` per entry of `path_ids`.
    pub template: &'static str,
    pub path_ids: &'static [ParamSpec],
    pub params: &'static [ParamSpec],
    pub response: ResponseKind,
    pub success: &'static [u16],
}

impl EndpointDescriptor {
    /// Fill the `%s` slots in order and resolve against `api_root`.
    ///
    /// `ids` must already be validated; they are inserted verbatim.
    pub fn url(&self, api_root: &Url, ids: &[&str]) -> String {
        let mut path = String::with_capacity(self.template.len() + 16);
        let mut ids = ids.iter();
        let mut pieces = self.template.split("%s").peekable();
        while let Some(piece) = pieces.next() {
            path.push_str(piece);
            if pieces.peek().is_some() {
                path.push_str(ids.next().copied().unwrap_or_default());
            }
        }
        format!("{}{}", api_root.as_str().trim_end_matches('/'), path)
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|spec| spec.name == name)
    }

    pub fn accepts_status(&self, status: u16) -> bool {
        self.success.contains(&status)
    }
}

const USER_ID: ParamSpec = required("user_id", Rule::Identifier);

const USER: &[ParamSpec] = &[USER_ID];
const PAGING: &[ParamSpec] = &[
    optional("page", Rule::NonNegative),
    optional("page_size", Rule::NonNegative),
];
const ACTIVITY_FILTERS: &[ParamSpec] = &[
    optional("culture", Rule::Text),
    optional("activityTypes", Rule::Text),
    optional("extensions", Rule::Text),
    optional("pageSize", Rule::NonNegative),
];

static USER_INFO: EndpointDescriptor = EndpointDescriptor {
    name: "user_info",
    verb: Verb::Get,
    template: "/v1/user.json",
    path_ids: &[],
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static PROFILE: EndpointDescriptor = EndpointDescriptor {
    name: "profile",
    verb: Verb::Get,
    template: "/v1/users/%s/profile.json",
    path_ids: USER,
    params: &[optional("detailtype", Rule::OneOf(DETAIL_TYPES))],
    response: ResponseKind::Json,
    success: OK,
};

static FRIENDS: EndpointDescriptor = EndpointDescriptor {
    name: "friends",
    verb: Verb::Get,
    template: "/v1/users/%s/friends.json",
    path_ids: USER,
    params: &[
        optional("page", Rule::NonNegative),
        optional("page_size", Rule::NonNegative),
        optional("list", Rule::OneOf(LIST_VALUES)),
        optional("show", Rule::SubsetOf(SHOW_VALUES)),
    ],
    response: ResponseKind::Json,
    success: OK,
};

static FRIENDSHIP: EndpointDescriptor = EndpointDescriptor {
    name: "friendship",
    verb: Verb::Get,
    template: "/v1/users/%s/friends/%s.json",
    path_ids: &[USER_ID, required("friend_ids", Rule::IdList(';'))],
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static MOOD: EndpointDescriptor = EndpointDescriptor {
    name: "mood",
    verb: Verb::Get,
    template: "/v1/users/%s/mood.json",
    path_ids: USER,
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static MOODS: EndpointDescriptor = EndpointDescriptor {
    name: "moods",
    verb: Verb::Get,
    template: "/v1/users/%s/moods.json",
    path_ids: USER,
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static SET_MOOD: EndpointDescriptor = EndpointDescriptor {
    name: "set_mood",
    verb: Verb::Put,
    template: "/v1/users/%s/mood.json",
    path_ids: USER,
    params: &[required("mood", Rule::NonNegative)],
    response: ResponseKind::Raw,
    success: OK,
};

static PHOTOS: EndpointDescriptor = EndpointDescriptor {
    name: "photos",
    verb: Verb::Get,
    template: "/v1/users/%s/photos.json",
    path_ids: USER,
    params: PAGING,
    response: ResponseKind::Json,
    success: OK,
};

static PHOTO: EndpointDescriptor = EndpointDescriptor {
    name: "photo",
    verb: Verb::Get,
    template: "/v1/users/%s/photos/%s.json",
    path_ids: &[USER_ID, required("photo_id", Rule::Identifier)],
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static ALBUMS: EndpointDescriptor = EndpointDescriptor {
    name: "albums",
    verb: Verb::Get,
    template: "/v1/users/%s/albums.json",
    path_ids: USER,
    params: PAGING,
    response: ResponseKind::Json,
    success: OK,
};

static ALBUM: EndpointDescriptor = EndpointDescriptor {
    name: "album",
    verb: Verb::Get,
    template: "/v1/users/%s/albums/%s/photos.json",
    path_ids: &[USER_ID, required("album_id", Rule::Identifier)],
    params: PAGING,
    response: ResponseKind::Json,
    success: OK,
};

static CREATE_ALBUM: EndpointDescriptor = EndpointDescriptor {
    name: "create_album",
    verb: Verb::Post,
    template: "/v1/users/%s/albums.json",
    path_ids: USER,
    params: &[
        required("title", Rule::Text),
        optional("location", Rule::Text),
        optional("privacy", Rule::OneOf(PRIVACY_VALUES)),
    ],
    response: ResponseKind::Json,
    success: CREATED,
};

static STATUS: EndpointDescriptor = EndpointDescriptor {
    name: "status",
    verb: Verb::Get,
    template: "/v1/users/%s/status.json",
    path_ids: USER,
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static SET_STATUS: EndpointDescriptor = EndpointDescriptor {
    name: "set_status",
    verb: Verb::Put,
    template: "/v1/users/%s/status.json",
    path_ids: USER,
    params: &[required("status", Rule::Text)],
    response: ResponseKind::Raw,
    success: OK,
};

static VIDEOS: EndpointDescriptor = EndpointDescriptor {
    name: "videos",
    verb: Verb::Get,
    template: "/v1/users/%s/videos.json",
    path_ids: USER,
    params: PAGING,
    response: ResponseKind::Json,
    success: OK,
};

static VIDEO: EndpointDescriptor = EndpointDescriptor {
    name: "video",
    verb: Verb::Get,
    template: "/v1/users/%s/videos/%s.json",
    path_ids: &[USER_ID, required("video_id", Rule::Identifier)],
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static ACTIVITIES: EndpointDescriptor = EndpointDescriptor {
    name: "activities",
    verb: Verb::Get,
    template: "/v1/users/%s/activities.atom",
    path_ids: USER,
    params: ACTIVITY_FILTERS,
    response: ResponseKind::Raw,
    success: OK,
};

static FRIENDS_ACTIVITIES: EndpointDescriptor = EndpointDescriptor {
    name: "friends_activities",
    verb: Verb::Get,
    template: "/v1/users/%s/friends/activities.atom",
    path_ids: USER,
    params: ACTIVITY_FILTERS,
    response: ResponseKind::Raw,
    success: OK,
};

static INDICATORS: EndpointDescriptor = EndpointDescriptor {
    name: "indicators",
    verb: Verb::Get,
    template: "/v1/users/%s/indicators.json",
    path_ids: USER,
    params: &[],
    response: ResponseKind::Json,
    success: OK,
};

static SEND_NOTIFICATION: EndpointDescriptor = EndpointDescriptor {
    name: "send_notification",
    verb: Verb::Post,
    template: "/v1/applications/%s/notifications.json",
    path_ids: &[required("app_id", Rule::Identifier)],
    params: &[
        required("recipients", Rule::IdList(',')),
        required("templateParameters", Rule::Text),
        optional("mediaItems", Rule::Text),
    ],
    response: ResponseKind::Json,
    success: CREATED,
};
