use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Event sent host → skill when a skill dialog starts.
pub const SKILL_BEGIN_EVENT: &str = "skillBegin";
/// Event sent skill → host asking the host to obtain a user token.
pub const TOKEN_REQUEST_EVENT: &str = "tokenRequest";
/// Event carrying a token payload, in either direction.
pub const TOKEN_RESPONSE_EVENT: &str = "tokenResponse";

/// Kind of a conversational activity.
///
/// Serialized as its camelCase wire name. Types this crate does not model
/// keep their original name in `Other`, so relaying them is lossless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    Message,
    Event,
    Trace,
    EndOfConversation,
    Typing,
    ConversationUpdate,
    Invoke,
    Other(String),
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Event => "event",
            ActivityType::Trace => "trace",
            ActivityType::EndOfConversation => "endOfConversation",
            ActivityType::Typing => "typing",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::Invoke => "invoke",
            ActivityType::Other(name) => name,
        }
    }
}

impl From<String> for ActivityType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "message" => ActivityType::Message,
            "event" => ActivityType::Event,
            "trace" => ActivityType::Trace,
            "endOfConversation" => ActivityType::EndOfConversation,
            "typing" => ActivityType::Typing,
            "conversationUpdate" => ActivityType::ConversationUpdate,
            "invoke" => ActivityType::Invoke,
            _ => ActivityType::Other(name),
        }
    }
}

impl From<ActivityType> for String {
    fn from(kind: ActivityType) -> Self {
        match kind {
            ActivityType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a participant (user, bot, or skill).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }
}

/// Conversation an activity belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One unit of conversational exchange.
///
/// Serializes to the camelCase JSON shape skills expect on the wire. Fields
/// this struct does not model (attachments, entities, channel data, ...) are
/// kept in `extra` so activities relayed from a skill reach the user intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Activity {
    /// Create an empty activity of the given type.
    pub fn new(activity_type: ActivityType) -> Self {
        Self {
            activity_type,
            id: None,
            timestamp: None,
            service_url: None,
            channel_id: None,
            from: None,
            recipient: None,
            conversation: None,
            reply_to_id: None,
            name: None,
            value: None,
            text: None,
            speak: None,
            locale: None,
            extra: Default::default(),
        }
    }

    /// Create a text message.
    pub fn message(text: impl Into<String>) -> Self {
        let mut activity = Self::new(ActivityType::Message);
        activity.text = Some(text.into());
        activity
    }

    /// Create a named event.
    pub fn event(name: impl Into<String>, value: Option<Value>) -> Self {
        let mut activity = Self::new(ActivityType::Event);
        activity.name = Some(name.into());
        activity.value = value;
        activity
    }

    /// Create a trace activity (shown in emulators, not to end users).
    pub fn trace(text: impl Into<String>) -> Self {
        let mut activity = Self::new(ActivityType::Trace);
        activity.text = Some(text.into());
        activity
    }

    pub fn end_of_conversation() -> Self {
        Self::new(ActivityType::EndOfConversation)
    }

    /// Build the `skillBegin` event for a triggering activity.
    ///
    /// Only routing fields are carried over: channel, sender, recipient and
    /// conversation id.
    pub fn skill_begin(triggering: &Activity, slots: Option<Value>) -> Self {
        let mut begin = Self::event(SKILL_BEGIN_EVENT, slots);
        begin.id = Some(Uuid::new_v4().to_string());
        begin.timestamp = Some(Utc::now());
        begin.channel_id = triggering.channel_id.clone();
        begin.from = triggering.from.clone();
        begin.recipient = triggering.recipient.clone();
        begin.conversation = triggering
            .conversation
            .as_ref()
            .map(|c| ConversationAccount::new(c.id.clone()));
        begin
    }

    /// Create a reply addressed back to the sender of this activity.
    pub fn create_reply(&self) -> Self {
        let mut reply = Self::new(ActivityType::Message);
        reply.timestamp = Some(Utc::now());
        reply.from = self.recipient.clone();
        reply.recipient = self.from.clone();
        reply.reply_to_id = self.id.clone();
        reply.service_url = self.service_url.clone();
        reply.channel_id = self.channel_id.clone();
        reply.conversation = self.conversation.clone();
        reply.locale = self.locale.clone();
        reply
    }

    /// Copy of this activity re-purposed as a `tokenResponse` event.
    ///
    /// The original is left untouched; every correlation field (ids,
    /// conversation, channel, sender) is kept on the copy.
    pub fn to_token_response(&self, token: &TokenResponse) -> crate::Result<Self> {
        let mut event = self.clone();
        event.activity_type = ActivityType::Event;
        event.name = Some(TOKEN_RESPONSE_EVENT.to_string());
        event.value = Some(serde_json::to_value(token)?);
        Ok(event)
    }

    pub fn is_end_of_conversation(&self) -> bool {
        self.activity_type == ActivityType::EndOfConversation
    }

    /// A token request is recognised by name alone, whatever the activity type.
    pub fn is_token_request(&self) -> bool {
        self.name.as_deref() == Some(TOKEN_REQUEST_EVENT)
    }

    pub fn is_trace(&self) -> bool {
        self.activity_type == ActivityType::Trace
    }

    /// Conversation id, if the activity carries one.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.id.as_str())
    }
}

/// A user token obtained by the auth sub-dialog, forwarded to the skill as
/// the value of a `tokenResponse` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// OAuth connection the token was issued for.
    pub connection_name: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    /// Identity provider behind the connection (e.g. "Azure Active Directory").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl TokenResponse {
    pub fn new(connection_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            connection_name: connection_name.into(),
            token: token.into(),
            expiration: None,
            provider: None,
        }
    }
}
