use std::fmt;
use std::str::FromStr;

/// Lifecycle of a [`crate::GenerationRequest`]. See spec §3/§4.6 for the
/// target progress range associated with each state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    GeneratingScript,
    GeneratingVoice,
    GeneratingVideo,
    Compositing,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::GeneratingScript => "generating_script",
            Self::GeneratingVoice => "generating_voice",
            Self::GeneratingVideo => "generating_video",
            Self::Compositing => "compositing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal statuses never transition further (G2/G3).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "generating_script" => Ok(Self::GeneratingScript),
            "generating_voice" => Ok(Self::GeneratingVoice),
            "generating_video" => Ok(Self::GeneratingVideo),
            "compositing" => Ok(Self::Compositing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("invalid generation status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    AiGenerated,
    UserProvided,
    Template,
}

impl ScriptType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AiGenerated => "ai_generated",
            Self::UserProvided => "user_provided",
            Self::Template => "template",
        }
    }

    /// G1: these variants require non-empty `scriptContent` at submission.
    pub const fn requires_script_content(self) -> bool {
        matches!(self, Self::UserProvided | Self::Template)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ai_generated" => Ok(Self::AiGenerated),
            "user_provided" => Ok(Self::UserProvided),
            "template" => Ok(Self::Template),
            other => Err(format!("invalid script type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("invalid visibility: {other}")),
        }
    }
}

/// A [`crate::Video`]'s own visibility, distinct from the request's
/// public/private choice (spec §3 Invariant V1): every newly inserted video
/// starts `pending_review` regardless of what was requested, and only
/// moderation can move it to `public`/`private`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoVisibility {
    Public,
    Private,
    PendingReview,
}

impl VideoVisibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::PendingReview => "pending_review",
        }
    }
}

impl fmt::Display for VideoVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoVisibility {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "pending_review" => Ok(Self::PendingReview),
            other => Err(format!("invalid video visibility: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionType {
    Purchase,
    GenerationSpend,
    PrivateSurcharge,
    Refund,
}

impl CreditTransactionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::GenerationSpend => "generation_spend",
            Self::PrivateSurcharge => "private_surcharge",
            Self::Refund => "refund",
        }
    }
}

impl fmt::Display for CreditTransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditTransactionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "generation_spend" => Ok(Self::GenerationSpend),
            "private_surcharge" => Ok(Self::PrivateSurcharge),
            "refund" => Ok(Self::Refund),
            other => Err(format!("invalid credit transaction type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("invalid moderation status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("invalid role: {other}")),
        }
    }
}
