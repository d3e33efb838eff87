use lodge_core::UserId;
use serde::{Deserialize, Serialize};

/// Which page a piece of content belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentName {
    /// Administrator landing page.
    #[default]
    AdminHome,
    /// Member landing page.
    MemberHome,
}

impl ContentName {
    /// Wire name, also used as the projection entity id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdminHome => "ADMIN_HOME",
            Self::MemberHome => "MEMBER_HOME",
        }
    }
}

/// New content was published for a page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContentPayload {
    /// Aggregate version the client last observed.
    pub for_version: i64,
    /// Page the content belongs to.
    pub name: ContentName,
    /// Content template text.
    pub template: String,
    /// Administrator comment.
    pub comment: String,
    /// When the request was made.
    pub create_date_time: String,
    /// User who made the request.
    pub author_user_id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_matches_serde() {
        for name in [ContentName::AdminHome, ContentName::MemberHome] {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{}\"", name.as_str()));
        }
    }
}
