use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: u32,
    pub name: String,
    pub code: String,
    pub state: String,
    pub region: String,
    pub placement_rate: String, // "95%"
    pub faculties: u32,
    pub departments: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub university_id: u32,
    pub course: String,
    pub year: String, // "3rd Year"
    pub credit_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alumni {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub university_id: u32,
    pub graduation_year: String,
    pub current_company: String,
    pub expertise: Vec<String>,
    pub mentorship_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Verified,
    Unverified,
}

impl VerificationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "Verified",
            Self::Unverified => "Unverified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub industry: String,
    pub website: String,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    Pending,
    Approved,
    Rejected,
}

impl CertificateStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: String, // "CERT001"
    pub student_id: u32,
    pub certificate_type: String,
    pub status: CertificateStatus,
    pub upload_date: NaiveDate,
    pub approval_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u32,
    pub title: String,
    pub organizer_id: u32, // organization id
    pub date: NaiveDate,
    pub location: String,
    pub max_participants: u32,
    pub description: String,
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Students,
    Alumni,
    Admin,
    Organizations,
}

impl Audience {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Alumni => "alumni",
            Self::Admin => "admin",
            Self::Organizations => "organizations",
        }
    }

    /// The audience a logged-in user of this type reads from.
    pub const fn for_user_type(user_type: UserType) -> Self {
        match user_type {
            UserType::Student => Self::Students,
            UserType::Alumni => Self::Alumni,
            UserType::Admin => Self::Admin,
            UserType::Organization => Self::Organizations,
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "students" | "student" => Ok(Self::Students),
            "alumni" => Ok(Self::Alumni),
            "admin" => Ok(Self::Admin),
            "organizations" | "organization" => Ok(Self::Organizations),
            other => Err(format!(
                "unknown audience '{other}' (expected students, alumni, admin, organizations)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub audience: Audience,
    pub sent_at: NaiveDate,
}

/// Authentication role. Each variant owns one dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Alumni,
    Admin,
    Organization,
}

impl UserType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Alumni => "alumni",
            Self::Admin => "admin",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "alumni" => Ok(Self::Alumni),
            "admin" => Ok(Self::Admin),
            "organization" | "org" => Ok(Self::Organization),
            other => Err(format!(
                "unknown user type '{other}' (expected student, alumni, admin, organization)"
            )),
        }
    }
}

/// Synthetic identity handed out on admin login; not backed by a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admin {
    pub id: u32,
    pub name: String,
    pub email: String,
}

/// An authenticated user, carrying the record it was matched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum User {
    Student(Student),
    Alumni(Alumni),
    Admin(Admin),
    Organization(Organization),
}

impl User {
    pub const fn user_type(&self) -> UserType {
        match self {
            Self::Student(_) => UserType::Student,
            Self::Alumni(_) => UserType::Alumni,
            Self::Admin(_) => UserType::Admin,
            Self::Organization(_) => UserType::Organization,
        }
    }

    pub const fn id(&self) -> u32 {
        match self {
            Self::Student(s) => s.id,
            Self::Alumni(a) => a.id,
            Self::Admin(a) => a.id,
            Self::Organization(o) => o.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Student(s) => &s.name,
            Self::Alumni(a) => &a.name,
            Self::Admin(a) => &a.name,
            Self::Organization(o) => &o.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::Student(s) => &s.email,
            Self::Alumni(a) => &a.email,
            Self::Admin(a) => &a.email,
            Self::Organization(o) => &o.email,
        }
    }
}

/// Outcome of looking up a certificate for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    NotFound {
        id: String,
    },
    Pending,
    Rejected {
        reason: Option<String>,
    },
    Approved {
        certificate_type: String,
        student_name: Option<String>,
        university_name: Option<String>,
        approval_date: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_user_serializes_with_kind_tag() {
        let user = User::Admin(Admin {
            id: 1,
            name: "College Admin".to_string(),
            email: "admin@college.edu".to_string(),
        });
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["kind"], "admin");
        assert_eq!(json["name"], "College Admin");

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
        assert_eq!(back.user_type(), UserType::Admin);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(VerificationStatus::Verified.to_string(), "Verified");
        assert_eq!(VerificationStatus::Unverified.to_string(), "Unverified");
        assert_eq!(CertificateStatus::Rejected.to_string(), "Rejected");
    }

    #[test]
    fn test_parse_user_type_and_audience() {
        assert_eq!("Student".parse::<UserType>().unwrap(), UserType::Student);
        assert_eq!("org".parse::<UserType>().unwrap(), UserType::Organization);
        assert!("teacher".parse::<UserType>().is_err());

        assert_eq!("alumni".parse::<Audience>().unwrap(), Audience::Alumni);
        assert_eq!(
            "organizations".parse::<Audience>().unwrap(),
            Audience::Organizations
        );
        assert!("everyone".parse::<Audience>().is_err());
    }

    #[test]
    fn test_audience_for_user_type() {
        assert_eq!(Audience::for_user_type(UserType::Student), Audience::Students);
        assert_eq!(
            Audience::for_user_type(UserType::Organization),
            Audience::Organizations
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!CertificateStatus::Pending.is_terminal());
        assert!(CertificateStatus::Approved.is_terminal());
        assert!(CertificateStatus::Rejected.is_terminal());
        assert_eq!(CertificateStatus::Rejected.to_string(), "Rejected");
    }
}
