use serde::{Deserialize, Serialize};

/// Account roles. Fixed at signup, immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Applicant,
    AppComm,
    DisComm,
    Admin,
}

impl Role {
    /// Canonical storage/display form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Applicant => "Applicant",
            Role::AppComm => "AppComm",
            Role::DisComm => "DisComm",
            Role::Admin => "Admin",
        }
    }

    /// Parse a role name case-insensitively. Signup/login routes carry the
    /// role as a lowercase path segment.
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "applicant" => Some(Role::Applicant),
            "appcomm" => Some(Role::AppComm),
            "discomm" => Some(Role::DisComm),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or(())
    }
}

/// Route capabilities and the roles permitted to exercise them.
///
/// One declarative table checked once per request, instead of allow-lists
/// scattered across route definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Submit a new grant application.
    SubmitApplication,
    /// List, inspect, and transition applications.
    ReviewApplications,
    /// Read and write comments on an application.
    Discuss,
}

impl Capability {
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Capability::SubmitApplication => &[Role::Applicant],
            Capability::ReviewApplications => &[Role::AppComm, Role::DisComm, Role::Admin],
            Capability::Discuss => &[Role::Applicant, Role::AppComm, Role::DisComm, Role::Admin],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}
