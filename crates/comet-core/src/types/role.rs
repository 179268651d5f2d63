//! Role and environment enums.
//!
//! A dependency or source declaration is always made for a role (normal use
//! or the package's own test suite) and an environment (client or server).

use serde::{Deserialize, Serialize};

/// Purpose context for a dependency or source declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Normal usage of the package
    Use,
    /// The package's own test suite
    Test,
}

/// Execution context a file or dependency is loaded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Client,
    Server,
}

impl Role {
    /// All roles, in declaration order
    pub const ALL: [Role; 2] = [Role::Use, Role::Test];

    /// Lowercase name as it appears in descriptors
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Use => "use",
            Role::Test => "test",
        }
    }
}

impl Environment {
    /// All environments, in declaration order
    pub const ALL: [Environment; 2] = [Environment::Client, Environment::Server];

    /// Lowercase name as it appears in descriptors
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Client => "client",
            Environment::Server => "server",
        }
    }

    /// The other environment
    pub fn opposite(&self) -> Environment {
        match self {
            Environment::Client => Environment::Server,
            Environment::Server => Environment::Client,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
