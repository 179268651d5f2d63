//! Role and environment keyed tables.
//!
//! `uses`, `sources` and `exports` on a package are all small fixed-shape
//! tables indexed by (role, environment). Keeping them as concrete structs
//! rather than nested maps makes every cell always present and cheap to walk.

use super::role::{Environment, Role};

/// A value per environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvTable<T> {
    pub client: T,
    pub server: T,
}

/// A value per (role, environment) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable<T> {
    pub use_role: EnvTable<T>,
    pub test: EnvTable<T>,
}

impl<T> EnvTable<T> {
    pub fn get(&self, env: Environment) -> &T {
        match env {
            Environment::Client => &self.client,
            Environment::Server => &self.server,
        }
    }

    pub fn get_mut(&mut self, env: Environment) -> &mut T {
        match env {
            Environment::Client => &mut self.client,
            Environment::Server => &mut self.server,
        }
    }
}

impl<T> RoleTable<T> {
    pub fn get(&self, role: Role, env: Environment) -> &T {
        match role {
            Role::Use => self.use_role.get(env),
            Role::Test => self.test.get(env),
        }
    }

    pub fn get_mut(&mut self, role: Role, env: Environment) -> &mut T {
        match role {
            Role::Use => self.use_role.get_mut(env),
            Role::Test => self.test.get_mut(env),
        }
    }

    /// Walk every cell in (role, environment) declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Role, Environment, &T)> {
        Role::ALL.into_iter().flat_map(move |role| {
            Environment::ALL
                .into_iter()
                .map(move |env| (role, env, self.get(role, env)))
        })
    }

    /// Apply a function to every cell
    pub fn for_each_mut(&mut self, mut f: impl FnMut(Role, Environment, &mut T)) {
        for role in Role::ALL {
            for env in Environment::ALL {
                f(role, env, self.get_mut(role, env));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_get_mut() {
        let mut table: RoleTable<Vec<&str>> = RoleTable::default();
        table.get_mut(Role::Use, Environment::Client).push("a");
        table.get_mut(Role::Test, Environment::Server).push("b");

        assert_eq!(table.get(Role::Use, Environment::Client), &vec!["a"]);
        assert_eq!(table.get(Role::Test, Environment::Server), &vec!["b"]);
        assert!(table.get(Role::Use, Environment::Server).is_empty());
    }

    #[test]
    fn test_iter_covers_all_cells() {
        let table: RoleTable<u32> = RoleTable::default();
        let cells: Vec<_> = table.iter().map(|(r, e, _)| (r, e)).collect();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], (Role::Use, Environment::Client));
        assert_eq!(cells[3], (Role::Test, Environment::Server));
    }

    #[test]
    fn test_for_each_mut() {
        let mut table: RoleTable<u32> = RoleTable::default();
        table.for_each_mut(|_, _, v| *v += 1);
        assert!(table.iter().all(|(_, _, v)| *v == 1));
    }
}
