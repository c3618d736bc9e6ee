use std::collections::HashMap;

use crate::domain::account::models::Role;
use crate::domain::authorization::errors::PolicyError;
use crate::domain::authorization::models::Action;
use crate::domain::authorization::models::Decision;
use crate::domain::authorization::models::Effect;
use crate::domain::authorization::models::PolicyRule;

/// Rules shipped with the service when configuration provides none.
///
/// Members may read single accounts. Admins may do anything under
/// `/api/accounts` and read accounts over RPC.
pub const DEFAULT_RULES: &[(&str, &str, &str, &str)] = &[
    ("member", "/api/accounts/:account_id", "read", "allow"),
    ("member", "/account.AccountService/GetAccount", "read", "allow"),
    ("admin", "/api/accounts", "*", "allow"),
    ("admin", "/api/accounts/*", "*", "allow"),
    ("admin", "/account.AccountService/GetAccount", "read", "allow"),
];

/// Role-keyed access policy, read-only once built.
///
/// Evaluation is deny-overrides and fail-closed: any matching `Deny` rejects,
/// otherwise any matching `Allow` admits, otherwise the request is rejected.
#[derive(Debug, Clone)]
pub struct PolicyTable {
    rules: HashMap<Role, Vec<PolicyRule>>,
}

impl PolicyTable {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        let mut by_role: HashMap<Role, Vec<PolicyRule>> = HashMap::new();
        for rule in rules {
            by_role.entry(rule.role).or_default().push(rule);
        }

        Self { rules: by_role }
    }

    /// Build a table from textual rules.
    ///
    /// # Errors
    /// Fails on the first rule that does not parse.
    pub fn from_rules<'a, I>(rules: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str, &'a str)>,
    {
        let rules = rules
            .into_iter()
            .map(|(role, resource, action, effect)| {
                PolicyRule::parse(role, resource, action, effect)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules))
    }

    /// Evaluate the table for one request.
    pub fn enforce(&self, role: Role, path: &str, action: Action) -> Decision {
        let mut allowed = false;

        for rule in self.rules.get(&role).into_iter().flatten() {
            if !rule.applies_to(path, action) {
                continue;
            }
            match rule.effect {
                Effect::Deny => return Decision::Deny,
                Effect::Allow => allowed = true,
            }
        }

        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    /// Total number of rules across all roles.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .filter_map(|(role, resource, action, effect)| {
                PolicyRule::parse(role, resource, action, effect).ok()
            })
            .collect();

        Self::new(rules)
    }
}
