use std::fmt;
use std::str::FromStr;

use crate::domain::account::models::Role;
use crate::domain::authorization::errors::PolicyError;

/// Operation a request performs on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Only meaningful in rules: stands for every action.
    Any,
}

impl Action {
    /// Whether a rule carrying this action applies to `requested`.
    pub fn covers(&self, requested: Action) -> bool {
        *self == Action::Any || *self == requested
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Any => "*",
        }
    }
}

impl FromStr for Action {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "*" | "any" => Ok(Action::Any),
            other => Err(PolicyError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule does to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    Allow,
    Deny,
}

impl FromStr for Effect {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            other => Err(PolicyError::UnknownEffect(other.to_string())),
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
    Wildcard,
    Rest,
}

/// Slash-separated path pattern.
///
/// `:name` and `*` match exactly one segment. A `*` in last position matches
/// one or more remaining segments. Empty segments are ignored on both sides,
/// so `/api/accounts/` and `/api/accounts` are the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePattern {
    segments: Vec<Segment>,
}

impl ResourcePattern {
    /// Parse a pattern.
    ///
    /// # Errors
    /// * `InvalidPattern` - The pattern does not start with `/`
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        if !raw.starts_with('/') {
            return Err(PolicyError::InvalidPattern(raw.to_string()));
        }

        let parts: Vec<&str> = split_path(raw).collect();
        let last = parts.len().saturating_sub(1);

        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| match *part {
                "*" if i == last => Segment::Rest,
                "*" => Segment::Wildcard,
                p if p.starts_with(':') => Segment::Param,
                p => Segment::Literal(p.to_string()),
            })
            .collect();

        Ok(Self { segments })
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path).collect();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest => return parts.len() > i,
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return false;
                    }
                }
                Segment::Param | Segment::Wildcard => {
                    if parts.get(i).is_none() {
                        return false;
                    }
                }
            }
        }

        parts.len() == self.segments.len()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// One row of the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub role: Role,
    pub resource: ResourcePattern,
    pub action: Action,
    pub effect: Effect,
}

impl PolicyRule {
    /// Build a rule from its textual form, e.g. `("admin", "/api/accounts/*", "*", "allow")`.
    ///
    /// # Errors
    /// * `UnknownRole` - Role is not `member` or `admin`
    /// * `InvalidPattern` - Resource does not start with `/`
    /// * `UnknownAction` / `UnknownEffect` - Unrecognised keyword
    pub fn parse(role: &str, resource: &str, action: &str, effect: &str) -> Result<Self, PolicyError> {
        Ok(Self {
            role: role
                .parse()
                .map_err(|_| PolicyError::UnknownRole(role.to_string()))?,
            resource: ResourcePattern::parse(resource)?,
            action: action.parse()?,
            effect: effect.parse()?,
        })
    }

    pub fn applies_to(&self, path: &str, action: Action) -> bool {
        self.action.covers(action) && self.resource.matches(path)
    }
}
