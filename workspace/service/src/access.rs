//! Declarative route access table.
//!
//! Enforcement lives in the HTTP layer; this module only answers "which rule
//! applies to this path" and "may this role pass it".

use model::entities::account::Role;

/// Who may reach the paths covered by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No session needed.
    Public,
    /// Any logged-in account, whatever its role.
    Authenticated,
    /// Logged-in accounts holding one of these roles.
    Roles(&'static [Role]),
}

/// Route pattern to required access.
///
/// Patterns are either exact paths (`/api/v1/dashboard`) or a prefix followed by
/// `/**`, which covers the prefix itself and everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRule {
    pub pattern: &'static str,
    pub access: Access,
}

/// Outcome of checking a request against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// A session is required and none was presented.
    Unauthenticated,
    /// The session's role is not in the rule's role set.
    Forbidden,
}

const ADMIN_ONLY: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Secretaria];

/// The access table, evaluated top to bottom; the first matching rule wins.
pub const ACCESS_RULES: &[AccessRule] = &[
    AccessRule { pattern: "/health", access: Access::Public },
    AccessRule { pattern: "/metrics", access: Access::Public },
    AccessRule { pattern: "/swagger-ui/**", access: Access::Public },
    AccessRule { pattern: "/api-docs/**", access: Access::Public },
    AccessRule { pattern: "/api/v1/auth/**", access: Access::Public },
    AccessRule { pattern: "/api/v1/courses/**", access: Access::Roles(ADMIN_ONLY) },
    AccessRule { pattern: "/api/v1/students/**", access: Access::Roles(STAFF) },
    AccessRule { pattern: "/api/v1/dashboard", access: Access::Roles(STAFF) },
    AccessRule { pattern: "/api/**", access: Access::Authenticated },
    AccessRule { pattern: "/**", access: Access::Authenticated },
];

impl AccessRule {
    pub fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix("/**") {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

impl Access {
    pub fn check(&self, role: Option<Role>) -> Decision {
        match (self, role) {
            (Access::Public, _) => Decision::Allow,
            (_, None) => Decision::Unauthenticated,
            (Access::Authenticated, Some(_)) => Decision::Allow,
            (Access::Roles(roles), Some(role)) if roles.contains(&role) => Decision::Allow,
            (Access::Roles(_), Some(_)) => Decision::Forbidden,
        }
    }
}

/// First rule of [`ACCESS_RULES`] matching `path`.
pub fn rule_for(path: &str) -> &'static AccessRule {
    // A trailing slash addresses the same resource.
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    ACCESS_RULES
        .iter()
        .find(|rule| rule.matches(path))
        .unwrap_or(&ACCESS_RULES[ACCESS_RULES.len() - 1])
}

/// Decides whether a request to `path` made with `role` (or no session) may pass.
pub fn authorize(path: &str, role: Option<Role>) -> Decision {
    rule_for(path).access.check(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths_need_no_session() {
        assert_eq!(authorize("/health", None), Decision::Allow);
        assert_eq!(authorize("/api/v1/auth/login", None), Decision::Allow);
        assert_eq!(authorize("/api/v1/auth/register", None), Decision::Allow);
        assert_eq!(authorize("/swagger-ui/index.html", None), Decision::Allow);
        assert_eq!(authorize("/api-docs/openapi.json", None), Decision::Allow);
    }

    #[test]
    fn test_courses_are_admin_only() {
        assert_eq!(authorize("/api/v1/courses", Some(Role::Admin)), Decision::Allow);
        assert_eq!(authorize("/api/v1/courses/3/students", Some(Role::Admin)), Decision::Allow);
        assert_eq!(authorize("/api/v1/courses", Some(Role::Secretaria)), Decision::Forbidden);
        assert_eq!(authorize("/api/v1/courses/3", None), Decision::Unauthenticated);
    }

    #[test]
    fn test_students_and_dashboard_open_to_both_roles() {
        for role in [Role::Admin, Role::Secretaria] {
            assert_eq!(authorize("/api/v1/students", Some(role)), Decision::Allow);
            assert_eq!(authorize("/api/v1/students/0102/course", Some(role)), Decision::Allow);
            assert_eq!(authorize("/api/v1/dashboard", Some(role)), Decision::Allow);
        }
        assert_eq!(authorize("/api/v1/students", None), Decision::Unauthenticated);
        assert_eq!(authorize("/api/v1/dashboard", None), Decision::Unauthenticated);
    }

    #[test]
    fn test_prefix_pattern_does_not_match_sibling_names() {
        // "/api/v1/coursesX" is not below "/api/v1/courses"
        let rule = rule_for("/api/v1/coursesX");
        assert_eq!(rule.pattern, "/api/**");
        assert_eq!(authorize("/api/v1/coursesX", Some(Role::Secretaria)), Decision::Allow);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert_eq!(rule_for("/api/v1/courses/").pattern, "/api/v1/courses/**");
        assert_eq!(authorize("/api/v1/dashboard/", Some(Role::Secretaria)), Decision::Allow);
    }

    #[test]
    fn test_unlisted_paths_require_a_session() {
        assert_eq!(rule_for("/anything").pattern, "/**");
        assert_eq!(rule_for("/").pattern, "/**");
        assert_eq!(authorize("/anything", None), Decision::Unauthenticated);
        assert_eq!(authorize("/anything", Some(Role::Secretaria)), Decision::Allow);
    }
}
