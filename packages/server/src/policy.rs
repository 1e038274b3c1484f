//! Role-based authorization.
//!
//! Every access decision in the API goes through [`decide`], a pure function of
//! the caller, the institution owning the target resource and the action.

use common::Role;

/// Identity of an authenticated caller, as carried in the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
    pub institution_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCourse,
    /// Edit a course, its content, image and student list.
    ManageCourse,
    DeleteCourse,
    ManageInstitution,
    DeleteInstitution,
    /// Edit or delete a challenge.
    ManageChallenge,
    ListUsers,
    ListInstitutionUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// Decide whether `caller` may perform `action` on a resource owned by
/// `resource_institution` (`None` for resources with no institution scope).
pub fn decide(
    caller: Option<&Caller>,
    resource_institution: Option<i32>,
    action: Action,
) -> Decision {
    let Some(caller) = caller else {
        return Decision::Deny;
    };
    if caller.role == Role::Admin {
        return Decision::Allow;
    }

    let same_institution =
        resource_institution.is_some() && resource_institution == caller.institution_id;

    let allowed = match action {
        Action::CreateCourse | Action::ManageCourse | Action::ManageChallenge => {
            caller.role.is_institution_member() && same_institution
        }
        Action::DeleteCourse | Action::ManageInstitution | Action::ListInstitutionUsers => {
            caller.role == Role::InstitutionAdmin && same_institution
        }
        Action::ListUsers => caller.role == Role::InstitutionAdmin,
        Action::DeleteInstitution => false,
    };
    allowed.into()
}

/// Self-service check: the caller is `user_id` or a platform admin.
pub fn same_user_or_admin(caller: Option<&Caller>, user_id: i32) -> Decision {
    match caller {
        Some(c) => (c.role == Role::Admin || c.user_id == user_id).into(),
        None => Decision::Deny,
    }
}
