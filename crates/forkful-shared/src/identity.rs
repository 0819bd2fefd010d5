//! Roles, email normalization and registration rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{validate_restaurant, RestaurantDraft, RestaurantInput};
use crate::constants::MIN_PASSWORD_LEN;
use crate::validation::{non_blank, ValidationErrors};

/// The three account roles. Assigned once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// The single normalization applied to every email crossing a boundary:
/// surrounding whitespace removed, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Decide the role for a new account.
///
/// The configured admin email always wins; otherwise only `customer` and
/// `owner` may be requested. `admin` cannot be self-requested.
pub fn assign_role(
    email: &str,
    requested: Option<&str>,
    admin_email: Option<&str>,
) -> Result<Role, ValidationErrors> {
    let email = normalize_email(email);
    if let Some(admin) = admin_email {
        if !email.is_empty() && normalize_email(admin) == email {
            return Ok(Role::Admin);
        }
    }

    match requested.map(str::trim) {
        Some("customer") => Ok(Role::Customer),
        Some("owner") => Ok(Role::Owner),
        _ => Err(ValidationErrors::single("role", "Invalid Role")),
    }
}

/// Registration body as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub restaurant_name: Option<String>,
    pub restaurant_address: Option<String>,
    pub restaurant_description: Option<String>,
    pub restaurant_phone: Option<String>,
}

/// A registration that passed every rule. The password is still plain text;
/// hashing happens right before persistence.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub restaurant: Option<RestaurantDraft>,
}

pub fn validate_registration(
    input: &RegistrationInput,
    admin_email: Option<&str>,
) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = non_blank(input.name.as_deref());
    if name.is_none() {
        errors.push("name", "Name is required");
    }

    let email = non_blank(input.email.as_deref()).map(|e| normalize_email(&e));
    match &email {
        None => errors.push("email", "Email is required"),
        Some(e) if !looks_like_email(e) => errors.push("email", "Email is not valid"),
        _ => {}
    }

    let password = input.password.clone().unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
        );
    }

    let role = match assign_role(
        email.as_deref().unwrap_or_default(),
        input.role.as_deref(),
        admin_email,
    ) {
        Ok(role) => Some(role),
        Err(e) => {
            errors.extend(e);
            None
        }
    };

    // Owners register together with their first restaurant.
    let mut restaurant = None;
    if role == Some(Role::Owner) {
        let bundle = RestaurantInput {
            name: input.restaurant_name.clone(),
            description: input.restaurant_description.clone(),
            address: input.restaurant_address.clone(),
            phone: input.restaurant_phone.clone(),
        };
        match validate_restaurant(&bundle, true) {
            Ok(draft) => restaurant = Some(draft),
            Err(e) => errors.extend(e.map_fields(|field| {
                let mut chars = field.chars();
                match chars.next() {
                    Some(first) => format!("restaurant{}{}", first.to_uppercase(), chars.as_str()),
                    None => "restaurant".to_string(),
                }
            })),
        }
    }

    match (name, email, role) {
        (Some(name), Some(email), Some(role)) if errors.is_empty() => Ok(Registration {
            name,
            email,
            password,
            role,
            restaurant,
        }),
        _ => Err(errors),
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
