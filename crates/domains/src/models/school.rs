use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchoolType {
    #[serde(rename = "Federal Government College")]
    FederalGovernmentCollege,
    #[serde(rename = "Federal Government Girls College")]
    FederalGovernmentGirlsCollege,
    #[serde(rename = "Kings College")]
    KingsCollege,
    #[serde(rename = "Queens College")]
    QueensCollege,
    #[serde(rename = "Federal Science College")]
    FederalScienceCollege,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Mixed,
}

/// Geopolitical zone a school sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "North East")]
    NorthEast,
    #[serde(rename = "North Central")]
    NorthCentral,
    #[serde(rename = "North West")]
    NorthWest,
    #[serde(rename = "South West")]
    SouthWest,
    #[serde(rename = "South East")]
    SouthEast,
    #[serde(rename = "South South")]
    SouthSouth,
}

impl std::str::FromStr for Region {
    type Err = DomainError;

    /// Accepts the display form ("North East") as used in URLs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_string()))
            .map_err(|_| DomainError::validation(format!("Unknown region: {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

pub(crate) fn default_country() -> String {
    "Nigeria".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolLocation {
    pub city: String,
    pub state: String,
    pub region: Region,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// An alumni association's institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: Uuid,
    /// Unique across the directory
    pub name: String,
    pub short_name: String,
    #[serde(rename = "type")]
    pub school_type: SchoolType,
    pub gender: Gender,
    pub location: SchoolLocation,
    pub founded_year: Option<i32>,
    /// Relative path served under `/uploads`
    pub logo: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub admin_users: Vec<Uuid>,
    pub alumni_count: u64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    /// Conflict raised by every layer that enforces unique school names.
    pub fn name_taken() -> DomainError {
        DomainError::conflict("School with this name already exists")
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.admin_users.contains(&user_id)
    }

    /// Adds `user_id` to the admin set.
    pub fn add_admin(&mut self, user_id: Uuid) -> DomainResult<()> {
        if self.is_admin(user_id) {
            return Err(DomainError::conflict("User is already an admin for this school"));
        }
        self.admin_users.push(user_id);
        Ok(())
    }

    /// Removes `user_id` from the admin set. The set is left untouched when
    /// the removal would empty it.
    pub fn remove_admin(&mut self, user_id: Uuid) -> DomainResult<()> {
        if !self.is_admin(user_id) {
            return Err(DomainError::conflict("User is not an admin for this school"));
        }
        if self.admin_users.len() == 1 {
            return Err(DomainError::conflict("Cannot remove the last admin from a school"));
        }
        self.admin_users.retain(|id| *id != user_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSchool {
    pub name: String,
    pub short_name: String,
    #[serde(rename = "type")]
    pub school_type: SchoolType,
    pub gender: Gender,
    pub location: SchoolLocation,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub admin_users: Option<Vec<Uuid>>,
}

impl NewSchool {
    /// Builds the stored record; `creator` becomes the sole admin unless
    /// an explicit admin list was supplied.
    pub fn into_school(self, creator: Uuid, now: DateTime<Utc>) -> DomainResult<School> {
        let name = required(&self.name, "School name")?;
        let short_name = required(&self.short_name, "Short name")?;
        let admin_users = match self.admin_users {
            Some(list) if list.is_empty() => {
                return Err(DomainError::validation("A school needs at least one admin"))
            }
            Some(mut list) => {
                dedup_in_order(&mut list);
                list
            }
            None => vec![creator],
        };

        Ok(School {
            id: Uuid::now_v7(),
            name,
            short_name,
            school_type: self.school_type,
            gender: self.gender,
            location: self.location,
            founded_year: self.founded_year,
            logo: None,
            banner: None,
            description: self.description,
            website: trimmed(self.website),
            email: trimmed(self.email),
            phone_number: trimmed(self.phone_number),
            address: trimmed(self.address),
            admin_users,
            alumni_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update. The admin set, activation flag and media paths have
/// dedicated operations and are not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolPatch {
    pub name: Option<String>,
    pub short_name: Option<String>,
    #[serde(rename = "type")]
    pub school_type: Option<SchoolType>,
    pub gender: Option<Gender>,
    pub location: Option<SchoolLocation>,
    pub founded_year: Option<i32>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub alumni_count: Option<u64>,
}

impl SchoolPatch {
    pub fn apply(self, school: &mut School, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = self.name {
            school.name = required(&name, "School name")?;
        }
        if let Some(short_name) = self.short_name {
            school.short_name = required(&short_name, "Short name")?;
        }
        if let Some(school_type) = self.school_type {
            school.school_type = school_type;
        }
        if let Some(gender) = self.gender {
            school.gender = gender;
        }
        if let Some(location) = self.location {
            school.location = location;
        }
        if self.founded_year.is_some() {
            school.founded_year = self.founded_year;
        }
        if self.description.is_some() {
            school.description = self.description;
        }
        if self.website.is_some() {
            school.website = trimmed(self.website);
        }
        if self.email.is_some() {
            school.email = trimmed(self.email);
        }
        if self.phone_number.is_some() {
            school.phone_number = trimmed(self.phone_number);
        }
        if self.address.is_some() {
            school.address = trimmed(self.address);
        }
        if let Some(count) = self.alumni_count {
            school.alumni_count = count;
        }
        school.updated_at = now;
        Ok(())
    }
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required(value: &str, field: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

pub(crate) fn dedup_in_order(ids: &mut Vec<Uuid>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}
