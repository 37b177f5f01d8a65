//! Example entity: a named, activatable record with audit timestamps.
//!
//! Updates consume the value and hand back the modified one so a stale copy
//! can never be mistaken for the current state.
//!
//! Callers are responsible for validating `name`; the entity stores whatever
//! it is given.

use std::fmt;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use uuid::Uuid;

/// Stable entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named record that can be switched on and off.
///
/// ## Invariants
/// - `id` never changes after [`Entity::create`].
/// - `updated_at` is refreshed by every update and is never earlier than
///   `created_at`.
///
/// # Examples
/// ```
/// use microservice::domain::Entity;
/// use mockable::DefaultClock;
///
/// let entity = Entity::create("Widget", Some("  spare part "), &DefaultClock);
/// assert_eq!(entity.description(), Some("spare part"));
///
/// let entity = entity.set_active(false, &DefaultClock);
/// assert!(!entity.is_active());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    id: EntityId,
    name: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create an active entity with a fresh identifier. Surrounding whitespace
    /// is stripped from `description`.
    pub fn create(name: impl Into<String>, description: Option<&str>, clock: &dyn Clock) -> Self {
        let now = clock.utc();
        Self {
            id: EntityId::random(),
            name: name.into(),
            description: description.map(|text| text.trim().to_owned()),
            is_active: true,
            created_at: now,
            updated_at: Some(now),
        }
    }

    /// Replace name and description.
    #[must_use]
    pub fn update_details(
        mut self,
        name: impl Into<String>,
        description: Option<String>,
        clock: &dyn Clock,
    ) -> Self {
        self.name = name.into();
        self.description = description;
        self.touch(clock);
        self
    }

    /// Switch the entity on or off.
    #[must_use]
    pub fn set_active(mut self, is_active: bool, clock: &dyn Clock) -> Self {
        self.is_active = is_active;
        self.touch(clock);
        self
    }

    fn touch(&mut self, clock: &dyn Clock) {
        // Clock skew must not move the audit trail before creation.
        self.updated_at = Some(clock.utc().max(self.created_at));
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
