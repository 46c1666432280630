//! Set of users currently flagged as infected.

use serde::{Deserialize, Serialize};
use shared_types::entities::{HealthStatus, UserId};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionSet {
    infected: BTreeSet<UserId>,
}

impl InfectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a health status write. Later writes overwrite earlier ones.
    pub fn set_status(&mut self, user: UserId, status: HealthStatus) {
        match status {
            HealthStatus::Infected => {
                self.infected.insert(user);
            }
            HealthStatus::NotInfected => {
                self.infected.remove(&user);
            }
        }
    }

    pub fn is_infected(&self, user: UserId) -> bool {
        self.infected.contains(&user)
    }

    pub fn status(&self, user: UserId) -> HealthStatus {
        if self.is_infected(user) {
            HealthStatus::Infected
        } else {
            HealthStatus::NotInfected
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.infected.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.infected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infected.is_empty()
    }
}

impl FromIterator<UserId> for InfectionSet {
    fn from_iter<T: IntoIterator<Item = UserId>>(iter: T) -> Self {
        Self {
            infected: iter.into_iter().collect(),
        }
    }
}
