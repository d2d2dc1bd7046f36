use regiongrow_grid::GridCoordinate;
use serde::Deserialize;
use thiserror::Error;

/// Ways a name binding can collide with an existing region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The name already belongs to another region.
    NameTaken { owner: GridCoordinate },
    /// The region already carries a different name.
    RegionAlreadyNamed { existing: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("cannot name region {coordinates} {name:?}: {conflict}")]
    NameConflict {
        coordinates: GridCoordinate,
        name: String,
        conflict: Conflict,
    },
    #[error("invalid region name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },
    #[error("every candidate region name is taken")]
    NamesExhausted,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::NameTaken { owner } => write!(f, "name already used by region {}", owner),
            Conflict::RegionAlreadyNamed { existing } => {
                write!(f, "region is already named {:?}", existing)
            }
        }
    }
}

/// Rules for automatic and manual region names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    pub max_length: usize,
    /// Base names handed out in order; later rounds append a number.
    pub names: Vec<String>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            max_length: 10,
            names: [
                "amber", "basalt", "cedar", "dune", "ember", "fjord", "glade", "harbor", "isle",
                "juniper", "kestrel", "lagoon", "mesa", "north", "oasis", "pine", "quarry",
                "ridge", "summit", "tundra", "upland", "vale", "willow", "yarrow", "zenith",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl NamingRules {
    /// Lowercases and trims `name`, then checks it against the rules.
    pub fn normalize(&self, name: &str) -> Result<String, DirectoryError> {
        let normalized = name.trim().to_lowercase();
        let invalid = |reason: String| DirectoryError::InvalidName {
            name: name.to_string(),
            reason,
        };

        if normalized.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if normalized.chars().count() > self.max_length {
            return Err(invalid(format!("longer than {} characters", self.max_length)));
        }
        if !normalized.chars().all(|c| c.is_alphanumeric() || c == ' ') {
            return Err(invalid("only letters, digits and spaces are allowed".to_string()));
        }
        Ok(normalized)
    }

    /// Picks the first candidate, counting up from `start`, that `is_taken`
    /// rejects. Candidate `n` is `names[n % len]` with `n / len` appended
    /// once the list has wrapped.
    pub(crate) fn generate<F>(&self, start: usize, is_taken: F) -> Result<String, DirectoryError>
    where
        F: Fn(&str) -> bool,
    {
        if self.names.is_empty() {
            return Err(DirectoryError::NamesExhausted);
        }

        // At most `start` names are taken, so this covers them plus a full lap.
        let attempts = start + self.names.len() + 1;
        for number in start..start + attempts {
            let body = &self.names[number % self.names.len()];
            let suffix = number / self.names.len();
            let candidate = if suffix > 0 {
                format!("{}{}", body, suffix)
            } else {
                body.clone()
            };

            match self.normalize(&candidate) {
                Ok(name) if !is_taken(&name) => return Ok(name),
                Ok(_) => {}
                Err(e) => log::debug!("Skipping generated name: {}", e),
            }
        }
        Err(DirectoryError::NamesExhausted)
    }
}
