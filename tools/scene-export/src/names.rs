//! Output node naming

use hashbrown::HashSet;

use crate::args::NameCollision;
use crate::authoring::NodePath;
use crate::error::{ExportError, Result};

/// Hands out unique display names for output nodes
pub struct NameRegistry {
    policy: NameCollision,
    used: HashSet<String>,
}

impl NameRegistry {
    pub fn new(policy: NameCollision) -> Self {
        Self {
            policy,
            used: HashSet::new(),
        }
    }

    /// Reserve a unique name derived from `requested`
    pub fn assign(&mut self, path: &NodePath, requested: &str) -> Result<String> {
        if requested.is_empty() {
            return Err(ExportError::NameResolution {
                path: path.clone(),
                name: requested.to_string(),
            });
        }

        if self.used.insert(requested.to_string()) {
            return Ok(requested.to_string());
        }

        match self.policy {
            NameCollision::Fail => Err(ExportError::NameResolution {
                path: path.clone(),
                name: requested.to_string(),
            }),
            NameCollision::Suffix => {
                let mut suffix = 1usize;
                loop {
                    let candidate = format!("{requested}_{suffix}");
                    if self.used.insert(candidate.clone()) {
                        return Ok(candidate);
                    }
                    suffix += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_policy() {
        let mut names = NameRegistry::new(NameCollision::Suffix);
        let path = NodePath::new("/a/mesh");
        assert_eq!(names.assign(&path, "mesh").unwrap(), "mesh");
        assert_eq!(names.assign(&path, "mesh").unwrap(), "mesh_1");
        assert_eq!(names.assign(&path, "mesh_1").unwrap(), "mesh_1_1");
        assert_eq!(names.assign(&path, "mesh").unwrap(), "mesh_2");
    }

    #[test]
    fn test_fail_policy() {
        let mut names = NameRegistry::new(NameCollision::Fail);
        let path = NodePath::new("/b/mesh");
        names.assign(&path, "mesh").unwrap();
        let err = names.assign(&path, "mesh").unwrap_err();
        assert!(matches!(err, ExportError::NameResolution { .. }));
        assert!(err.to_string().contains("/b/mesh"));
    }
}
