//! Bind profile save/load
//!
//! A profile stores the combos of every group in a registry:
//!
//! ```text
//! # Bind profile: default
//!
//! [group.gameplay]
//! jump=Space
//! sprint=Left Shift+W, Joy0Button1
//! ```
//!
//! Each line is `<bind>=<combo>[, <alias combo>...]`, with the controls of a
//! combo joined by `+`. Applying a profile reconfigures each group as one
//! all-or-nothing batch.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use super::error::BindResult;
use super::group::BindDefinition;
use super::manager::BindRegistry;

const GROUP_PREFIX: &str = "group.";

/// The saved binds of one group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileGroup {
    pub name: String,
    pub binds: Vec<BindDefinition>,
}

/// Saved combos for a set of bind groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindProfile {
    pub name: String,
    pub groups: Vec<ProfileGroup>,
}

impl BindProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Get a group section, adding it if missing (case-insensitive)
    pub fn group_mut(&mut self, name: &str) -> &mut ProfileGroup {
        let position = self
            .groups
            .iter()
            .position(|g| g.name.eq_ignore_ascii_case(name));
        let index = match position {
            Some(index) => index,
            None => {
                self.groups.push(ProfileGroup {
                    name: name.to_string(),
                    binds: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[index]
    }

    /// Add a bind definition to a group
    pub fn add(&mut self, group: &str, definition: BindDefinition) {
        self.group_mut(group).binds.push(definition);
    }

    /// Snapshot the current combos of every group in a registry
    pub fn capture(registry: &BindRegistry, name: &str) -> Self {
        Self {
            name: name.to_string(),
            groups: registry
                .groups()
                .iter()
                .map(|g| ProfileGroup {
                    name: g.name().to_string(),
                    binds: g.export_definitions(),
                })
                .collect(),
        }
    }

    /// Load every group's definitions into a registry
    ///
    /// Missing groups are created. Each group is applied as a single batch;
    /// the first failing group stops the load and is left unchanged (a group
    /// created for it is removed again).
    pub fn apply(&self, registry: &mut BindRegistry) -> BindResult<()> {
        for group in &self.groups {
            let created = registry.get_group(&group.name).is_none();
            let result = registry
                .get_or_create_group(&group.name)
                .load_bind_definitions(&group.binds);
            if let Err(err) = result {
                if created {
                    registry.unload_group(&group.name);
                }
                return Err(err);
            }
        }
        log::debug!(
            "Applied bind profile '{}' ({} binds)",
            self.name,
            self.binding_count()
        );
        Ok(())
    }

    /// Get the number of bind definitions across all groups
    pub fn binding_count(&self) -> usize {
        self.groups.iter().map(|g| g.binds.len()).sum()
    }

    /// Render the profile text
    pub fn render(&self) -> String {
        let mut out = format!("# Bind profile: {}\n", self.name);
        for group in &self.groups {
            out.push('\n');
            out.push_str(&format!("[{}{}]\n", GROUP_PREFIX, group.name));
            for def in &group.binds {
                let combos: Vec<String> = std::iter::once(&def.control_names)
                    .chain(def.aliases.iter())
                    .map(|combo| combo.join("+"))
                    .collect();
                out.push_str(&format!("{}={}\n", def.name, combos.join(", ")));
            }
        }
        out
    }

    /// Parse profile text
    pub fn parse(text: &str) -> Result<Self> {
        let mut profile = BindProfile::default();
        let mut section: Option<usize> = None;

        for (number, line) in text.lines().enumerate() {
            let number = number + 1;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(name) = comment.trim().strip_prefix("Bind profile:") {
                    profile.name = name.trim().to_string();
                }
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let header = &line[1..line.len() - 1];
                let Some(group) = header.strip_prefix(GROUP_PREFIX) else {
                    bail!("line {}: unknown section '{}'", number, header);
                };
                let group = group.trim();
                if group.is_empty() {
                    bail!("line {}: empty group name", number);
                }
                profile.group_mut(group);
                section = profile
                    .groups
                    .iter()
                    .position(|g| g.name.eq_ignore_ascii_case(group));
                continue;
            }

            let Some((name, value)) = line.split_once('=') else {
                bail!("line {}: expected '<bind>=<controls>'", number);
            };
            let Some(index) = section else {
                bail!("line {}: bind '{}' outside of a group section", number, name.trim());
            };

            let mut combos = value.split(',').map(|combo| {
                combo
                    .split('+')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
            });
            let control_names = combos.next().unwrap_or_default();
            let aliases = combos.filter(|combo| !combo.is_empty()).collect();

            profile.groups[index].binds.push(BindDefinition {
                name: name.trim().to_string(),
                control_names,
                aliases,
            });
        }

        Ok(profile)
    }

    /// Save profile to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render())
            .with_context(|| format!("Failed to write bind profile {}", path.display()))
    }

    /// Load profile from a file
    ///
    /// The profile name comes from the header comment, or the file stem when
    /// there is none.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bind profile {}", path.display()))?;
        let mut profile = Self::parse(&text)
            .with_context(|| format!("Invalid bind profile {}", path.display()))?;

        if profile.name.is_empty() {
            if let Some(stem) = path.file_stem() {
                profile.name = stem.to_string_lossy().to_string();
            }
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample() -> BindProfile {
        let mut profile = BindProfile::new("default");
        profile.add("gameplay", BindDefinition::new("jump", ["Space"]));
        profile.add(
            "gameplay",
            BindDefinition::new("sprint", ["Left Shift", "W"]).with_alias(["Joy0Button1"]),
        );
        profile.add("menu", BindDefinition::new("back", ["Escape"]));
        profile
    }

    #[test]
    fn test_new_profile() {
        let profile = BindProfile::new("test");
        assert_eq!(profile.name, "test");
        assert_eq!(profile.binding_count(), 0);
    }

    #[test]
    fn test_render() {
        insta::assert_snapshot!(sample().render(), @r"
        # Bind profile: default

        [group.gameplay]
        jump=Space
        sprint=Left Shift+W, Joy0Button1

        [group.menu]
        back=Escape
        ");
    }

    #[test]
    fn test_parse_rendered() {
        let profile = sample();
        assert_eq!(BindProfile::parse(&profile.render()).unwrap(), profile);
    }

    #[test]
    fn test_group_sections_merge_case_insensitively() {
        let text = "[group.Menu]\nup=Up\n\n[group.menu]\ndown=Down\n";
        let profile = BindProfile::parse(text).unwrap();
        assert_eq!(profile.groups.len(), 1);
        assert_eq!(profile.groups[0].name, "Menu");
        assert_eq!(profile.binding_count(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(BindProfile::parse("jump=Space\n").is_err());
        assert!(BindProfile::parse("[keyboard]\nSpace=fire\n").is_err());
        assert!(BindProfile::parse("[group.g]\njump Space\n").is_err());
        assert!(BindProfile::parse("[group. ]\n").is_err());
    }

    #[test]
    fn test_empty_combo_is_kept_for_validation() {
        let profile = BindProfile::parse("[group.g]\njump=\n").unwrap();
        assert!(profile.groups[0].binds[0].control_names.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let profile = sample();
        let file = NamedTempFile::new().unwrap();
        profile.save(file.path()).unwrap();

        let loaded = BindProfile::load(file.path()).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_load_with_comments_uses_file_stem() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# just a comment").unwrap();
        writeln!(file, "[group.gameplay]").unwrap();
        writeln!(file, "# another comment").unwrap();
        writeln!(file, "fire = Space").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "thrust = Up").unwrap();
        file.flush().unwrap();

        let profile = BindProfile::load(file.path()).unwrap();
        assert_eq!(profile.binding_count(), 2);
        assert_eq!(profile.groups[0].binds[0].name, "fire");
        let stem = file.path().file_stem().unwrap().to_string_lossy().to_string();
        assert_eq!(profile.name, stem);
    }

    #[test]
    fn test_failed_apply_removes_new_group() {
        use crate::input::{ControlRegistry, DeviceState};
        use std::sync::Arc;

        let device = DeviceState::new();
        let mut registry = BindRegistry::new(Arc::new(ControlRegistry::standard(&device)));
        let profile =
            BindProfile::parse("[group.menu]\nback=Escape\n[group.game]\njump=Hyperdrive\n").unwrap();

        let err = profile.apply(&mut registry).unwrap_err();
        assert!(matches!(
            err,
            crate::input::BindError::BatchValidationFailed { ref entry, .. } if entry == "jump"
        ));
        assert!(registry.get_group("game").is_none());
        assert!(registry.get_group("menu").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let err = BindProfile::load(Path::new("/nonexistent/binds.profile")).unwrap_err();
        assert!(err.to_string().contains("Failed to read bind profile"));
    }
}
