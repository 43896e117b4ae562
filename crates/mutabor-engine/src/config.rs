//! The TOML run-configuration surface.
//!
//! Every key is optional except the two directories; missing optional keys
//! fall back to defaults with a log line, unknown keys are ignored. Policy
//! entries are either a plain boolean or a table with a randomness mode;
//! `both` registers the pseudo and the full variant side by side.

use std::path::{Path, PathBuf};

use mutabor_policy::mutators::{
    standard_policies, EmptyFunction, FalseBranchElse, InlineComment, NeutralElement,
    ParameterRename, TrueBranch, UnusedVariable,
};
use mutabor_policy::{MutationPolicy, PolicyRegistry, Randomness};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::engine::{DEFAULT_QUOTA, DEFAULT_SEED};
use crate::error::ConfigurationError;
use crate::scope::ScopeStrategy;

/// One run's configuration, as read from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    pub input_dir: Option<String>,
    pub output_dir: Option<String>,
    pub scope: Option<String>,
    pub transformations: Option<i64>,
    pub write_output: Option<bool>,
    pub seed: Option<i64>,
    pub compile_check: Option<bool>,
    pub manage_use_headers: Option<bool>,
    pub remove_comments: Option<bool>,
    pub debug: Option<bool>,
    /// Manifest database target; defaults to `<output_dir>/manifest.db`.
    pub manifest_db: Option<String>,
    /// Path to a schema SQL file overriding the embedded schema.
    pub manifest_schema: Option<String>,
    pub policies: Option<PoliciesConfig>,
}

/// Enable/mode switches, one per available policy type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoliciesConfig {
    pub true_branch: Option<PolicyToggle>,
    pub false_branch_else: Option<PolicyToggle>,
    pub inline_comment: Option<PolicyToggle>,
    pub parameter_rename: Option<PolicyToggle>,
    pub unused_variable: Option<PolicyToggle>,
    pub neutral_element: Option<PolicyToggle>,
    pub empty_function: Option<PolicyToggle>,
}

/// `policy = true` or `policy = { enabled = true, randomness = "full" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PolicyToggle {
    Flag(bool),
    Detailed {
        enabled: bool,
        #[serde(default)]
        randomness: RandomnessChoice,
    },
}

impl PolicyToggle {
    fn enabled(&self) -> bool {
        match self {
            PolicyToggle::Flag(flag) => *flag,
            PolicyToggle::Detailed { enabled, .. } => *enabled,
        }
    }

    fn randomness(&self) -> RandomnessChoice {
        match self {
            PolicyToggle::Flag(_) => RandomnessChoice::Pseudo,
            PolicyToggle::Detailed { randomness, .. } => *randomness,
        }
    }
}

/// Randomness mode for the name-generating policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomnessChoice {
    #[default]
    Pseudo,
    Full,
    /// Register the pseudo and the full variant together.
    Both,
}

impl RandomnessChoice {
    fn modes(self) -> &'static [Randomness] {
        match self {
            RandomnessChoice::Pseudo => &[Randomness::Pseudo],
            RandomnessChoice::Full => &[Randomness::Full],
            RandomnessChoice::Both => &[Randomness::Pseudo, Randomness::Full],
        }
    }
}

impl RunConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RunConfig =
            toml::from_str(&text).map_err(|err| ConfigurationError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed as u64,
            None => {
                warn!("no seed configured, defaulting to {DEFAULT_SEED}");
                DEFAULT_SEED
            }
        }
    }

    pub fn quota(&self) -> Result<u64, ConfigurationError> {
        match self.transformations {
            Some(count) if count < 0 => Err(ConfigurationError::NegativeQuota(count)),
            Some(count) => Ok(count as u64),
            None => {
                warn!("no transformation count configured, defaulting to {DEFAULT_QUOTA}");
                Ok(DEFAULT_QUOTA)
            }
        }
    }

    pub fn strategy(&self) -> Result<ScopeStrategy, ConfigurationError> {
        match &self.scope {
            Some(name) => name.parse(),
            None => {
                warn!("no scope strategy configured, defaulting to global");
                Ok(ScopeStrategy::Global)
            }
        }
    }

    /// The manifest target, relative to the configured output directory when
    /// not set explicitly.
    pub fn manifest_target(&self, output_dir: &Path) -> PathBuf {
        match &self.manifest_db {
            Some(target) => PathBuf::from(target),
            None => output_dir.join("manifest.db"),
        }
    }

    /// Build the registry the configuration asks for.
    ///
    /// Without a `[policies]` table the standard roster is registered; with
    /// one, only the enabled entries are.
    pub fn build_registry(&self, seed: u64) -> PolicyRegistry {
        let Some(policies) = &self.policies else {
            debug!("no policy table configured, registering the standard roster");
            let mut registry = PolicyRegistry::new("default");
            for policy in standard_policies(seed) {
                registry.register(policy);
            }
            return registry;
        };

        let mut registry = PolicyRegistry::new("from-config");
        if is_enabled(&policies.true_branch) {
            registry.register(Box::new(TrueBranch::new(seed)));
        }
        if is_enabled(&policies.false_branch_else) {
            registry.register(Box::new(FalseBranchElse::new(seed)));
        }
        if is_enabled(&policies.neutral_element) {
            registry.register(Box::new(NeutralElement::new(seed)));
        }
        register_randomized(&mut registry, &policies.inline_comment, seed, |seed, mode| {
            Box::new(InlineComment::new(seed, mode))
        });
        register_randomized(&mut registry, &policies.parameter_rename, seed, |seed, mode| {
            Box::new(ParameterRename::new(seed, mode))
        });
        register_randomized(&mut registry, &policies.unused_variable, seed, |seed, mode| {
            Box::new(UnusedVariable::new(seed, mode))
        });
        register_randomized(&mut registry, &policies.empty_function, seed, |seed, mode| {
            Box::new(EmptyFunction::new(seed, mode))
        });
        registry
    }
}

fn is_enabled(toggle: &Option<PolicyToggle>) -> bool {
    toggle.as_ref().map(PolicyToggle::enabled).unwrap_or(false)
}

fn register_randomized(
    registry: &mut PolicyRegistry,
    toggle: &Option<PolicyToggle>,
    seed: u64,
    build: impl Fn(u64, Randomness) -> Box<dyn MutationPolicy>,
) {
    let Some(toggle) = toggle else {
        return;
    };
    if !toggle.enabled() {
        return;
    }
    for mode in toggle.randomness().modes() {
        registry.register(build(seed, *mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config() {
        let text = r#"
input_dir = "corpus/in"
output_dir = "corpus/out"
scope = "per-unit-each"
transformations = 7
write_output = false
seed = 99
compile_check = true
remove_comments = true

[policies]
true_branch = true
inline_comment = { enabled = true, randomness = "both" }
parameter_rename = { enabled = false }
"#;
        let config: RunConfig = toml::from_str(text).unwrap();
        assert_eq!(config.input_dir.as_deref(), Some("corpus/in"));
        assert_eq!(config.quota().unwrap(), 7);
        assert_eq!(config.strategy().unwrap(), ScopeStrategy::PerUnitEach);
        assert_eq!(config.seed(), 99);

        let registry = config.build_registry(config.seed());
        assert_eq!(
            registry.names(),
            vec!["TrueBranch", "InlineComment", "InlineCommentFull"]
        );
    }

    #[test]
    fn defaults_apply_when_keys_are_missing() {
        let config: RunConfig = toml::from_str("input_dir = \"a\"\noutput_dir = \"b\"").unwrap();
        assert_eq!(config.quota().unwrap(), DEFAULT_QUOTA);
        assert_eq!(config.seed(), DEFAULT_SEED);
        assert_eq!(config.strategy().unwrap(), ScopeStrategy::Global);

        // No policy table: the standard roster.
        let registry = config.build_registry(1);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn empty_policy_table_builds_an_empty_registry() {
        let text = "input_dir = \"a\"\noutput_dir = \"b\"\n[policies]\n";
        let config: RunConfig = toml::from_str(text).unwrap();
        assert!(config.build_registry(1).is_empty());
    }

    #[test]
    fn negative_transformation_count_is_rejected() {
        let config: RunConfig = toml::from_str("transformations = -1").unwrap();
        assert!(matches!(
            config.quota(),
            Err(ConfigurationError::NegativeQuota(-1))
        ));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let config: RunConfig = toml::from_str("scope = \"per-class\"").unwrap();
        assert!(matches!(
            config.strategy(),
            Err(ConfigurationError::UnknownScope(_))
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config: RunConfig =
            toml::from_str("input_dir = \"a\"\nsomething_else = 5").unwrap();
        assert_eq!(config.input_dir.as_deref(), Some("a"));
    }

    #[test]
    fn manifest_target_defaults_into_the_output_directory() {
        let config: RunConfig = toml::from_str("output_dir = \"out\"").unwrap();
        assert_eq!(
            config.manifest_target(Path::new("out")),
            PathBuf::from("out/manifest.db")
        );

        let config: RunConfig = toml::from_str("manifest_db = \":memory:\"").unwrap();
        assert_eq!(
            config.manifest_target(Path::new("out")),
            PathBuf::from(":memory:")
        );
    }
}
