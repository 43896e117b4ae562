//! The scheduling engine: select, apply, validate, retry, persist.

use std::collections::BTreeSet;
use std::path::PathBuf;

use mutabor_manifest::ManifestSink;
use mutabor_policy::{
    ApplyEnv, AppliedTransformation, Category, PolicyRegistry, TransformationResult,
    REMOVE_COMMENTS_POLICY,
};
use mutabor_tree::{AstProvider, Corpus, NodeId, SyntaxKind};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, EngineError};
use crate::scope::{plan_scopes, ScopeStrategy};

/// Default mutation quota when the configuration names none.
pub const DEFAULT_QUOTA: u64 = 100;

/// Default run seed when the configuration names none.
pub const DEFAULT_SEED: u64 = 2020;

/// Per-scope ceiling on unproductive attempts: proportional so large quotas
/// are not starved, floored so small quotas still get a fair number of draws.
fn attempt_ceiling(quota: u64) -> u64 {
    quota.saturating_mul(5).max(25)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Running,
    Finished,
}

/// Outcome counters of one finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Units parsed from the input directory.
    pub units: usize,
    /// Total quota requested across all planned scopes.
    pub requested: u64,
    /// Applied results accumulated, comment-removal pass included.
    pub applied: usize,
    /// Output files written (zero when output writing is off).
    pub files_written: usize,
}

/// Drives one mutation run over a corpus.
///
/// Lifecycle is `Idle → Running → Finished`; a finished engine keeps its
/// result list readable but cannot run again. There is no cancellation
/// mid-run; callers bound very large corpora themselves.
pub struct Engine {
    input_dir: PathBuf,
    output_dir: PathBuf,
    registry: PolicyRegistry,
    provider: Box<dyn AstProvider>,
    sink: Box<dyn ManifestSink>,
    strategy: ScopeStrategy,
    quota: u64,
    write_output: bool,
    remove_comments: bool,
    debug: bool,
    selection_rng: StdRng,
    state: EngineState,
    results: Vec<TransformationResult>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("registry", &self.registry)
            .field("provider", &"<dyn AstProvider>")
            .field("sink", &"<dyn ManifestSink>")
            .field("strategy", &self.strategy)
            .field("quota", &self.quota)
            .field("write_output", &self.write_output)
            .field("remove_comments", &self.remove_comments)
            .field("debug", &self.debug)
            .field("state", &self.state)
            .field("results", &self.results)
            .finish()
    }
}

impl Engine {
    /// Build an idle engine.
    ///
    /// Blank input or output locations fail here, before any work begins.
    /// The registry, provider and sink are owned, so "missing collaborator"
    /// is unrepresentable.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        registry: PolicyRegistry,
        provider: Box<dyn AstProvider>,
        sink: Box<dyn ManifestSink>,
    ) -> Result<Self, ConfigurationError> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        if input_dir.as_os_str().is_empty() {
            return Err(ConfigurationError::BlankInputDir);
        }
        if output_dir.as_os_str().is_empty() {
            return Err(ConfigurationError::BlankOutputDir);
        }
        Ok(Self {
            input_dir,
            output_dir,
            registry,
            provider,
            sink,
            strategy: ScopeStrategy::default(),
            quota: DEFAULT_QUOTA,
            write_output: true,
            remove_comments: false,
            debug: false,
            selection_rng: StdRng::seed_from_u64(DEFAULT_SEED),
            state: EngineState::Idle,
            results: Vec::new(),
        })
    }

    /// Assemble an engine from a loaded configuration: directories, scope,
    /// quota, seed, toggles and the policy roster.
    pub fn from_config(
        config: &crate::config::RunConfig,
        provider: Box<dyn AstProvider>,
        sink: Box<dyn ManifestSink>,
    ) -> Result<Self, ConfigurationError> {
        let input_dir = config
            .input_dir
            .clone()
            .filter(|dir| !dir.trim().is_empty())
            .ok_or(ConfigurationError::BlankInputDir)?;
        let output_dir = config
            .output_dir
            .clone()
            .filter(|dir| !dir.trim().is_empty())
            .ok_or(ConfigurationError::BlankOutputDir)?;
        let strategy = config.strategy()?;
        let quota = config.quota()?;
        let seed = config.seed();

        let registry = config.build_registry(seed);
        let mut engine = Engine::new(input_dir, output_dir, registry, provider, sink)?;
        engine.set_scope(quota, strategy);
        engine.reseed(seed);
        info!(seed, quota, strategy = %strategy, "engine configured");

        if let Some(write_output) = config.write_output {
            engine.set_write_output(write_output);
        }
        if config.compile_check == Some(false) {
            warn!("compile checking disabled, mutated units may not compile");
            engine.registry_mut().set_compile_check_all(false);
        }
        if config.manage_use_headers == Some(false) {
            warn!("use-header management disabled");
            engine.registry_mut().set_manage_use_headers_all(false);
        }
        if config.remove_comments == Some(true) {
            engine.set_remove_comments(true);
        }
        if config.debug == Some(true) {
            engine.set_debug(true);
        }
        Ok(engine)
    }

    /// Set the quota applied per scope under `strategy`.
    pub fn set_scope(&mut self, quota: u64, strategy: ScopeStrategy) {
        self.quota = quota;
        self.strategy = strategy;
    }

    pub fn set_write_output(&mut self, enabled: bool) {
        self.write_output = enabled;
    }

    pub fn set_remove_comments(&mut self, enabled: bool) {
        self.remove_comments = enabled;
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug = enabled;
    }

    /// Reseed the selection stream and every registered policy with the same
    /// value. A reseeded engine over an identical corpus replays identically.
    pub fn reseed(&mut self, seed: u64) {
        self.selection_rng = StdRng::seed_from_u64(seed);
        self.registry.reseed_all(seed);
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PolicyRegistry {
        &mut self.registry
    }

    /// Results accumulated so far; empty before the first run.
    pub fn finished_results(&self) -> &[TransformationResult] {
        &self.results
    }

    /// Execute the run: parse, distribute quotas, mutate with bounded
    /// retries, optionally strip comments and write output, then hand the
    /// full result list to the manifest sink exactly once.
    pub async fn run(&mut self) -> Result<RunSummary, EngineError> {
        if self.state != EngineState::Idle {
            return Err(EngineError::AlreadyRan);
        }
        self.state = EngineState::Running;

        let mut corpus = self.provider.parse_dir(&self.input_dir)?;
        let units = corpus.units().len();
        info!(units, input = %self.input_dir.display(), "corpus loaded");

        let scopes = plan_scopes(self.strategy, &corpus, self.quota, &mut self.selection_rng);
        let requested: u64 = scopes.iter().map(|(_, quota)| quota).sum();
        debug!(
            strategy = %self.strategy,
            scopes = scopes.len(),
            requested,
            "quota distribution planned"
        );

        for (scope, local_quota) in scopes {
            self.mutate_scope(&mut corpus, scope, local_quota);
        }

        if self.remove_comments {
            self.strip_comments(&mut corpus);
        }

        let mut files_written = 0usize;
        if self.write_output {
            std::fs::create_dir_all(&self.output_dir)?;
            for unit in corpus.units() {
                let text = self.provider.pretty_print(&corpus, unit)?;
                let file_name = format!(
                    "{}.{}",
                    corpus.unit_name(unit),
                    self.provider.file_extension()
                );
                std::fs::write(self.output_dir.join(file_name), text)?;
                files_written += 1;
            }
            debug!(files_written, output = %self.output_dir.display(), "output written");
        }

        // Always: the manifest records that a run occurred, even a dry one.
        self.sink.write_manifest(&self.results).await?;

        self.state = EngineState::Finished;
        let summary = RunSummary {
            units,
            requested,
            applied: self.results.iter().filter(|r| r.is_applied()).count(),
            files_written,
        };
        info!(
            applied = summary.applied,
            requested = summary.requested,
            "run finished"
        );
        Ok(summary)
    }

    /// The bounded retry loop for one (scope, quota) pair.
    ///
    /// Unproductive attempts (Empty results) are counted against the attempt
    /// ceiling; exhaustion is a shortfall, not an error.
    fn mutate_scope(&mut self, corpus: &mut Corpus, scope: NodeId, local_quota: u64) {
        let ceiling = attempt_ceiling(local_quota);
        let mut applied_count = 0u64;
        let mut misses = 0u64;
        let mut applied_names: BTreeSet<String> = BTreeSet::new();

        while applied_count < local_quota {
            if misses >= ceiling {
                warn!(
                    scope = %scope,
                    applied = applied_count,
                    quota = local_quota,
                    "attempt ceiling reached, accepting shortfall"
                );
                break;
            }
            let Some(policy_index) = self.select_policy(&applied_names) else {
                warn!(scope = %scope, "no eligible policy, leaving scope");
                break;
            };

            let env = ApplyEnv {
                provider: self.provider.as_ref(),
                debug: self.debug,
            };
            let result = self
                .registry
                .policy_mut(policy_index)
                .apply(corpus, scope, &env);

            match result {
                TransformationResult::Applied(ref applied) => {
                    applied_names.insert(applied.policy.clone());
                    applied_count += 1;
                    self.results.push(result);
                }
                TransformationResult::Empty => {
                    misses += 1;
                }
            }
        }
    }

    /// Weighted selection when a distribution is set, uniform otherwise.
    ///
    /// The exclusivity hook filters policies that declare themselves
    /// incompatible with one already applied to the current scope. No
    /// shipped policy declares any, so the filter is a structured no-op.
    fn select_policy(&mut self, applied_names: &BTreeSet<String>) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.registry.len())
            .filter(|index| {
                self.registry
                    .policy(*index)
                    .exclusive_with()
                    .iter()
                    .all(|other| !applied_names.contains(other))
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        match self.registry.distribution() {
            Some(weights) => {
                let candidate_weights: Vec<u64> = candidates
                    .iter()
                    .map(|index| {
                        weights
                            .get(self.registry.policy(*index).name())
                            .copied()
                            .unwrap_or(0)
                    })
                    .collect();
                let index = WeightedIndex::new(&candidate_weights).ok()?;
                Some(candidates[index.sample(&mut self.selection_rng)])
            }
            None => {
                let index = self.selection_rng.gen_range(0..candidates.len());
                Some(candidates[index])
            }
        }
    }

    /// Deterministic comment sweep: one synthetic result per affected unit,
    /// tagged with the reserved policy name.
    fn strip_comments(&mut self, corpus: &mut Corpus) {
        for unit in corpus.units() {
            let comments = corpus.arena().find_descendants(unit, SyntaxKind::Comment);
            if comments.is_empty() {
                continue;
            }
            let snapshot = corpus.arena().snapshot(unit);
            for comment in &comments {
                corpus.arena_mut().detach(*comment);
            }
            let unit_name = corpus.unit_name(unit).to_string();
            debug!(unit = %unit_name, removed = comments.len(), "comments stripped");
            self.results
                .push(TransformationResult::Applied(AppliedTransformation {
                    policy: REMOVE_COMMENTS_POLICY.to_string(),
                    unit: unit_name.clone(),
                    element: unit_name,
                    snapshot,
                    categories: BTreeSet::from([Category::Comment]),
                    debug: None,
                }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use mutabor_lang::LangProvider;
    use mutabor_manifest::MemorySink;
    use mutabor_policy::mutators::{FalseBranchElse, InlineComment, TrueBranch};
    use mutabor_policy::{MutationPolicy, PolicyCore, Randomness};
    use tempfile::TempDir;

    const TWO_UNITS: &str = "\
unit One {
    fn alpha(x) {
        let a = x + 1;
        return a;
    }

    fn beta() {
        return 1;
    }
}

unit Two {
    fn gamma(y) {
        return y * 2;
    }

    fn delta() {
        return 2;
    }
}
";

    fn corpus_dir(source: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("corpus.mu"), source).unwrap();
        dir
    }

    fn engine_with(
        input: &TempDir,
        output: &TempDir,
        registry: PolicyRegistry,
        sink: Arc<MemorySink>,
    ) -> Engine {
        Engine::new(
            input.path(),
            output.path(),
            registry,
            Box::new(LangProvider::new()),
            Box::new(sink),
        )
        .unwrap()
    }

    fn comment_registry() -> PolicyRegistry {
        let mut registry = PolicyRegistry::new("test");
        registry.register(Box::new(InlineComment::new(1, Randomness::Pseudo)));
        registry
    }

    /// Policy whose requirement never holds; every apply is unproductive.
    struct NeverApplies {
        core: PolicyCore,
    }

    fn never(_: &Corpus, _: NodeId) -> bool {
        false
    }

    impl NeverApplies {
        fn new() -> Self {
            Self {
                core: PolicyCore::with_requirements(1, vec![never]),
            }
        }
    }

    impl MutationPolicy for NeverApplies {
        fn name(&self) -> &str {
            "NeverApplies"
        }

        fn categories(&self) -> BTreeSet<Category> {
            BTreeSet::from([Category::Testing])
        }

        fn core(&self) -> &PolicyCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut PolicyCore {
            &mut self.core
        }

        fn apply(
            &mut self,
            corpus: &mut Corpus,
            scope: NodeId,
            _env: &ApplyEnv<'_>,
        ) -> TransformationResult {
            if !self.requirements_met(corpus, scope) {
                return TransformationResult::Empty;
            }
            unreachable!("requirement never holds");
        }
    }

    #[test]
    fn blank_directories_fail_construction() {
        let err = Engine::new(
            "",
            "out",
            PolicyRegistry::new("test"),
            Box::new(LangProvider::new()),
            Box::new(MemorySink::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::BlankInputDir));

        let err = Engine::new(
            "in",
            "",
            PolicyRegistry::new("test"),
            Box::new(LangProvider::new()),
            Box::new(MemorySink::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::BlankOutputDir));
    }

    #[tokio::test]
    async fn identical_seeds_replay_identically() {
        let input = corpus_dir(TWO_UNITS);

        let mut sequences = Vec::new();
        for _ in 0..2 {
            let output = tempfile::tempdir().unwrap();
            let mut registry = PolicyRegistry::new("test");
            registry.register(Box::new(TrueBranch::new(0)));
            registry.register(Box::new(InlineComment::new(0, Randomness::Pseudo)));

            let sink = Arc::new(MemorySink::new());
            let mut engine = engine_with(&input, &output, registry, sink);
            engine.set_scope(8, ScopeStrategy::Global);
            engine.set_write_output(false);
            engine.reseed(4242);
            engine.run().await.unwrap();

            let sequence: Vec<(String, String)> = engine
                .finished_results()
                .iter()
                .filter_map(|r| r.as_applied())
                .map(|a| (a.policy.clone(), a.element.clone()))
                .collect();
            sequences.push(sequence);
        }
        assert_eq!(sequences[0], sequences[1]);
        assert!(!sequences[0].is_empty());
    }

    #[tokio::test]
    async fn per_unit_each_yields_quota_times_units() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, comment_registry(), sink);
        engine.set_scope(5, ScopeStrategy::PerUnitEach);
        engine.set_write_output(false);

        engine.run().await.unwrap();

        let applied: Vec<&AppliedTransformation> = engine
            .finished_results()
            .iter()
            .filter_map(|r| r.as_applied())
            .collect();
        assert_eq!(applied.len(), 10);

        let mut per_unit: BTreeMap<&str, usize> = BTreeMap::new();
        for transformation in &applied {
            *per_unit.entry(transformation.unit.as_str()).or_default() += 1;
        }
        assert_eq!(per_unit.len(), 2);
        assert!(per_unit.values().all(|count| *count == 5));
    }

    #[tokio::test]
    async fn per_subunit_each_yields_quota_per_subunit() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, comment_registry(), sink);
        engine.set_scope(3, ScopeStrategy::PerSubunitEach);
        engine.set_write_output(false);

        engine.run().await.unwrap();

        let applied: Vec<&AppliedTransformation> = engine
            .finished_results()
            .iter()
            .filter_map(|r| r.as_applied())
            .collect();
        // 2 units x 2 subunits x quota 3.
        assert_eq!(applied.len(), 12);

        let mut per_element: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for transformation in &applied {
            *per_element
                .entry((transformation.unit.as_str(), transformation.element.as_str()))
                .or_default() += 1;
        }
        assert_eq!(per_element.len(), 4);
        assert!(per_element.values().all(|count| *count == 3));
    }

    #[tokio::test]
    async fn never_eligible_policy_terminates_with_zero_results() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let mut registry = PolicyRegistry::new("test");
        registry.register(Box::new(NeverApplies::new()));

        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, registry, sink.clone());
        engine.set_scope(5, ScopeStrategy::Global);
        engine.set_write_output(false);

        let summary = engine.run().await.unwrap();
        assert_eq!(summary.applied, 0);
        // The manifest is still written exactly once.
        assert_eq!(sink.call_count(), 1);
        assert!(sink.last_applied().is_empty());
    }

    #[tokio::test]
    async fn weighted_distribution_drives_selection() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let mut registry = PolicyRegistry::new("test");
        registry.register(Box::new(TrueBranch::new(0)));
        registry.register(Box::new(FalseBranchElse::new(0)));
        registry
            .set_distribution(&BTreeMap::from([("FalseBranchElse".to_string(), 3)]))
            .unwrap();

        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, registry, sink);
        engine.set_scope(4, ScopeStrategy::Global);
        engine.set_write_output(false);
        engine.reseed(7);

        engine.run().await.unwrap();

        // TrueBranch has implicit weight zero, so only FalseBranchElse runs.
        assert!(engine
            .finished_results()
            .iter()
            .filter_map(|r| r.as_applied())
            .all(|a| a.policy == "FalseBranchElse"));
    }

    #[tokio::test]
    async fn output_writing_toggle_controls_files() {
        let input = corpus_dir(TWO_UNITS);

        let output_on = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output_on, comment_registry(), sink);
        engine.set_scope(1, ScopeStrategy::Global);
        let summary = engine.run().await.unwrap();
        assert_eq!(summary.files_written, 2);
        assert!(output_on.path().join("One.mu").exists());
        assert!(output_on.path().join("Two.mu").exists());

        let output_off = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output_off, comment_registry(), sink);
        engine.set_scope(1, ScopeStrategy::Global);
        engine.set_write_output(false);
        let summary = engine.run().await.unwrap();
        assert_eq!(summary.files_written, 0);
        assert!(!output_off.path().join("One.mu").exists());
    }

    #[tokio::test]
    async fn comment_removal_strips_and_records() {
        let source = "\
unit Noisy {
    // unit-level note
    fn f() {
        // body note
        return 1;
    }
}
";
        let input = corpus_dir(source);
        let output = tempfile::tempdir().unwrap();
        let mut registry = PolicyRegistry::new("test");
        registry.register(Box::new(TrueBranch::new(0)));

        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, registry, sink);
        engine.set_scope(1, ScopeStrategy::Global);
        engine.set_remove_comments(true);

        engine.run().await.unwrap();

        let removals: Vec<&AppliedTransformation> = engine
            .finished_results()
            .iter()
            .filter_map(|r| r.as_applied())
            .filter(|a| a.policy == REMOVE_COMMENTS_POLICY)
            .collect();
        assert_eq!(removals.len(), 1);
        assert_eq!(removals[0].unit, "Noisy");

        let written = std::fs::read_to_string(output.path().join("Noisy.mu")).unwrap();
        assert!(!written.contains("//"));
    }

    #[test]
    fn from_config_requires_directories() {
        let config = crate::config::RunConfig::default();
        let err = Engine::from_config(
            &config,
            Box::new(LangProvider::new()),
            Box::new(MemorySink::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::BlankInputDir));
    }

    #[tokio::test]
    async fn from_config_wires_a_full_run() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let text = format!(
            "input_dir = \"{}\"\noutput_dir = \"{}\"\nscope = \"per-unit-each\"\n\
             transformations = 2\nseed = 5\nwrite_output = false\n",
            input.path().display(),
            output.path().display()
        );
        let config: crate::config::RunConfig = toml::from_str(&text).unwrap();

        let sink = Arc::new(MemorySink::new());
        let mut engine = Engine::from_config(
            &config,
            Box::new(LangProvider::new()),
            Box::new(sink.clone()),
        )
        .unwrap();

        let summary = engine.run().await.unwrap();
        assert_eq!(summary.units, 2);
        assert_eq!(summary.applied, 4);
        assert_eq!(summary.files_written, 0);
        assert_eq!(sink.call_count(), 1);
    }

    #[tokio::test]
    async fn a_finished_engine_cannot_run_again() {
        let input = corpus_dir(TWO_UNITS);
        let output = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let mut engine = engine_with(&input, &output, comment_registry(), sink);
        engine.set_scope(1, ScopeStrategy::Global);
        engine.set_write_output(false);

        engine.run().await.unwrap();
        assert!(matches!(
            engine.run().await.unwrap_err(),
            EngineError::AlreadyRan
        ));
    }
}
