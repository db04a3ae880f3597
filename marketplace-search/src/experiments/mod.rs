//! A/B experiments over search ranking.
//!
//! An experiment is a set of weighted variants, each carrying a pure
//! transform over search options (changed boost weights, NLP on/off, value
//! alignment on/off). The engine assigns a request to a variant, derives
//! modified options, and tags the response with the serving variant.
//! Experiments never block or fail a search: unknown ids and variants are
//! logged and ignored.

mod registry;

pub use registry::ExperimentRegistry;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use marketplace_search_shared::{EntityBoosting, SearchOptions, SearchResponse};

/// Lifecycle state of an experiment.
///
/// Valid transitions: `Draft → Running`, `Running ⇄ Paused`, and
/// `Running/Paused → Completed`. Only running experiments are eligible for
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

impl ExperimentStatus {
    /// Whether the state machine allows moving to `next`.
    pub fn can_transition_to(self, next: ExperimentStatus) -> bool {
        use ExperimentStatus::*;
        matches!(
            (self, next),
            (Draft, Running) | (Running, Paused) | (Paused, Running) | (Running, Completed)
                | (Paused, Completed)
        )
    }
}

/// A pure transform a variant applies to search options.
pub type VariantTransform = Arc<dyn Fn(SearchOptions) -> SearchOptions + Send + Sync>;

/// One arm of an experiment.
#[derive(Clone)]
pub struct Variant {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Relative probability mass for weighted selection. Must be
    /// non-negative.
    pub weight: f64,
    /// Share of traffic this variant is intended to serve, as a
    /// percentage. Informational; selection is driven by `weight`.
    pub traffic_percentage: f64,
    transform: VariantTransform,
}

impl Variant {
    /// Create a variant with its transform.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        weight: f64,
        traffic_percentage: f64,
        transform: VariantTransform,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            weight,
            traffic_percentage,
            transform,
        }
    }

    /// A variant that leaves options unchanged.
    pub fn control(weight: f64, traffic_percentage: f64) -> Self {
        Self::new(
            "control",
            "Control",
            "Default behavior",
            weight,
            traffic_percentage,
            Arc::new(|options| options),
        )
    }

    /// Apply this variant's transform, producing derived options. The
    /// original options are untouched.
    pub fn apply(&self, options: SearchOptions) -> SearchOptions {
        (self.transform)(options)
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("weight", &self.weight)
            .field("traffic_percentage", &self.traffic_percentage)
            .finish()
    }
}

/// A registered search experiment.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ExperimentStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub variants: Vec<Variant>,
}

impl Experiment {
    /// Create a running experiment starting now.
    pub fn running(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        variants: Vec<Variant>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            status: ExperimentStatus::Running,
            start_date: Utc::now(),
            end_date: None,
            variants,
        }
    }

    /// Check structural invariants: at least one variant, all weights
    /// non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if self.variants.is_empty() {
            return Err(format!("experiment '{}' has no variants", self.id));
        }
        for variant in &self.variants {
            if variant.weight < 0.0 || !variant.weight.is_finite() {
                return Err(format!(
                    "variant '{}' of experiment '{}' has an invalid weight {}",
                    variant.id, self.id, variant.weight
                ));
            }
        }
        Ok(())
    }

    fn total_weight(&self) -> f64 {
        self.variants.iter().map(|v| v.weight).sum()
    }
}

/// Assigns requests to experiment variants and tags responses.
pub struct ExperimentEngine {
    registry: Arc<ExperimentRegistry>,
    enabled: bool,
}

impl ExperimentEngine {
    /// Create an engine over a registry.
    pub fn new(registry: Arc<ExperimentRegistry>, enabled: bool) -> Self {
        Self { registry, enabled }
    }

    /// Look up an experiment by id. Absent ids yield `None`, never an
    /// error.
    pub fn get_experiment(&self, experiment_id: &str) -> Option<Arc<Experiment>> {
        self.registry.get(experiment_id)
    }

    /// Apply an experiment to search options, returning derived options.
    ///
    /// With `variant_id` given the named variant is used; otherwise one is
    /// selected by weighted draw — deterministic when the options carry a
    /// session or user id, uniform random otherwise. The derived options
    /// are tagged `"{experiment_id}:{variant_id}"`. Unknown experiments,
    /// unknown variants, and non-running experiments log a warning and
    /// return the options unchanged.
    pub fn apply_experiment(
        &self,
        options: SearchOptions,
        experiment_id: &str,
        variant_id: Option<&str>,
    ) -> SearchOptions {
        if !self.enabled {
            return options;
        }

        let experiment = match self.registry.get(experiment_id) {
            Some(experiment) => experiment,
            None => {
                warn!(experiment_id = %experiment_id, "Experiment not found");
                return options;
            }
        };

        if experiment.status != ExperimentStatus::Running {
            warn!(
                experiment_id = %experiment_id,
                status = ?experiment.status,
                "Experiment is not running, skipping assignment"
            );
            return options;
        }

        let variant = if let Some(requested) = variant_id {
            match experiment.variants.iter().find(|v| v.id == requested) {
                Some(variant) => variant,
                None => {
                    warn!(
                        experiment_id = %experiment_id,
                        variant_id = %requested,
                        "Variant not found in experiment"
                    );
                    return options;
                }
            }
        } else {
            let seed = options
                .session_id
                .clone()
                .or_else(|| options.user_id.map(|id| id.to_string()));
            match Self::select_variant(&experiment, seed.as_deref()) {
                Some(variant) => variant,
                None => {
                    warn!(experiment_id = %experiment_id, "Experiment has no variants");
                    return options;
                }
            }
        };

        let mut derived = variant.apply(options);
        derived.experiment_id = Some(format!("{}:{}", experiment.id, variant.id));

        debug!(
            experiment_id = %experiment.id,
            variant_id = %variant.id,
            "Applied experiment variant"
        );

        derived
    }

    /// Tag a response with the experiment/variant that served it, for
    /// downstream analytics. Result content is never altered. Only tags
    /// resolved assignments (`"experiment:variant"`).
    pub fn process_experiment_results(
        &self,
        response: &mut SearchResponse,
        options: &SearchOptions,
    ) {
        if !self.enabled {
            return;
        }
        if let Some(tag) = &options.experiment_id {
            if tag.contains(':') {
                response.experiment_id = Some(tag.clone());
            }
        }
    }

    /// Select a variant by weighted draw, proportional to each variant's
    /// weight. Ties and a zero total weight fall back to the first variant
    /// (list order).
    fn select_variant<'a>(experiment: &'a Experiment, seed: Option<&str>) -> Option<&'a Variant> {
        if experiment.variants.is_empty() {
            return None;
        }

        let total_weight = experiment.total_weight();
        if total_weight <= 0.0 {
            return experiment.variants.first();
        }

        let point = match seed {
            Some(seed) => Self::deterministic_point(&experiment.id, seed) * total_weight,
            None => rand::rng().random::<f64>() * total_weight,
        };

        let mut cumulative = 0.0;
        for variant in &experiment.variants {
            cumulative += variant.weight;
            if point < cumulative {
                return Some(variant);
            }
        }

        experiment.variants.first()
    }

    /// Reduce a SHA-256 digest of `experiment_id:seed` onto [0, 1), so the
    /// same (experiment, session) pair always lands on the same variant,
    /// across processes and platforms.
    fn deterministic_point(experiment_id: &str, seed: &str) -> f64 {
        let mut hasher = Sha256::new();
        hasher.update(experiment_id.as_bytes());
        hasher.update(b":");
        hasher.update(seed.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(bytes) as f64 / (u64::MAX as f64 + 1.0)
    }
}

/// Build the stock experiments the engine ships with.
///
/// Three experiments run by default: entity boosting variations, NLP
/// enhancement on/off, and value alignment on/off.
pub fn stock_experiments() -> Vec<Experiment> {
    let boosting_variant = |id: &str,
                            name: &str,
                            description: &str,
                            product: f64,
                            merchant: f64,
                            brand: f64| {
        Variant::new(
            id,
            name,
            description,
            25.0,
            25.0,
            Arc::new(move |mut options: SearchOptions| {
                options.entity_boosting = Some(EntityBoosting {
                    product_boost: Some(product),
                    merchant_boost: Some(merchant),
                    brand_boost: Some(brand),
                });
                options
            }),
        )
    };

    vec![
        Experiment::running(
            "entity_boosting_experiment",
            "Entity Boosting Experiment",
            "Tests different entity boosting configurations",
            vec![
                Variant::control(25.0, 25.0),
                boosting_variant(
                    "product_focused",
                    "Product Focused",
                    "Higher product boosting",
                    1.5,
                    0.7,
                    0.8,
                ),
                boosting_variant(
                    "merchant_focused",
                    "Merchant Focused",
                    "Higher merchant boosting",
                    0.8,
                    1.5,
                    0.7,
                ),
                boosting_variant(
                    "balanced",
                    "Balanced",
                    "Equal boosting for all entities",
                    1.0,
                    1.0,
                    1.0,
                ),
            ],
        ),
        Experiment::running(
            "nlp_enhancement_experiment",
            "NLP Enhancement Experiment",
            "Tests different NLP enhancement configurations",
            vec![
                Variant::new(
                    "control",
                    "Control",
                    "No NLP enhancement",
                    50.0,
                    50.0,
                    Arc::new(|mut options: SearchOptions| {
                        options.enable_nlp = false;
                        options
                    }),
                ),
                Variant::new(
                    "nlp_enhanced",
                    "NLP Enhanced",
                    "With NLP enhancement",
                    50.0,
                    50.0,
                    Arc::new(|mut options: SearchOptions| {
                        options.enable_nlp = true;
                        options
                    }),
                ),
            ],
        ),
        Experiment::running(
            "value_alignment_experiment",
            "Value Alignment Experiment",
            "Tests different value alignment configurations",
            vec![
                Variant::new(
                    "control",
                    "Control",
                    "No value alignment boosting",
                    50.0,
                    50.0,
                    Arc::new(|mut options: SearchOptions| {
                        options.boost_by_values = false;
                        options
                    }),
                ),
                Variant::new(
                    "value_aligned",
                    "Value Aligned",
                    "With value alignment boosting",
                    50.0,
                    50.0,
                    Arc::new(|mut options: SearchOptions| {
                        options.boost_by_values = true;
                        options
                    }),
                ),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use marketplace_search_shared::SearchEntityType;

    fn engine() -> ExperimentEngine {
        ExperimentEngine::new(Arc::new(ExperimentRegistry::with_stock_experiments()), true)
    }

    fn options() -> SearchOptions {
        SearchOptions::new("shirt", SearchEntityType::All)
    }

    #[test]
    fn test_status_transitions() {
        use ExperimentStatus::*;

        assert!(Draft.can_transition_to(Running));
        assert!(Running.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Paused.can_transition_to(Completed));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Draft.can_transition_to(Paused));
    }

    #[test]
    fn test_get_unknown_experiment_is_none() {
        assert!(engine().get_experiment("does-not-exist").is_none());
    }

    #[test]
    fn test_apply_unknown_experiment_is_noop() {
        let original = options();
        let derived = engine().apply_experiment(original.clone(), "does-not-exist", None);
        assert_eq!(derived, original);
    }

    #[test]
    fn test_apply_unknown_variant_is_noop() {
        let original = options();
        let derived = engine().apply_experiment(
            original.clone(),
            "entity_boosting_experiment",
            Some("does-not-exist"),
        );
        assert_eq!(derived, original);
    }

    #[test]
    fn test_apply_named_variant() {
        let derived = engine().apply_experiment(
            options(),
            "entity_boosting_experiment",
            Some("product_focused"),
        );

        assert_eq!(
            derived.experiment_id.as_deref(),
            Some("entity_boosting_experiment:product_focused")
        );
        let boosting = derived.entity_boosting.unwrap();
        assert_eq!(boosting.product_boost, Some(1.5));
        assert_eq!(boosting.merchant_boost, Some(0.7));
    }

    #[test]
    fn test_apply_does_not_mutate_original() {
        let original = options();
        let _ = engine().apply_experiment(
            original.clone(),
            "nlp_enhancement_experiment",
            Some("nlp_enhanced"),
        );
        assert!(original.experiment_id.is_none());
        assert!(!original.enable_nlp);
    }

    #[test]
    fn test_disabled_engine_is_noop() {
        let disabled =
            ExperimentEngine::new(Arc::new(ExperimentRegistry::with_stock_experiments()), false);
        let original = options();
        let derived =
            disabled.apply_experiment(original.clone(), "entity_boosting_experiment", None);
        assert_eq!(derived, original);
    }

    #[test]
    fn test_non_running_experiment_is_skipped() {
        let registry = ExperimentRegistry::new();
        let mut experiment = Experiment::running(
            "paused_exp",
            "Paused",
            "",
            vec![Variant::control(100.0, 100.0)],
        );
        experiment.status = ExperimentStatus::Paused;
        registry.register(experiment).unwrap();

        let engine = ExperimentEngine::new(Arc::new(registry), true);
        let original = options();
        let derived = engine.apply_experiment(original.clone(), "paused_exp", None);
        assert_eq!(derived, original);
    }

    #[test]
    fn test_deterministic_assignment_is_stable() {
        let engine = engine();
        let mut opts = options();
        opts.session_id = Some("session-42".to_string());

        let first = engine.apply_experiment(opts.clone(), "entity_boosting_experiment", None);
        for _ in 0..20 {
            let again = engine.apply_experiment(opts.clone(), "entity_boosting_experiment", None);
            assert_eq!(first.experiment_id, again.experiment_id);
        }
    }

    #[test]
    fn test_weighted_selection_converges_to_weight_share() {
        let experiment = Experiment::running(
            "weights",
            "Weights",
            "",
            vec![
                Variant::new("a", "A", "", 10.0, 10.0, Arc::new(|o| o)),
                Variant::new("b", "B", "", 30.0, 30.0, Arc::new(|o| o)),
                Variant::new("c", "C", "", 60.0, 60.0, Arc::new(|o| o)),
            ],
        );

        let trials = 10_000;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..trials {
            let variant = ExperimentEngine::select_variant(&experiment, None).unwrap();
            *counts.entry(variant.id.clone()).or_insert(0) += 1;
        }

        let share = |id: &str| *counts.get(id).unwrap_or(&0) as f64 / trials as f64;
        assert!((share("a") - 0.1).abs() < 0.02, "a: {}", share("a"));
        assert!((share("b") - 0.3).abs() < 0.02, "b: {}", share("b"));
        assert!((share("c") - 0.6).abs() < 0.02, "c: {}", share("c"));
    }

    #[test]
    fn test_zero_total_weight_falls_back_to_first_variant() {
        let experiment = Experiment::running(
            "zero",
            "Zero",
            "",
            vec![
                Variant::new("a", "A", "", 0.0, 0.0, Arc::new(|o| o)),
                Variant::new("b", "B", "", 0.0, 0.0, Arc::new(|o| o)),
            ],
        );

        let variant = ExperimentEngine::select_variant(&experiment, None).unwrap();
        assert_eq!(variant.id, "a");
    }

    #[test]
    fn test_process_results_tags_resolved_assignment() {
        let engine = engine();
        let derived = engine.apply_experiment(
            options(),
            "value_alignment_experiment",
            Some("value_aligned"),
        );

        let mut response = SearchResponse::empty("shirt", 0, 20);
        engine.process_experiment_results(&mut response, &derived);
        assert_eq!(
            response.experiment_id.as_deref(),
            Some("value_alignment_experiment:value_aligned")
        );
    }

    #[test]
    fn test_process_results_ignores_unresolved_tag() {
        let engine = engine();
        let mut opts = options();
        opts.experiment_id = Some("does-not-exist".to_string());

        let mut response = SearchResponse::empty("shirt", 0, 20);
        engine.process_experiment_results(&mut response, &opts);
        assert!(response.experiment_id.is_none());
    }

    #[test]
    fn test_experiment_validation() {
        let empty = Experiment::running("e", "E", "", vec![]);
        assert!(empty.validate().is_err());

        let negative = Experiment::running(
            "n",
            "N",
            "",
            vec![Variant::new("a", "A", "", -1.0, 0.0, Arc::new(|o| o))],
        );
        assert!(negative.validate().is_err());

        let valid = Experiment::running("v", "V", "", vec![Variant::control(1.0, 100.0)]);
        assert!(valid.validate().is_ok());
    }
}
