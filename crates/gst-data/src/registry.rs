//! Selection Registry: named predicates and the aggregates they gate.
//!
//! A [`RegistryBuilder`] collects selection definitions; [`RegistryBuilder::build`]
//! validates names and freezes them into a [`Registry`]. After that only the
//! counts inside each aggregate change.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use gst_core::classifier;
use gst_core::error::{GstError, Result};
use gst_core::event::{EventRecord, Species, Stage};
use gst_core::run_tag::RunTag;
use tracing::info;

use crate::aggregate::{Aggregate, AggregateKind};

// ── Predicate ─────────────────────────────────────────────────────────────────

/// Event-inclusion rule of a selection.
#[derive(Clone, Copy)]
pub enum Predicate {
    Any,
    CcQe,
    CcMec,
    /// One lepton, one visible proton, no π⁰.
    OneLepOneProton,
    /// One lepton, one track (visible proton or charged pion).
    OneLepOneTrack,
    /// Any other pure function of the event.
    Custom(fn(&EventRecord) -> bool),
}

impl Predicate {
    pub fn accepts(&self, ev: &EventRecord) -> bool {
        match self {
            Predicate::Any => classifier::is_any(ev),
            Predicate::CcQe => classifier::is_ccqe(ev),
            Predicate::CcMec => classifier::is_ccmec(ev),
            Predicate::OneLepOneProton => classifier::is_1l1p0pi0(ev),
            Predicate::OneLepOneTrack => classifier::is_1l1trk0pi0(ev),
            Predicate::Custom(f) => f(ev),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Any => f.write_str("Any"),
            Predicate::CcQe => f.write_str("CcQe"),
            Predicate::CcMec => f.write_str("CcMec"),
            Predicate::OneLepOneProton => f.write_str("OneLepOneProton"),
            Predicate::OneLepOneTrack => f.write_str("OneLepOneTrack"),
            Predicate::Custom(_) => f.write_str("Custom"),
        }
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// A predicate and the aggregates it feeds, keyed by short name.
#[derive(Debug, Clone)]
pub struct Selection {
    name: String,
    predicate: Predicate,
    aggregates: BTreeMap<String, Aggregate>,
    passed: u64,
}

impl Selection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> Predicate {
        self.predicate
    }

    /// `(key, aggregate)` pairs in key order.
    pub fn aggregates(&self) -> impl Iterator<Item = (&str, &Aggregate)> {
        self.aggregates.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn aggregate(&self, key: &str) -> Option<&Aggregate> {
        self.aggregates.get(key)
    }

    /// Number of events that passed the predicate so far.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Fill every aggregate if the event passes. Returns whether it passed.
    pub fn fill(&mut self, ev: &EventRecord) -> bool {
        if !self.predicate.accepts(ev) {
            return false;
        }
        self.passed += 1;
        for aggregate in self.aggregates.values_mut() {
            aggregate.fill(ev);
        }
        true
    }
}

// ── RegistryBuilder ───────────────────────────────────────────────────────────

#[derive(Debug)]
struct SelectionDef {
    name: String,
    predicate: Predicate,
    kinds: Vec<AggregateKind>,
}

/// Unbuilt registry.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    defs: Vec<SelectionDef>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a selection with one aggregate per kind.
    pub fn selection(
        mut self,
        name: impl Into<String>,
        predicate: Predicate,
        kinds: impl IntoIterator<Item = AggregateKind>,
    ) -> Self {
        self.defs.push(SelectionDef {
            name: name.into(),
            predicate,
            kinds: kinds.into_iter().collect(),
        });
        self
    }

    /// Validate names and create the aggregates.
    ///
    /// Fails with [`GstError::DuplicateName`] on a repeated selection name, a
    /// repeated aggregate key within a selection, or a repeated aggregate
    /// name across the registry.
    pub fn build(self) -> Result<Registry> {
        let mut selections = BTreeMap::new();
        let mut names = HashSet::new();

        for def in self.defs {
            if selections.contains_key(&def.name) {
                return Err(GstError::DuplicateName(format!("selection '{}'", def.name)));
            }

            let mut aggregates = BTreeMap::new();
            for kind in def.kinds {
                let key = kind.key();
                let name = aggregate_name(&def.name, &kind);
                if aggregates.contains_key(&key) || !names.insert(name.clone()) {
                    return Err(GstError::DuplicateName(format!(
                        "aggregate '{}' in selection '{}'",
                        name, def.name
                    )));
                }
                aggregates.insert(key, Aggregate::new(name, kind));
            }

            selections.insert(
                def.name.clone(),
                Selection {
                    name: def.name,
                    predicate: def.predicate,
                    aggregates,
                    passed: 0,
                },
            );
        }

        Ok(Registry { selections })
    }
}

/// `h_<selection>_<key>`, with the interaction-mode key lower-cased.
pub fn aggregate_name(selection: &str, kind: &AggregateKind) -> String {
    let key = match kind {
        AggregateKind::InteractionMode => kind.key().to_lowercase(),
        _ => kind.key(),
    };
    format!("h_{selection}_{key}")
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Built registry. Selections iterate in name order.
#[derive(Debug, Clone)]
pub struct Registry {
    selections: BTreeMap<String, Selection>,
}

impl Registry {
    /// Assemble the standard selections for a run.
    ///
    /// A run whose generator tag equals `reduced_generator` gets only the
    /// `ccmec` selection; every other run gets `all`, `ccqe`, `1l1p` and
    /// `1l1trk`.
    pub fn for_run(tag: &RunTag, reduced_generator: &str) -> Result<Self> {
        let builder = if tag.is_reduced(reduced_generator) {
            info!("Generator '{}': booking reduced histogram set", tag.generator);
            reduced_set()
        } else {
            full_set()
        };
        builder.build()
    }

    pub fn selections(&self) -> impl DoubleEndedIterator<Item = &Selection> {
        self.selections.values()
    }

    pub fn selections_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Selection> {
        self.selections.values_mut()
    }

    pub fn selection(&self, name: &str) -> Option<&Selection> {
        self.selections.get(name)
    }

    /// Offer one event to every selection. Returns how many accepted it.
    pub fn fill(&mut self, ev: &EventRecord) -> usize {
        self.selections_mut().map(|s| s.fill(ev)).filter(|&passed| passed).count()
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Total number of aggregates across all selections.
    pub fn aggregate_count(&self) -> usize {
        self.selections.values().map(|s| s.aggregates.len()).sum()
    }
}

// ── Standard sets ─────────────────────────────────────────────────────────────

/// Summary counts histogrammed for the inclusive selection, in column order.
const COUNTED_SPECIES: [Species; 8] = [
    Species::Proton,
    Species::Neutron,
    Species::PiPlus,
    Species::PiMinus,
    Species::PiZero,
    Species::KPlus,
    Species::KMinus,
    Species::KZero,
];

fn full_set() -> RegistryBuilder {
    let counts = [Stage::Initial, Stage::Final].into_iter().flat_map(|stage| {
        COUNTED_SPECIES
            .into_iter()
            .map(move |species| AggregateKind::ParticleCount { stage, species })
    });

    let inclusive = [
        AggregateKind::MomentumTransfer,
        AggregateKind::NuanceCode,
        AggregateKind::InteractionMode,
    ]
    .into_iter()
    .chain(counts);

    let exclusive = [
        AggregateKind::MomentumTransfer,
        AggregateKind::NuanceCode,
        AggregateKind::InteractionMode,
    ];

    RegistryBuilder::new()
        .selection("all", Predicate::Any, inclusive)
        .selection(
            "ccqe",
            Predicate::CcQe,
            [
                AggregateKind::MomentumTransfer,
                AggregateKind::LeptonKineticEnergy,
                AggregateKind::LeptonCosTheta,
                AggregateKind::LeptonKeVsCosTheta,
            ],
        )
        .selection("1l1p", Predicate::OneLepOneProton, exclusive)
        .selection("1l1trk", Predicate::OneLepOneTrack, exclusive)
}

fn reduced_set() -> RegistryBuilder {
    RegistryBuilder::new().selection(
        "ccmec",
        Predicate::CcMec,
        [
            AggregateKind::MomentumTransfer,
            AggregateKind::DiProtonKe,
            AggregateKind::LeadingProtonKe,
        ],
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
