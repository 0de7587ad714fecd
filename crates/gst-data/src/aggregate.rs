//! Aggregate variants: what each histogram extracts from an event.
//!
//! An [`Aggregate`] pairs fixed binned storage with an [`AggregateKind`], the
//! tagged variant that decides which derived quantity is read from each
//! [`EventRecord`]. Binning is chosen by the kind at construction and never
//! changes afterwards.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gst_core::classifier::{interaction_mode, InteractionMode};
use gst_core::error::Result;
use gst_core::event::{EventRecord, Species, Stage};

use crate::histogram::{Axis, Binned, Hist1D, Hist2D};
use crate::sink::OutputSink;

// ── AggregateKind ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AggregateKind {
    /// (q3, q0) plane.
    MomentumTransfer,
    /// Legacy interaction code.
    NuanceCode,
    /// One stored summary count.
    ParticleCount { stage: Stage, species: Species },
    /// Classifier label.
    InteractionMode,
    LeptonKineticEnergy,
    LeptonCosTheta,
    LeptonKeVsCosTheta,
    /// Highest pre-transport proton kinetic energy.
    LeadingProtonKe,
    /// (highest, second highest) pre-transport proton kinetic energies.
    DiProtonKe,
}

/// Axis captions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    pub x: String,
    pub y: String,
}

/// Decorations the plot renderer should add for this kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotHints {
    /// Draw constant-Q² and constant-W curves.
    pub reference_curves: bool,
    /// Draw the run label box.
    pub label_box: bool,
    /// Displayed `(x_max, y_max)` when narrower than the binning.
    pub zoom: Option<(f64, f64)>,
}

impl AggregateKind {
    /// Short key used in selection tables, e.g. `"q0q3"` or `"nfpi0"`.
    pub fn key(&self) -> String {
        match self {
            AggregateKind::MomentumTransfer => "q0q3".to_string(),
            AggregateKind::NuanceCode => "nuanceCode".to_string(),
            AggregateKind::ParticleCount { stage, species } => {
                format!("n{}{}", stage.prefix(), species.suffix())
            }
            AggregateKind::InteractionMode => "intMode".to_string(),
            AggregateKind::LeptonKineticEnergy => "tmu".to_string(),
            AggregateKind::LeptonCosTheta => "ctmu".to_string(),
            AggregateKind::LeptonKeVsCosTheta => "tctmu".to_string(),
            AggregateKind::LeadingProtonKe => "leadpke".to_string(),
            AggregateKind::DiProtonKe => "pke".to_string(),
        }
    }

    /// Fresh, empty storage with this kind's binning.
    pub fn storage(&self) -> Binned {
        match self {
            AggregateKind::MomentumTransfer => Binned::Two(Hist2D::new(
                Axis::new(100, 0.0, 1.25),
                Axis::new(100, 0.0, 1.25),
            )),
            AggregateKind::NuanceCode => Binned::One(Hist1D::new(Axis::new(100, 0.0, 100.0))),
            AggregateKind::ParticleCount { .. } => {
                Binned::One(Hist1D::new(Axis::new(21, 0.0, 21.0)))
            }
            AggregateKind::InteractionMode => {
                Binned::One(Hist1D::new(Axis::categorical(InteractionMode::labels())))
            }
            AggregateKind::LeptonKineticEnergy => {
                Binned::One(Hist1D::new(Axis::new(200, 0.0, 3.5)))
            }
            AggregateKind::LeptonCosTheta => Binned::One(Hist1D::new(Axis::new(100, -1.0, 1.0))),
            AggregateKind::LeptonKeVsCosTheta => Binned::Two(Hist2D::new(
                Axis::new(100, 0.0, 3.5),
                Axis::new(100, -1.0, 1.0),
            )),
            AggregateKind::LeadingProtonKe => Binned::One(Hist1D::new(Axis::new(200, 0.0, 1.0))),
            AggregateKind::DiProtonKe => Binned::Two(Hist2D::new(
                Axis::new(100, 0.0, 1.0),
                Axis::new(100, 0.0, 1.0),
            )),
        }
    }

    pub fn titles(&self) -> Titles {
        let (x, y) = match self {
            AggregateKind::MomentumTransfer => (
                "Three-momentum transfer q₃ (GeV)".to_string(),
                "Energy transfer q₀ (GeV)".to_string(),
            ),
            AggregateKind::NuanceCode => {
                ("NUANCE interaction code".to_string(), "Entries".to_string())
            }
            AggregateKind::ParticleCount { stage, species } => {
                let suffix = match stage {
                    Stage::Initial => "",
                    Stage::Final => ", post-FSI",
                };
                (
                    format!("Number of {}{}", species.symbol(), suffix),
                    "Entries".to_string(),
                )
            }
            AggregateKind::InteractionMode => {
                ("Interaction mode".to_string(), "Entries".to_string())
            }
            AggregateKind::LeptonKineticEnergy => (
                "μ kinetic energy T_μ (GeV)".to_string(),
                "Entries".to_string(),
            ),
            AggregateKind::LeptonCosTheta => ("cos θ_μ".to_string(), "Entries".to_string()),
            AggregateKind::LeptonKeVsCosTheta => (
                "μ kinetic energy T_μ (GeV)".to_string(),
                "cos θ_μ".to_string(),
            ),
            AggregateKind::LeadingProtonKe => (
                "Leading p kinetic energy T_p (GeV)".to_string(),
                "Entries".to_string(),
            ),
            AggregateKind::DiProtonKe => (
                "Leading p kinetic energy T_p1 (GeV)".to_string(),
                "Subleading p kinetic energy T_p2 (GeV)".to_string(),
            ),
        };
        Titles { x, y }
    }

    pub fn plot_hints(&self) -> PlotHints {
        match self {
            AggregateKind::MomentumTransfer => PlotHints {
                reference_curves: true,
                label_box: true,
                zoom: None,
            },
            AggregateKind::DiProtonKe => PlotHints {
                reference_curves: false,
                label_box: true,
                zoom: Some((0.8, 0.8)),
            },
            _ => PlotHints::default(),
        }
    }
}

// ── Aggregate ─────────────────────────────────────────────────────────────────

/// A named histogram and its extraction rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    name: String,
    kind: AggregateKind,
    binned: Binned,
    /// Events seen with more than two pre-transport protons (di-proton only).
    multi_proton_events: u64,
}

impl Aggregate {
    pub fn new(name: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            name: name.into(),
            binned: kind.storage(),
            kind,
            multi_proton_events: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn binned(&self) -> &Binned {
        &self.binned
    }

    pub fn entries(&self) -> u64 {
        self.binned.entries()
    }

    pub fn multi_proton_events(&self) -> u64 {
        self.multi_proton_events
    }

    /// Accumulate one event.
    pub fn fill(&mut self, ev: &EventRecord) {
        let sample = match self.kind {
            AggregateKind::MomentumTransfer => Sample::Pair(ev.q3(), ev.q0()),
            AggregateKind::NuanceCode => Sample::Value(f64::from(ev.nuance_code)),
            AggregateKind::ParticleCount { stage, species } => {
                Sample::Value(f64::from(ev.particles(stage).counts().get(species)))
            }
            AggregateKind::InteractionMode => Sample::Value(interaction_mode(ev).index() as f64),
            AggregateKind::LeptonKineticEnergy => Sample::Value(ev.tmu()),
            AggregateKind::LeptonCosTheta => Sample::Value(ev.ctmu()),
            AggregateKind::LeptonKeVsCosTheta => Sample::Pair(ev.tmu(), ev.ctmu()),
            AggregateKind::LeadingProtonKe => match initial_proton_kes(ev).first() {
                Some(&lead) => Sample::Value(lead),
                None => Sample::Skip,
            },
            AggregateKind::DiProtonKe => {
                let kes = initial_proton_kes(ev);
                if kes.len() > 2 {
                    self.multi_proton_events += 1;
                    debug!(
                        aggregate = %self.name,
                        protons = kes.len(),
                        "more than two pre-transport protons; using the two most energetic"
                    );
                }
                match kes.as_slice() {
                    &[first, second, ..] => Sample::Pair(first, second),
                    _ => Sample::Skip,
                }
            }
        };

        match (sample, &mut self.binned) {
            (Sample::Value(v), Binned::One(h)) => h.fill(v),
            (Sample::Pair(x, y), Binned::Two(h)) => h.fill(x, y),
            // Storage always comes from `kind.storage()`, so dimensions agree.
            _ => {}
        }
    }

    /// Hand the frozen aggregate to `sink`.
    pub fn export(&self, selection: &str, sink: &mut dyn OutputSink) -> Result<()> {
        if self.kind == AggregateKind::DiProtonKe {
            info!(
                "{}: {} events with more than two protons",
                self.name, self.multi_proton_events
            );
        }
        sink.write(selection, self)
    }

    /// Add the counts of another aggregate of the same kind and binning.
    pub fn merge(&mut self, other: &Aggregate) -> bool {
        if self.kind != other.kind {
            return false;
        }
        let merged = match (&mut self.binned, &other.binned) {
            (Binned::One(a), Binned::One(b)) => a.merge(b),
            (Binned::Two(a), Binned::Two(b)) => a.merge(b),
            _ => false,
        };
        if merged {
            self.multi_proton_events += other.multi_proton_events;
        }
        merged
    }
}

/// What one event contributes to an aggregate.
enum Sample {
    Skip,
    Value(f64),
    Pair(f64, f64),
}

/// Pre-transport proton kinetic energies, highest first.
fn initial_proton_kes(ev: &EventRecord) -> Vec<f64> {
    let mut kes: Vec<f64> = ev.initial.proton_kinetic_energies().collect();
    kes.sort_by(|a, b| b.total_cmp(a));
    kes
}

// ── Tests ─────────────────────────────────────────────────────────────────────
