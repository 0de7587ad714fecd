//! The Event Record: one decoded GENIE summary-tree row.
//!
//! Scalar fields are stored as read; everything else (energy transfer,
//! momentum transfer, lepton mass and kinematics) is derived on demand and
//! never cached, so an [`EventRecord`] is a plain immutable value.

use serde::{Deserialize, Serialize};
use std::ops::Sub;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Maximum number of particles per list in the row format.
pub const PARTICLE_CAPACITY: usize = 250;

/// Proton rest mass in GeV, used for proton kinetic energies.
pub const PROTON_MASS: f64 = 0.938272;

/// Value of [`EventRecord::lmass`] when the lepton flavour is unclassified.
pub const UNDEFINED_LEPTON_MASS: f64 = -9999.0;

/// Charged-lepton masses in GeV.
pub const ELECTRON_MASS: f64 = 0.510999e-3;
pub const MUON_MASS: f64 = 105.658e-3;
pub const TAU_MASS: f64 = 1776.82e-3;

/// PDG species codes used by the classifier and aggregates.
pub mod pdg {
    pub const NU_E: i32 = 12;
    pub const NU_MU: i32 = 14;
    pub const NU_TAU: i32 = 16;
    pub const PROTON: i32 = 2212;
    pub const NEUTRON: i32 = 2112;
    pub const PI_PLUS: i32 = 211;
    pub const PI_ZERO: i32 = 111;
    pub const K_PLUS: i32 = 321;
    pub const K_ZERO: i32 = 311;
    pub const K_LONG: i32 = 130;
    pub const K_SHORT: i32 = 310;
    pub const GAMMA: i32 = 22;
    pub const ELECTRON: i32 = 11;
}

// ── ThreeVector ───────────────────────────────────────────────────────────────

/// A Cartesian 3-momentum in GeV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ThreeVector {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude.
    pub fn mag(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Cosine of the polar angle with respect to the z-axis.
    ///
    /// A zero-length vector has no direction; it reports `1.0`.
    pub fn cos_theta(&self) -> f64 {
        let mag = self.mag();
        if mag == 0.0 {
            1.0
        } else {
            self.z / mag
        }
    }
}

impl Sub for ThreeVector {
    type Output = ThreeVector;

    fn sub(self, rhs: ThreeVector) -> ThreeVector {
        ThreeVector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ── Particles ─────────────────────────────────────────────────────────────────

/// One entry of a particle list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// PDG species code.
    pub pdg: i32,
    /// Total energy (GeV).
    pub energy: f64,
    pub momentum: ThreeVector,
}

impl Particle {
    pub fn new(pdg: i32, energy: f64, momentum: ThreeVector) -> Self {
        Self {
            pdg,
            energy,
            momentum,
        }
    }

    pub fn is_proton(&self) -> bool {
        self.pdg == pdg::PROTON
    }

    /// Kinetic energy assuming the proton rest mass.
    pub fn proton_kinetic_energy(&self) -> f64 {
        self.energy - PROTON_MASS
    }
}

/// Species tracked by the stored per-list summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Proton,
    Neutron,
    PiPlus,
    PiMinus,
    PiZero,
    KPlus,
    KMinus,
    KZero,
    Em,
}

impl Species {
    pub const ALL: [Species; 9] = [
        Species::Proton,
        Species::Neutron,
        Species::PiPlus,
        Species::PiMinus,
        Species::PiZero,
        Species::KPlus,
        Species::KMinus,
        Species::KZero,
        Species::Em,
    ];

    /// Column-name suffix, e.g. `"pip"` in `nipip`.
    pub fn suffix(self) -> &'static str {
        match self {
            Species::Proton => "p",
            Species::Neutron => "n",
            Species::PiPlus => "pip",
            Species::PiMinus => "pim",
            Species::PiZero => "pi0",
            Species::KPlus => "kp",
            Species::KMinus => "km",
            Species::KZero => "k0",
            Species::Em => "em",
        }
    }

    /// Human-readable symbol used in axis captions.
    pub fn symbol(self) -> &'static str {
        match self {
            Species::Proton => "p",
            Species::Neutron => "n",
            Species::PiPlus => "π⁺",
            Species::PiMinus => "π⁻",
            Species::PiZero => "π⁰",
            Species::KPlus => "K⁺",
            Species::KMinus => "K⁻",
            Species::KZero => "K⁰",
            Species::Em => "EM",
        }
    }

    /// Species for a PDG code, if it is one of the tracked kinds.
    pub fn from_pdg(code: i32) -> Option<Species> {
        match code {
            pdg::PROTON => Some(Species::Proton),
            pdg::NEUTRON => Some(Species::Neutron),
            pdg::PI_PLUS => Some(Species::PiPlus),
            c if c == -pdg::PI_PLUS => Some(Species::PiMinus),
            pdg::PI_ZERO => Some(Species::PiZero),
            pdg::K_PLUS => Some(Species::KPlus),
            c if c == -pdg::K_PLUS => Some(Species::KMinus),
            pdg::K_ZERO | pdg::K_LONG | pdg::K_SHORT => Some(Species::KZero),
            c if c == -pdg::K_ZERO => Some(Species::KZero),
            pdg::GAMMA | pdg::ELECTRON => Some(Species::Em),
            c if c == -pdg::ELECTRON => Some(Species::Em),
            _ => None,
        }
    }
}

/// Which particle list a quantity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Before intra-nuclear transport (primary state).
    Initial,
    /// After intra-nuclear transport (final state).
    Final,
}

impl Stage {
    /// Column-name prefix letter: `i` or `f`.
    pub fn prefix(self) -> &'static str {
        match self {
            Stage::Initial => "i",
            Stage::Final => "f",
        }
    }
}

/// Stored per-species multiplicities for one particle list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCounts {
    pub proton: u32,
    pub neutron: u32,
    pub pi_plus: u32,
    pub pi_minus: u32,
    pub pi_zero: u32,
    pub k_plus: u32,
    pub k_minus: u32,
    pub k_zero: u32,
    pub em: u32,
}

impl SpeciesCounts {
    pub fn get(&self, species: Species) -> u32 {
        match species {
            Species::Proton => self.proton,
            Species::Neutron => self.neutron,
            Species::PiPlus => self.pi_plus,
            Species::PiMinus => self.pi_minus,
            Species::PiZero => self.pi_zero,
            Species::KPlus => self.k_plus,
            Species::KMinus => self.k_minus,
            Species::KZero => self.k_zero,
            Species::Em => self.em,
        }
    }

    fn slot(&mut self, species: Species) -> &mut u32 {
        match species {
            Species::Proton => &mut self.proton,
            Species::Neutron => &mut self.neutron,
            Species::PiPlus => &mut self.pi_plus,
            Species::PiMinus => &mut self.pi_minus,
            Species::PiZero => &mut self.pi_zero,
            Species::KPlus => &mut self.k_plus,
            Species::KMinus => &mut self.k_minus,
            Species::KZero => &mut self.k_zero,
            Species::Em => &mut self.em,
        }
    }

    /// Count species from PDG codes, for synthetic events.
    pub fn tally(particles: &[Particle]) -> Self {
        let mut counts = Self::default();
        for species in particles.iter().filter_map(|p| Species::from_pdg(p.pdg)) {
            *counts.slot(species) += 1;
        }
        counts
    }
}

/// An owned particle list holding only valid entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleList {
    particles: Vec<Particle>,
    counts: SpeciesCounts,
}

impl ParticleList {
    /// Build a list from its entries and stored counts.
    ///
    /// Returns `None` when `particles` exceeds [`PARTICLE_CAPACITY`].
    pub fn new(particles: Vec<Particle>, counts: SpeciesCounts) -> Option<Self> {
        if particles.len() > PARTICLE_CAPACITY {
            return None;
        }
        Some(Self { particles, counts })
    }

    /// Build a list whose counts are tallied from the entries themselves.
    pub fn from_particles(particles: Vec<Particle>) -> Option<Self> {
        let counts = SpeciesCounts::tally(&particles);
        Self::new(particles, counts)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn counts(&self) -> &SpeciesCounts {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Kinetic energies of every proton in list order.
    pub fn proton_kinetic_energies(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles
            .iter()
            .filter(|p| p.is_proton())
            .map(Particle::proton_kinetic_energy)
    }
}

// ── EventRecord ───────────────────────────────────────────────────────────────

/// Interaction-type flags as written by the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionFlags {
    pub qel: bool,
    pub res: bool,
    pub dis: bool,
    pub coh: bool,
    pub dfr: bool,
    pub imd: bool,
    pub nuel: bool,
    pub cc: bool,
    pub nc: bool,
}

/// One simulated neutrino interaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRecord {
    /// Incoming neutrino PDG code.
    pub neu: i32,
    /// Target nucleus PDG code.
    pub tgt: i32,
    /// Legacy NUANCE-style interaction code.
    pub nuance_code: i32,
    pub flags: InteractionFlags,
    /// Neutrino 3-momentum (GeV).
    pub nu_momentum: ThreeVector,
    /// Outgoing lepton 3-momentum (GeV).
    pub lepton_momentum: ThreeVector,
    /// Bjorken x.
    pub x: f64,
    /// Inelasticity y.
    pub y: f64,
    pub t: f64,
    /// Q² (GeV²).
    pub q2: f64,
    /// Hadronic invariant mass W (GeV).
    pub w: f64,
    /// Neutrino energy (GeV).
    pub enu: f64,
    /// Outgoing lepton energy (GeV).
    pub elep: f64,
    /// Particles before intra-nuclear transport.
    pub initial: ParticleList,
    /// Particles after intra-nuclear transport.
    pub final_state: ParticleList,
}

impl EventRecord {
    /// Energy transfer `Ev - El`.
    pub fn q0(&self) -> f64 {
        self.enu - self.elep
    }

    /// Magnitude of the three-momentum transfer.
    pub fn q3(&self) -> f64 {
        (self.nu_momentum - self.lepton_momentum).mag()
    }

    /// Charged-lepton mass implied by the neutrino flavour and current.
    ///
    /// `None` when the event is neither a recognised CC flavour nor NC.
    pub fn lepton_mass(&self) -> Option<f64> {
        let flavour = self.neu.abs();
        if self.flags.cc && flavour == pdg::NU_E {
            Some(ELECTRON_MASS)
        } else if self.flags.cc && flavour == pdg::NU_MU {
            Some(MUON_MASS)
        } else if self.flags.cc && flavour == pdg::NU_TAU {
            Some(TAU_MASS)
        } else if self.flags.nc {
            Some(0.0)
        } else {
            None
        }
    }

    /// [`lepton_mass`](Self::lepton_mass) with [`UNDEFINED_LEPTON_MASS`] for
    /// the unclassified case.
    pub fn lmass(&self) -> f64 {
        self.lepton_mass().unwrap_or(UNDEFINED_LEPTON_MASS)
    }

    /// Lepton kinetic energy. Carries the sentinel through unchanged when the
    /// lepton mass is undefined.
    pub fn tmu(&self) -> f64 {
        self.elep - self.lmass()
    }

    /// Cosine of the lepton scattering angle with respect to the z-axis.
    pub fn ctmu(&self) -> f64 {
        self.lepton_momentum.cos_theta()
    }

    pub fn particles(&self, stage: Stage) -> &ParticleList {
        match stage {
            Stage::Initial => &self.initial,
            Stage::Final => &self.final_state,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cc_event(neu: i32, elep: f64) -> EventRecord {
        EventRecord {
            neu,
            elep,
            flags: InteractionFlags {
                cc: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    // ── q0 / q3 ───────────────────────────────────────────────────────────────

    #[test]
    fn test_q0_is_energy_difference() {
        let ev = EventRecord {
            enu: 1.0,
            elep: 0.4,
            ..Default::default()
        };
        assert_eq!(ev.q0(), 0.6);
    }

    #[test]
    fn test_q3_is_magnitude_of_momentum_difference() {
        let ev = EventRecord {
            nu_momentum: ThreeVector::new(0.0, 0.0, 1.0),
            lepton_momentum: ThreeVector::new(0.0, 0.0, 0.8),
            ..Default::default()
        };
        assert!((ev.q3() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_q3_uses_all_components() {
        let ev = EventRecord {
            nu_momentum: ThreeVector::new(3.0, 0.0, 4.0),
            lepton_momentum: ThreeVector::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        assert!((ev.q3() - 5.0).abs() < 1e-12);
    }

    // ── lepton mass ───────────────────────────────────────────────────────────

    #[test]
    fn test_lepton_mass_by_flavour() {
        assert_eq!(cc_event(12, 1.0).lepton_mass(), Some(ELECTRON_MASS));
        assert_eq!(cc_event(-12, 1.0).lepton_mass(), Some(ELECTRON_MASS));
        assert_eq!(cc_event(14, 1.0).lepton_mass(), Some(MUON_MASS));
        assert_eq!(cc_event(-16, 1.0).lepton_mass(), Some(TAU_MASS));
    }

    #[test]
    fn test_lepton_mass_nc_is_zero() {
        let ev = EventRecord {
            neu: 14,
            flags: InteractionFlags {
                nc: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(ev.lepton_mass(), Some(0.0));
        assert_eq!(ev.lmass(), 0.0);
    }

    #[test]
    fn test_lmass_sentinel_when_unclassified() {
        // CC with an unknown flavour and an event that is neither CC nor NC.
        assert_eq!(cc_event(2112, 1.0).lepton_mass(), None);
        assert_eq!(cc_event(2112, 1.0).lmass(), UNDEFINED_LEPTON_MASS);
        assert_eq!(EventRecord::default().lmass(), UNDEFINED_LEPTON_MASS);
    }

    #[test]
    fn test_tmu_subtracts_lepton_mass() {
        let ev = cc_event(14, 0.5);
        assert!((ev.tmu() - (0.5 - MUON_MASS)).abs() < 1e-12);
    }

    #[test]
    fn test_tmu_propagates_sentinel() {
        let ev = cc_event(2112, 0.5);
        assert_eq!(ev.tmu(), 0.5 - UNDEFINED_LEPTON_MASS);
    }

    // ── ctmu ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_ctmu_is_z_over_magnitude() {
        let ev = EventRecord {
            lepton_momentum: ThreeVector::new(0.0, 0.6, 0.8),
            ..Default::default()
        };
        assert!((ev.ctmu() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_ctmu_zero_vector_is_forward() {
        assert_eq!(EventRecord::default().ctmu(), 1.0);
    }

    // ── particle lists ────────────────────────────────────────────────────────

    #[test]
    fn test_particle_list_rejects_over_capacity() {
        let particles = vec![Particle::default(); PARTICLE_CAPACITY + 1];
        assert!(ParticleList::new(particles, SpeciesCounts::default()).is_none());

        let particles = vec![Particle::default(); PARTICLE_CAPACITY];
        assert!(ParticleList::new(particles, SpeciesCounts::default()).is_some());
    }

    #[test]
    fn test_species_tally() {
        let particles = vec![
            Particle::new(pdg::PROTON, 1.0, ThreeVector::default()),
            Particle::new(pdg::PROTON, 1.1, ThreeVector::default()),
            Particle::new(-pdg::PI_PLUS, 0.3, ThreeVector::default()),
            Particle::new(pdg::PI_ZERO, 0.3, ThreeVector::default()),
            Particle::new(pdg::GAMMA, 0.1, ThreeVector::default()),
            Particle::new(1000060120, 11.0, ThreeVector::default()),
        ];
        let counts = SpeciesCounts::tally(&particles);
        assert_eq!(counts.get(Species::Proton), 2);
        assert_eq!(counts.get(Species::PiMinus), 1);
        assert_eq!(counts.get(Species::PiZero), 1);
        assert_eq!(counts.get(Species::Em), 1);
        assert_eq!(counts.get(Species::Neutron), 0);
    }

    #[test]
    fn test_proton_kinetic_energies_in_list_order() {
        let list = ParticleList::from_particles(vec![
            Particle::new(pdg::PROTON, PROTON_MASS + 0.2, ThreeVector::default()),
            Particle::new(pdg::NEUTRON, 1.2, ThreeVector::default()),
            Particle::new(pdg::PROTON, PROTON_MASS + 0.05, ThreeVector::default()),
        ])
        .unwrap();
        let kes: Vec<f64> = list.proton_kinetic_energies().collect();
        assert_eq!(kes.len(), 2);
        assert!((kes[0] - 0.2).abs() < 1e-12);
        assert!((kes[1] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_particles_by_stage() {
        let ev = EventRecord {
            final_state: ParticleList::from_particles(vec![Particle::new(
                pdg::PROTON,
                1.0,
                ThreeVector::default(),
            )])
            .unwrap(),
            ..Default::default()
        };
        assert!(ev.particles(Stage::Initial).is_empty());
        assert_eq!(ev.particles(Stage::Final).len(), 1);
    }
}
