//! Interaction-mode classification and event selections.
//!
//! Everything here is a pure function of one [`EventRecord`].

use serde::{Deserialize, Serialize};

use crate::event::{pdg, EventRecord};

/// Proton kinetic-energy threshold (GeV) for counting a visible proton.
pub const PROTON_KE_THRESHOLD: f64 = 0.060;

/// Lepton kinetic-energy threshold (GeV) for electron-flavour events.
pub const ELECTRON_KE_THRESHOLD: f64 = 0.030;

/// Lepton kinetic-energy threshold (GeV) for muon-flavour events.
pub const MUON_KE_THRESHOLD: f64 = 0.060;

// ── InteractionMode ───────────────────────────────────────────────────────────

/// The 11 interaction categories, indexed 0–10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionMode {
    CcQe = 0,
    CcMec = 1,
    CcRes = 2,
    CcDis = 3,
    CcCoh = 4,
    NcEl = 5,
    NcMec = 6,
    NcRes = 7,
    NcDis = 8,
    NcCoh = 9,
    Other = 10,
}

impl InteractionMode {
    /// All modes in index order.
    pub const ALL: [InteractionMode; 11] = [
        InteractionMode::CcQe,
        InteractionMode::CcMec,
        InteractionMode::CcRes,
        InteractionMode::CcDis,
        InteractionMode::CcCoh,
        InteractionMode::NcEl,
        InteractionMode::NcMec,
        InteractionMode::NcRes,
        InteractionMode::NcDis,
        InteractionMode::NcCoh,
        InteractionMode::Other,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            InteractionMode::CcQe => "CCQE",
            InteractionMode::CcMec => "CCMEC",
            InteractionMode::CcRes => "CCRes",
            InteractionMode::CcDis => "CCDIS",
            InteractionMode::CcCoh => "CCCoh",
            InteractionMode::NcEl => "NCEL",
            InteractionMode::NcMec => "NCMEC",
            InteractionMode::NcRes => "NCRes",
            InteractionMode::NcDis => "NCDIS",
            InteractionMode::NcCoh => "NCCoh",
            InteractionMode::Other => "Other",
        }
    }

    /// Labels in index order, for categorical axes.
    pub fn labels() -> Vec<String> {
        Self::ALL.iter().map(|m| m.label().to_string()).collect()
    }
}

/// Classify an event. First matching rule wins.
///
/// A legacy code of zero stands in for meson-exchange current. This is an
/// unverified heuristic.
pub fn interaction_mode(ev: &EventRecord) -> InteractionMode {
    let f = &ev.flags;
    let code_zero = ev.nuance_code == 0;

    if f.cc && f.qel {
        InteractionMode::CcQe
    } else if f.cc && f.res {
        InteractionMode::CcRes
    } else if f.cc && f.dis {
        InteractionMode::CcDis
    } else if f.cc && f.coh {
        InteractionMode::CcCoh
    } else if f.cc && code_zero {
        InteractionMode::CcMec
    } else if f.nc && f.qel {
        InteractionMode::NcEl
    } else if f.nc && f.res {
        InteractionMode::NcRes
    } else if f.nc && f.dis {
        InteractionMode::NcDis
    } else if f.nc && f.coh {
        InteractionMode::NcCoh
    } else if f.nc && code_zero {
        InteractionMode::NcMec
    } else {
        InteractionMode::Other
    }
}

// ── Selections ────────────────────────────────────────────────────────────────

/// Inclusive selection.
pub fn is_any(_ev: &EventRecord) -> bool {
    true
}

pub fn is_ccqe(ev: &EventRecord) -> bool {
    interaction_mode(ev) == InteractionMode::CcQe
}

pub fn is_ccmec(ev: &EventRecord) -> bool {
    interaction_mode(ev) == InteractionMode::CcMec
}

/// One lepton above threshold, exactly one visible proton, no π⁰.
pub fn is_1l1p0pi0(ev: &EventRecord) -> bool {
    let tally = FinalStateTally::of(ev);
    ev.flags.cc && tally.protons == 1 && tally.pi_zeros == 0 && lepton_above_threshold(ev)
}

/// One lepton above threshold and exactly one track (visible proton or
/// charged pion). Unlike [`is_1l1p0pi0`] there is no π⁰ requirement.
pub fn is_1l1trk0pi0(ev: &EventRecord) -> bool {
    let tally = FinalStateTally::of(ev);
    ev.flags.cc && tally.protons + tally.charged_pions == 1 && lepton_above_threshold(ev)
}

/// Flavour-dependent lepton kinetic-energy cut. Flavours other than νe and
/// νμ never pass.
pub fn lepton_above_threshold(ev: &EventRecord) -> bool {
    match ev.neu.abs() {
        pdg::NU_E => ev.tmu() > ELECTRON_KE_THRESHOLD,
        pdg::NU_MU => ev.tmu() > MUON_KE_THRESHOLD,
        _ => false,
    }
}

/// Post-transport multiplicities relevant to the exclusive selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalStateTally {
    /// Protons above [`PROTON_KE_THRESHOLD`].
    pub protons: u32,
    pub pi_zeros: u32,
    pub charged_pions: u32,
}

impl FinalStateTally {
    pub fn of(ev: &EventRecord) -> Self {
        let mut tally = Self::default();
        for p in ev.final_state.particles() {
            if p.is_proton() && p.proton_kinetic_energy() > PROTON_KE_THRESHOLD {
                tally.protons += 1;
            }
            if p.pdg == pdg::PI_ZERO {
                tally.pi_zeros += 1;
            }
            if p.pdg.abs() == pdg::PI_PLUS {
                tally.charged_pions += 1;
            }
        }
        tally
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InteractionFlags, Particle, ParticleList, ThreeVector, PROTON_MASS};

    fn event(flags: InteractionFlags, nuance_code: i32) -> EventRecord {
        EventRecord {
            neu: 14,
            nuance_code,
            flags,
            ..Default::default()
        }
    }

    fn cc() -> InteractionFlags {
        InteractionFlags {
            cc: true,
            ..Default::default()
        }
    }

    fn nc() -> InteractionFlags {
        InteractionFlags {
            nc: true,
            ..Default::default()
        }
    }

    /// Every branch of the priority chain, with the expected mode.
    fn branch_cases() -> Vec<(EventRecord, InteractionMode)> {
        vec![
            (event(InteractionFlags { qel: true, ..cc() }, 1), InteractionMode::CcQe),
            (event(InteractionFlags { res: true, ..cc() }, 1), InteractionMode::CcRes),
            (event(InteractionFlags { dis: true, ..cc() }, 91), InteractionMode::CcDis),
            (event(InteractionFlags { coh: true, ..cc() }, 97), InteractionMode::CcCoh),
            (event(cc(), 0), InteractionMode::CcMec),
            (event(InteractionFlags { qel: true, ..nc() }, 2), InteractionMode::NcEl),
            (event(InteractionFlags { res: true, ..nc() }, 2), InteractionMode::NcRes),
            (event(InteractionFlags { dis: true, ..nc() }, 92), InteractionMode::NcDis),
            (event(InteractionFlags { coh: true, ..nc() }, 96), InteractionMode::NcCoh),
            (event(nc(), 0), InteractionMode::NcMec),
            (event(cc(), 5), InteractionMode::Other),
            (event(nc(), 5), InteractionMode::Other),
            (event(InteractionFlags::default(), 0), InteractionMode::Other),
        ]
    }

    fn with_final_state(mut ev: EventRecord, particles: Vec<Particle>) -> EventRecord {
        ev.final_state = ParticleList::from_particles(particles).unwrap();
        ev
    }

    fn proton(ke: f64) -> Particle {
        Particle::new(pdg::PROTON, PROTON_MASS + ke, ThreeVector::default())
    }

    fn pion(code: i32) -> Particle {
        Particle::new(code, 0.3, ThreeVector::default())
    }

    fn numu_cc(elep: f64) -> EventRecord {
        EventRecord {
            neu: 14,
            elep,
            flags: cc(),
            ..Default::default()
        }
    }

    // ── interaction_mode ──────────────────────────────────────────────────────

    #[test]
    fn test_interaction_mode_every_branch() {
        for (ev, expected) in branch_cases() {
            assert_eq!(interaction_mode(&ev), expected, "flags: {:?}", ev.flags);
        }
    }

    #[test]
    fn test_interaction_mode_priority_qel_over_res() {
        let ev = event(
            InteractionFlags {
                qel: true,
                res: true,
                dis: true,
                ..cc()
            },
            0,
        );
        assert_eq!(interaction_mode(&ev), InteractionMode::CcQe);
    }

    #[test]
    fn test_interaction_mode_cc_code_zero_after_coherent() {
        let ev = event(InteractionFlags { coh: true, ..cc() }, 0);
        assert_eq!(interaction_mode(&ev), InteractionMode::CcCoh);
    }

    #[test]
    fn test_interaction_mode_indices_and_labels() {
        let labels = InteractionMode::labels();
        assert_eq!(labels.len(), 11);
        assert_eq!(labels[0], "CCQE");
        assert_eq!(labels[6], "NCMEC");
        assert_eq!(labels[10], "Other");
        for (i, mode) in InteractionMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }

    #[test]
    fn test_cc_and_nc_branches_are_disjoint() {
        for (ev, mode) in branch_cases() {
            let cc_mode = mode.index() <= 4;
            let nc_mode = (5..=9).contains(&mode.index());
            if cc_mode {
                assert!(ev.flags.cc && !ev.flags.nc);
            }
            if nc_mode {
                assert!(ev.flags.nc && !ev.flags.cc);
            }
        }
    }

    // ── is_ccqe / is_ccmec ────────────────────────────────────────────────────

    #[test]
    fn test_is_ccqe_iff_mode_zero() {
        for (ev, _) in branch_cases() {
            assert_eq!(is_ccqe(&ev), interaction_mode(&ev).index() == 0);
        }
    }

    #[test]
    fn test_is_ccmec_iff_mode_one() {
        for (ev, _) in branch_cases() {
            assert_eq!(is_ccmec(&ev), interaction_mode(&ev).index() == 1);
        }
    }

    #[test]
    fn test_is_any_always_true() {
        for (ev, _) in branch_cases() {
            assert!(is_any(&ev));
        }
    }

    // ── is_1l1p0pi0 ───────────────────────────────────────────────────────────

    #[test]
    fn test_1l1p_accepts_single_visible_proton() {
        let ev = with_final_state(numu_cc(0.5), vec![proton(0.1), proton(0.02)]);
        assert!(is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_1l1p_rejects_two_visible_protons() {
        let ev = with_final_state(numu_cc(0.5), vec![proton(0.1), proton(0.2)]);
        assert!(!is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_1l1p_rejects_pi_zero() {
        let ev = with_final_state(numu_cc(0.5), vec![proton(0.1), pion(pdg::PI_ZERO)]);
        assert!(!is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_1l1p_requires_cc() {
        let mut ev = with_final_state(numu_cc(0.5), vec![proton(0.1)]);
        ev.flags = nc();
        assert!(!is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_1l1p_lepton_threshold_by_flavour() {
        // νμ: 0.06 GeV cut on T = El - mμ.
        let low = with_final_state(numu_cc(0.105658 + 0.05), vec![proton(0.1)]);
        assert!(!is_1l1p0pi0(&low));
        let high = with_final_state(numu_cc(0.105658 + 0.07), vec![proton(0.1)]);
        assert!(is_1l1p0pi0(&high));

        // νe: 0.03 GeV cut.
        let mut nue = with_final_state(numu_cc(0.04), vec![proton(0.1)]);
        nue.neu = -12;
        assert!(is_1l1p0pi0(&nue));

        // ντ never passes.
        let mut nutau = with_final_state(numu_cc(5.0), vec![proton(0.1)]);
        nutau.neu = 16;
        assert!(!is_1l1p0pi0(&nutau));
    }

    // ── is_1l1trk0pi0 ─────────────────────────────────────────────────────────

    #[test]
    fn test_1l1trk_counts_charged_pion_as_track() {
        let ev = with_final_state(numu_cc(0.5), vec![pion(-pdg::PI_PLUS), proton(0.01)]);
        assert!(is_1l1trk0pi0(&ev));
        assert!(!is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_1l1trk_rejects_proton_plus_pion() {
        let ev = with_final_state(numu_cc(0.5), vec![pion(pdg::PI_PLUS), proton(0.2)]);
        assert!(!is_1l1trk0pi0(&ev));
    }

    #[test]
    fn test_1l1trk_has_no_pi_zero_requirement() {
        let ev = with_final_state(numu_cc(0.5), vec![proton(0.2), pion(pdg::PI_ZERO)]);
        assert!(is_1l1trk0pi0(&ev));
        assert!(!is_1l1p0pi0(&ev));
    }

    #[test]
    fn test_final_state_tally() {
        let ev = with_final_state(
            numu_cc(0.5),
            vec![
                proton(0.2),
                proton(0.03),
                pion(pdg::PI_PLUS),
                pion(-pdg::PI_PLUS),
                pion(pdg::PI_ZERO),
            ],
        );
        let tally = FinalStateTally::of(&ev);
        assert_eq!(
            tally,
            FinalStateTally {
                protons: 1,
                pi_zeros: 1,
                charged_pions: 2,
            }
        );
    }
}
