//! Raw row schema and its materialisation into an [`EventRecord`].
//!
//! Column names follow the GENIE summary tree (`gst`). Array columns may
//! carry a fixed-capacity tail beyond their count; only the first `count`
//! entries are materialised.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GstError, Result};
use crate::event::{
    EventRecord, InteractionFlags, Particle, ParticleList, SpeciesCounts, ThreeVector,
    PARTICLE_CAPACITY,
};

/// One row exactly as stored, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub neu: i32,
    pub tgt: i32,
    pub nuance_code: i32,

    #[serde(deserialize_with = "flag")]
    pub qel: bool,
    #[serde(deserialize_with = "flag")]
    pub res: bool,
    #[serde(deserialize_with = "flag")]
    pub dis: bool,
    #[serde(deserialize_with = "flag")]
    pub coh: bool,
    #[serde(deserialize_with = "flag")]
    pub dfr: bool,
    #[serde(deserialize_with = "flag")]
    pub imd: bool,
    #[serde(deserialize_with = "flag")]
    pub nuel: bool,
    #[serde(deserialize_with = "flag")]
    pub cc: bool,
    #[serde(deserialize_with = "flag")]
    pub nc: bool,

    pub pxv: f64,
    pub pyv: f64,
    pub pzv: f64,
    pub pxl: f64,
    pub pyl: f64,
    pub pzl: f64,
    pub x: f64,
    pub y: f64,
    pub t: f64,
    #[serde(rename = "Q2")]
    pub q2: f64,
    #[serde(rename = "W")]
    pub w: f64,
    #[serde(rename = "Ev")]
    pub enu: f64,
    #[serde(rename = "El")]
    pub elep: f64,

    // Pre-transport
    pub ni: i64,
    pub pdgi: Vec<i32>,
    #[serde(rename = "Ei")]
    pub ei: Vec<f64>,
    pub pxi: Vec<f64>,
    pub pyi: Vec<f64>,
    pub pzi: Vec<f64>,
    pub nip: i64,
    pub nin: i64,
    pub nipip: i64,
    pub nipim: i64,
    pub nipi0: i64,
    pub nikp: i64,
    pub nikm: i64,
    pub nik0: i64,
    pub niem: i64,

    // Post-transport
    pub nf: i64,
    pub pdgf: Vec<i32>,
    #[serde(rename = "Ef")]
    pub ef: Vec<f64>,
    pub pxf: Vec<f64>,
    pub pyf: Vec<f64>,
    pub pzf: Vec<f64>,
    pub nfp: i64,
    pub nfn: i64,
    pub nfpip: i64,
    pub nfpim: i64,
    pub nfpi0: i64,
    pub nfkp: i64,
    pub nfkm: i64,
    pub nfk0: i64,
    pub nfem: i64,
}

/// Accept booleans written either as JSON booleans or as 0/1 integers.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "expected a boolean flag, found {other}"
        ))),
    }
}

/// Borrowed view of one stage's columns.
struct StageColumns<'a> {
    name: &'static str,
    count: i64,
    pdg: &'a [i32],
    energy: &'a [f64],
    px: &'a [f64],
    py: &'a [f64],
    pz: &'a [f64],
    summary: [(&'static str, i64); 9],
}

impl RawRow {
    /// Parse one JSON line into a raw row. `origin` names the row in errors.
    pub fn parse(line: &str, origin: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| GstError::MalformedRow {
            origin: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the row and build the Event Record.
    ///
    /// Fails on a count above [`PARTICLE_CAPACITY`] (never truncated), on a
    /// negative count, on an array shorter than its count, and on a row
    /// flagged both CC and NC.
    pub fn into_event(self, origin: &str) -> Result<EventRecord> {
        if self.cc && self.nc {
            return Err(malformed(origin, "both cc and nc are set"));
        }

        let initial = materialise(
            StageColumns {
                name: "ni",
                count: self.ni,
                pdg: &self.pdgi,
                energy: &self.ei,
                px: &self.pxi,
                py: &self.pyi,
                pz: &self.pzi,
                summary: [
                    ("nip", self.nip),
                    ("nin", self.nin),
                    ("nipip", self.nipip),
                    ("nipim", self.nipim),
                    ("nipi0", self.nipi0),
                    ("nikp", self.nikp),
                    ("nikm", self.nikm),
                    ("nik0", self.nik0),
                    ("niem", self.niem),
                ],
            },
            origin,
        )?;
        let final_state = materialise(
            StageColumns {
                name: "nf",
                count: self.nf,
                pdg: &self.pdgf,
                energy: &self.ef,
                px: &self.pxf,
                py: &self.pyf,
                pz: &self.pzf,
                summary: [
                    ("nfp", self.nfp),
                    ("nfn", self.nfn),
                    ("nfpip", self.nfpip),
                    ("nfpim", self.nfpim),
                    ("nfpi0", self.nfpi0),
                    ("nfkp", self.nfkp),
                    ("nfkm", self.nfkm),
                    ("nfk0", self.nfk0),
                    ("nfem", self.nfem),
                ],
            },
            origin,
        )?;

        Ok(EventRecord {
            neu: self.neu,
            tgt: self.tgt,
            nuance_code: self.nuance_code,
            flags: InteractionFlags {
                qel: self.qel,
                res: self.res,
                dis: self.dis,
                coh: self.coh,
                dfr: self.dfr,
                imd: self.imd,
                nuel: self.nuel,
                cc: self.cc,
                nc: self.nc,
            },
            nu_momentum: ThreeVector::new(self.pxv, self.pyv, self.pzv),
            lepton_momentum: ThreeVector::new(self.pxl, self.pyl, self.pzl),
            x: self.x,
            y: self.y,
            t: self.t,
            q2: self.q2,
            w: self.w,
            enu: self.enu,
            elep: self.elep,
            initial,
            final_state,
        })
    }
}

impl From<&EventRecord> for RawRow {
    fn from(ev: &EventRecord) -> Self {
        let columns = |list: &ParticleList| {
            let ps = list.particles();
            (
                ps.len() as i64,
                ps.iter().map(|p| p.pdg).collect::<Vec<_>>(),
                ps.iter().map(|p| p.energy).collect::<Vec<_>>(),
                ps.iter().map(|p| p.momentum.x).collect::<Vec<_>>(),
                ps.iter().map(|p| p.momentum.y).collect::<Vec<_>>(),
                ps.iter().map(|p| p.momentum.z).collect::<Vec<_>>(),
            )
        };
        let (ni, pdgi, ei, pxi, pyi, pzi) = columns(&ev.initial);
        let (nf, pdgf, ef, pxf, pyf, pzf) = columns(&ev.final_state);
        let ci = ev.initial.counts();
        let cf = ev.final_state.counts();

        RawRow {
            neu: ev.neu,
            tgt: ev.tgt,
            nuance_code: ev.nuance_code,
            qel: ev.flags.qel,
            res: ev.flags.res,
            dis: ev.flags.dis,
            coh: ev.flags.coh,
            dfr: ev.flags.dfr,
            imd: ev.flags.imd,
            nuel: ev.flags.nuel,
            cc: ev.flags.cc,
            nc: ev.flags.nc,
            pxv: ev.nu_momentum.x,
            pyv: ev.nu_momentum.y,
            pzv: ev.nu_momentum.z,
            pxl: ev.lepton_momentum.x,
            pyl: ev.lepton_momentum.y,
            pzl: ev.lepton_momentum.z,
            x: ev.x,
            y: ev.y,
            t: ev.t,
            q2: ev.q2,
            w: ev.w,
            enu: ev.enu,
            elep: ev.elep,
            ni,
            pdgi,
            ei,
            pxi,
            pyi,
            pzi,
            nip: ci.proton.into(),
            nin: ci.neutron.into(),
            nipip: ci.pi_plus.into(),
            nipim: ci.pi_minus.into(),
            nipi0: ci.pi_zero.into(),
            nikp: ci.k_plus.into(),
            nikm: ci.k_minus.into(),
            nik0: ci.k_zero.into(),
            niem: ci.em.into(),
            nf,
            pdgf,
            ef,
            pxf,
            pyf,
            pzf,
            nfp: cf.proton.into(),
            nfn: cf.neutron.into(),
            nfpip: cf.pi_plus.into(),
            nfpim: cf.pi_minus.into(),
            nfpi0: cf.pi_zero.into(),
            nfkp: cf.k_plus.into(),
            nfkm: cf.k_minus.into(),
            nfk0: cf.k_zero.into(),
            nfem: cf.em.into(),
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn malformed(origin: &str, reason: impl Into<String>) -> GstError {
    GstError::MalformedRow {
        origin: origin.to_string(),
        reason: reason.into(),
    }
}

fn materialise(cols: StageColumns<'_>, origin: &str) -> Result<ParticleList> {
    if cols.count < 0 {
        return Err(malformed(
            origin,
            format!("{} is negative ({})", cols.name, cols.count),
        ));
    }
    if cols.count as u64 > PARTICLE_CAPACITY as u64 {
        return Err(GstError::ParticleOverflow {
            origin: origin.to_string(),
            list: cols.name,
            count: cols.count,
            capacity: PARTICLE_CAPACITY,
        });
    }

    let n = cols.count as usize;
    let shortest = [
        cols.pdg.len(),
        cols.energy.len(),
        cols.px.len(),
        cols.py.len(),
        cols.pz.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);
    if shortest < n {
        return Err(malformed(
            origin,
            format!(
                "{} is {} but its particle arrays hold only {} entries",
                cols.name, n, shortest
            ),
        ));
    }

    let mut counts = [0u32; 9];
    for (slot, (column, value)) in counts.iter_mut().zip(cols.summary) {
        *slot = u32::try_from(value)
            .map_err(|_| malformed(origin, format!("{column} is out of range ({value})")))?;
    }
    let [proton, neutron, pi_plus, pi_minus, pi_zero, k_plus, k_minus, k_zero, em] = counts;

    let particles: Vec<Particle> = (0..n)
        .map(|i| {
            Particle::new(
                cols.pdg[i],
                cols.energy[i],
                ThreeVector::new(cols.px[i], cols.py[i], cols.pz[i]),
            )
        })
        .collect();

    ParticleList::new(
        particles,
        SpeciesCounts {
            proton,
            neutron,
            pi_plus,
            pi_minus,
            pi_zero,
            k_plus,
            k_minus,
            k_zero,
            em,
        },
    )
    .ok_or_else(|| GstError::ParticleOverflow {
        origin: origin.to_string(),
        list: cols.name,
        count: cols.count,
        capacity: PARTICLE_CAPACITY,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
