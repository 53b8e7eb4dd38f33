//! Synthetic sample files for demos and tests.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use edmio_types::{builtin_schemas, ObjectId, RecordSchema, Value, EVENT_HEADER_TYPE};

use crate::error::{FormatError, FormatResult};
use crate::writer::{ColumnWriter, EventRecords, FileSummary};

pub const HEADER_COLLECTION: &str = "EventHeader";
pub const PARTICLE_COLLECTION: &str = "MCParticles";
pub const HIT_COLLECTION: &str = "SimTrackerHits";

const PARTICLE_TYPE: &str = "edm4hep::MCParticleData";
const HIT_TYPE: &str = "edm4hep::SimTrackerHitData";

/// (PDG code, charge, mass in GeV)
const SPECIES: [(i32, f32, f64); 6] = [
    (11, -1.0, 0.000_511),
    (-11, 1.0, 0.000_511),
    (13, -1.0, 0.105_66),
    (22, 0.0, 0.0),
    (211, 1.0, 0.139_57),
    (2212, 1.0, 0.938_27),
];

/// Shape of a synthetic file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleSpec {
    pub events: u64,
    pub particles: u32,
    pub hits: u32,
    pub run_number: i32,
    pub seed: u64,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            events: 10,
            particles: 5,
            hits: 20,
            run_number: 1,
            seed: 42,
        }
    }
}

/// Write a synthetic file with an event header, generated particles, tracker
/// hits, and a hit-to-particle relation collection (`SimTrackerHits#0`).
///
/// Event `i` carries event number `i` and `layout.run_number`. Output is fully
/// determined by `layout`.
pub fn write_sample(path: impl AsRef<Path>, layout: &SampleSpec) -> FormatResult<FileSummary> {
    let header_schema = builtin(EVENT_HEADER_TYPE)?;
    let particle_schema = builtin(PARTICLE_TYPE)?;
    let hit_schema = builtin(HIT_TYPE)?;

    let mut writer = ColumnWriter::create(path)?;
    let header_id = writer.declare_collection(HEADER_COLLECTION, &header_schema)?;
    let particle_id = writer.declare_collection(PARTICLE_COLLECTION, &particle_schema)?;
    let hit_id = writer.declare_collection(HIT_COLLECTION, &hit_schema)?;
    let link_id = writer.declare_relation(HIT_COLLECTION)?;

    let mut rng = StdRng::seed_from_u64(layout.seed);
    for event in 0..layout.events {
        let mut records = EventRecords::new();

        let header = header_schema.encode(&[
            Value::I32(event as i32),
            Value::I32(layout.run_number),
            Value::U64(1_700_000_000 + event),
            Value::F64(1.0),
        ])?;
        records.append(header_id, &header);

        for _ in 0..layout.particles {
            let (pdg, charge, mass) = SPECIES[rng.gen_range(0..SPECIES.len())];
            let momentum = [
                rng.gen_range(-5.0..5.0f32),
                rng.gen_range(-5.0..5.0f32),
                rng.gen_range(-20.0..20.0f32),
            ];
            let vertex = [
                rng.gen_range(-0.1..0.1),
                rng.gen_range(-0.1..0.1),
                rng.gen_range(-10.0..10.0),
            ];
            let endpoint = [
                vertex[0] + f64::from(momentum[0]) * 100.0,
                vertex[1] + f64::from(momentum[1]) * 100.0,
                vertex[2] + f64::from(momentum[2]) * 100.0,
            ];
            let record = particle_schema.encode(&[
                Value::I32(pdg),
                Value::I32(1),
                Value::I32(0),
                Value::F32(charge),
                Value::F32(rng.gen_range(0.0..1.0)),
                Value::F64(mass),
                Value::Vec3D(vertex),
                Value::Vec3D(endpoint),
                Value::Vec3F(momentum),
                Value::Vec3F([0.0; 3]),
            ])?;
            records.append(particle_id, &record);
        }

        let mut links = Vec::with_capacity(layout.hits as usize);
        for _ in 0..layout.hits {
            let record = hit_schema.encode(&[
                Value::U64(rng.gen()),
                Value::F32(rng.gen_range(0.0..1.0e-4)),
                Value::F32(rng.gen_range(0.0..20.0)),
                Value::F32(rng.gen_range(0.0..1.0)),
                Value::I32(0),
                Value::Vec3D([
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-1000.0..1000.0),
                    rng.gen_range(-2000.0..2000.0),
                ]),
                Value::Vec3F([rng.gen(), rng.gen(), rng.gen()]),
            ])?;
            records.append(hit_id, &record);
            links.push(if layout.particles == 0 {
                ObjectId::new(particle_id, ObjectId::UNSET_INDEX)
            } else {
                ObjectId::new(particle_id, rng.gen_range(0..layout.particles))
            });
        }
        records.append_targets(link_id, &links);

        writer.write_event(&records)?;
        debug!(event, particles = layout.particles, hits = layout.hits, "wrote sample event");
    }
    writer.finish()
}

fn builtin(type_name: &str) -> FormatResult<RecordSchema> {
    builtin_schemas()
        .into_iter()
        .find(|s| s.type_name == type_name)
        .ok_or_else(|| FormatError::MissingSchema {
            collection: String::new(),
            type_name: type_name.to_string(),
        })
}
