//! Record layouts for the EDM types every file is expected to carry.

use crate::schema::{FieldDef, FieldKind, RecordSchema};

/// Declared type name of the per-event header record.
pub const EVENT_HEADER_TYPE: &str = "edm4hep::EventHeaderData";

/// Declared type name of relation records.
pub const OBJECT_ID_TYPE: &str = "podio::ObjectID";

fn schema(type_name: &str, fields: &[(&str, FieldKind)]) -> RecordSchema {
    RecordSchema::new(
        type_name,
        fields
            .iter()
            .map(|(name, kind)| FieldDef::new(*name, *kind))
            .collect(),
    )
}

/// All built-in record schemas.
pub fn builtin_schemas() -> Vec<RecordSchema> {
    use FieldKind::*;
    vec![
        schema(
            EVENT_HEADER_TYPE,
            &[
                ("eventNumber", I32),
                ("runNumber", I32),
                ("timeStamp", U64),
                ("weight", F64),
            ],
        ),
        schema(
            OBJECT_ID_TYPE,
            &[("index", I32), ("collectionID", U32)],
        ),
        schema(
            "edm4hep::MCParticleData",
            &[
                ("PDG", I32),
                ("generatorStatus", I32),
                ("simulatorStatus", I32),
                ("charge", F32),
                ("time", F32),
                ("mass", F64),
                ("vertex", Vec3D),
                ("endpoint", Vec3D),
                ("momentum", Vec3F),
                ("momentumAtEndpoint", Vec3F),
            ],
        ),
        schema(
            "edm4hep::SimTrackerHitData",
            &[
                ("cellID", U64),
                ("EDep", F32),
                ("time", F32),
                ("pathLength", F32),
                ("quality", I32),
                ("position", Vec3D),
                ("momentum", Vec3F),
            ],
        ),
        schema(
            "edm4hep::SimCalorimeterHitData",
            &[("cellID", U64), ("energy", F32), ("position", Vec3F)],
        ),
        schema(
            "edm4hep::CalorimeterHitData",
            &[
                ("cellID", U64),
                ("energy", F32),
                ("energyError", F32),
                ("time", F32),
                ("timeError", F32),
                ("position", Vec3F),
                ("type", I32),
            ],
        ),
        schema(
            "edm4hep::ClusterData",
            &[
                ("type", I32),
                ("energy", F32),
                ("energyError", F32),
                ("position", Vec3F),
                ("iTheta", F32),
                ("phi", F32),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_names_are_unique() {
        let schemas = builtin_schemas();
        let names: HashSet<_> = schemas.iter().map(|s| s.type_name.clone()).collect();
        assert_eq!(names.len(), schemas.len());
    }

    #[test]
    fn header_carries_run_and_event_number() {
        let schemas = builtin_schemas();
        let header = schemas.iter().find(|s| s.type_name == EVENT_HEADER_TYPE).unwrap();
        assert_eq!(header.field("runNumber").unwrap().1.kind, FieldKind::I32);
        assert_eq!(header.field("eventNumber").unwrap().1.kind, FieldKind::I32);
        assert_eq!(header.record_size(), 24);
    }

    #[test]
    fn object_id_is_eight_bytes() {
        let schemas = builtin_schemas();
        let oid = schemas.iter().find(|s| s.type_name == OBJECT_ID_TYPE).unwrap();
        assert_eq!(oid.record_size(), 8);
    }
}
