//! Event source for edmio.
//!
//! [`EventSource`] drives one `.edm` file through its lifecycle: open and
//! version-check the file, apply the include/exclude projection, then for each
//! requested event read its raw collections, materialize views into the
//! caller's [`Event`](edmio_store::Event), and hand over the event's store.
//!
//! # Lifecycle
//!
//! ```text
//! Unopened -> Open -> Reading <-> Exhausted -> Closed
//! ```
//!
//! End of file is reported as [`FetchStatus::EndOfStream`], not as an error.
//! With `recycle_forever` set the source wraps to the first event instead.
//!
//! # Configuration
//!
//! [`SourceConfig`] is an explicit value built from a [`ParameterSource`]
//! (`EDM:*` keys) or from TOML.

pub mod config;
pub mod error;
pub mod source;

pub use config::{
    parse_bool, parse_list, ParameterSource, SourceConfig, DEFAULT_HEADER_COLLECTION,
    EXCLUDE_COLLECTIONS_KEY, HEADER_COLLECTION_KEY, INCLUDE_COLLECTIONS_KEY, PRINT_TYPE_TABLE_KEY,
    RUN_FOREVER_KEY,
};
pub use error::{SourceError, SourceResult};
pub use source::{EventSource, FetchStatus, SourceState, FILE_MARKER, OPENABLE_CONFIDENCE};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    use edmio_format::{
        write_sample, ColumnWriter, EventRecords, FormatError, SampleSpec, HEADER_COLLECTION,
        HEADER_LEN, HIT_COLLECTION, PARTICLE_COLLECTION,
    };
    use edmio_store::Event;
    use edmio_types::{builtin_schemas, SchemaVersion, Value, BUILD_VERSION, EVENT_HEADER_TYPE};

    fn sample(dir: &Path, events: u64) -> PathBuf {
        let path = dir.join("sample.edm");
        let layout = SampleSpec {
            events,
            particles: 4,
            hits: 6,
            run_number: 7,
            seed: 11,
        };
        write_sample(&path, &layout).unwrap();
        path
    }

    fn open(path: &Path, config: SourceConfig) -> EventSource {
        let mut source = EventSource::new(path.to_string_lossy(), config);
        source.open().unwrap();
        source
    }

    #[test]
    fn views_match_raw_collections() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 2), SourceConfig::default());
        let mut event = Event::new();
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
        assert_eq!(source.state(), SourceState::Reading);

        let store = event.store().unwrap();
        let mut seen = HashSet::new();
        for raw in store.data_vectors() {
            let views = event.get(&raw.name).unwrap();
            assert_eq!(views.len(), raw.len());
            for (i, view) in views.iter().enumerate() {
                assert_eq!(view.id().index as usize, i);
                assert_eq!(view.id().collection_id, raw.collection_id);
                assert!(seen.insert(view.id()));
                assert!(event.resolve(view).is_some());
            }
        }
        assert_eq!(event.get(PARTICLE_COLLECTION).unwrap().len(), 4);
        assert_eq!(event.get(HIT_COLLECTION).unwrap().len(), 6);
        assert!(!event.contains("SimTrackerHits#0"));
    }

    #[test]
    fn header_sets_run_and_event_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 3), SourceConfig::default());
        let mut event = Event::new();
        for expected in 0..3 {
            source.get_event(&mut event).unwrap();
            assert_eq!(event.run_number(), 7);
            assert_eq!(event.event_number(), expected);
        }
    }

    #[test]
    fn recycling_repeats_events() {
        let dir = tempfile::tempdir().unwrap();
        let n = 3;
        let mut source = open(&sample(dir.path(), n), SourceConfig::default().with_recycle(true));
        let mut event = Event::new();
        let mut numbers = Vec::new();
        for _ in 0..2 * n {
            assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
            numbers.push((event.run_number(), event.event_number()));
        }
        for k in 0..n as usize {
            assert_eq!(numbers[k], numbers[k + n as usize]);
        }
        assert_eq!(source.cycles(), 1);
        assert!(source.is_file_open());
    }

    #[test]
    fn exhaustion_closes_file() {
        let dir = tempfile::tempdir().unwrap();
        let n = 2;
        let mut source = open(&sample(dir.path(), n), SourceConfig::default());
        let mut event = Event::new();
        for _ in 0..n {
            assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
        }
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::EndOfStream);
        assert_eq!(source.state(), SourceState::Exhausted);
        assert!(!source.is_file_open());
        assert_eq!(source.events_read(), n);
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::EndOfStream);
    }

    #[test]
    fn reopen_after_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 1), SourceConfig::default());
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::EndOfStream);
        source.open().unwrap();
        assert_eq!(source.events_read(), 0);
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
    }

    /// Flip a byte inside the first chunk of event 0.
    fn corrupt_first_event(path: &Path) {
        let mut bytes = std::fs::read(path).unwrap();
        bytes[HEADER_LEN + 2] ^= 0xFF;
        std::fs::write(path, &bytes).unwrap();
    }

    #[test]
    fn unreadable_event_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(dir.path(), 3);
        corrupt_first_event(&path);
        let mut source = open(&path, SourceConfig::default());
        let mut event = Event::new();

        let err = source.get_event(&mut event).unwrap_err();
        assert!(matches!(err, SourceError::Read(FormatError::CrcMismatch { event: 0, .. })));
        assert_eq!(source.events_read(), 1);

        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
        assert_eq!(event.event_number(), 1);
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
        assert_eq!(event.event_number(), 2);
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::EndOfStream);
    }

    #[test]
    fn failed_read_leaves_event_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample(dir.path(), 2);
        corrupt_first_event(&path);
        let mut source = open(&path, SourceConfig::default());

        let mut event = Event::new();
        event.insert("Stale", Vec::new());
        event.set_run_number(99);
        event.set_event_number(99);

        assert!(source.get_event(&mut event).is_err());
        assert_eq!(event.collection_count(), 0);
        assert!(event.store().is_none());
        assert_eq!(event.run_number(), 0);
        assert_eq!(event.event_number(), 0);
        assert_eq!(source.state(), SourceState::Reading);
    }

    #[test]
    fn empty_file_ends_even_when_recycling() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 0), SourceConfig::default().with_recycle(true));
        assert_eq!(source.events_in_file(), 0);
        let mut event = Event::new();
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::EndOfStream);
    }

    #[test]
    fn include_reads_only_listed_collections() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::default().with_include([PARTICLE_COLLECTION]);
        let mut source = open(&sample(dir.path(), 1), config);
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();

        assert_eq!(event.collection_names().collect::<Vec<_>>(), vec![PARTICLE_COLLECTION]);
        let store = event.store().unwrap();
        assert!(store.data_vector(HIT_COLLECTION).is_none());
        assert!(store.relation_vectors().is_empty());
        assert_eq!(event.event_number(), 0);
    }

    #[test]
    fn include_covers_relations_of_data_collection() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::default().with_include([HIT_COLLECTION]);
        let mut source = open(&sample(dir.path(), 1), config);
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        assert!(event.store().unwrap().relations("SimTrackerHits#0").is_some());
    }

    #[test]
    fn exclude_wins_over_include() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::default()
            .with_include([PARTICLE_COLLECTION, HEADER_COLLECTION])
            .with_exclude([PARTICLE_COLLECTION]);
        let mut source = open(&sample(dir.path(), 1), config);
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        assert!(!event.contains(PARTICLE_COLLECTION));
        assert!(event.contains(HEADER_COLLECTION));
    }

    #[test]
    fn unknown_projection_names_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::default()
            .with_exclude(["NoSuchCollection"])
            .with_print_table(true);
        let mut source = open(&sample(dir.path(), 1), config);
        let mut event = Event::new();
        assert_eq!(source.get_event(&mut event).unwrap(), FetchStatus::Event);
        assert_eq!(event.collection_count(), 3);
    }

    #[test]
    fn newer_major_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.edm");
        let mut writer = ColumnWriter::with_version(&path, SchemaVersion::new(BUILD_VERSION.major + 1, 0, 0)).unwrap();
        writer.write_event(&EventRecords::new()).unwrap();
        writer.finish().unwrap();

        let mut source = EventSource::new(path.to_string_lossy(), SourceConfig::default());
        let err = source.open().unwrap_err();
        assert!(matches!(err, SourceError::VersionMismatch { .. }));
        assert!(!source.is_file_open());
        assert_eq!(source.events_read(), 0);
        let mut event = Event::new();
        assert!(matches!(source.get_event(&mut event), Err(SourceError::NotOpen)));
    }

    #[test]
    fn newer_minor_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.edm");
        let version = SchemaVersion::new(BUILD_VERSION.major, BUILD_VERSION.minor + 1, 0);
        ColumnWriter::with_version(&path, version).unwrap().finish().unwrap();
        let mut source = EventSource::new(path.to_string_lossy(), SourceConfig::default());
        assert!(matches!(source.open(), Err(SourceError::VersionMismatch { file, .. }) if file == version));
    }

    #[test]
    fn finish_event_twice() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 1), SourceConfig::default());
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();

        let objects = event.store().unwrap().obj_count();
        assert_eq!(objects, 1 + 4 + 6);
        assert_eq!(source.finish_event(&mut event), objects);
        assert_eq!(source.finish_event(&mut event), 0);
        assert!(event.store().unwrap().is_cleared());
        assert!(event.resolve_at(PARTICLE_COLLECTION, 0).is_none());
    }

    #[test]
    fn dropping_views_leaves_wrappers() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 1), SourceConfig::default());
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        drop(event.take(HIT_COLLECTION));
        assert_eq!(event.store().unwrap().obj_count(), 11);
    }

    #[test]
    fn relations_resolve_to_particles() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 1), SourceConfig::default());
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();

        let particle_collection = event.get(PARTICLE_COLLECTION).unwrap()[0].id().collection_id;
        let targets = event.follow("SimTrackerHits#0").unwrap().unwrap();
        assert_eq!(targets.len(), 6);
        for target in targets {
            assert_eq!(target.unwrap().id().collection_id, particle_collection);
        }
    }

    #[test]
    fn last_header_record_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headers.edm");
        let schema = builtin_schemas()
            .into_iter()
            .find(|s| s.type_name == EVENT_HEADER_TYPE)
            .unwrap();
        let mut writer = ColumnWriter::create(&path).unwrap();
        let id = writer.declare_collection(HEADER_COLLECTION, &schema).unwrap();
        let mut records = EventRecords::new();
        for (event, run) in [(1, 10), (2, 20)] {
            let record = schema
                .encode(&[Value::I32(event), Value::I32(run), Value::U64(0), Value::F64(1.0)])
                .unwrap();
            records.append(id, &record);
        }
        writer.write_event(&records).unwrap();
        writer.finish().unwrap();

        let mut source = open(&path, SourceConfig::default());
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        assert_eq!(event.event_number(), 2);
        assert_eq!(event.run_number(), 20);
    }

    #[test]
    fn custom_header_collection_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = SourceConfig::default().with_header_collection("Missing");
        let mut source = open(&sample(dir.path(), 2), config);
        let mut event = Event::new();
        source.get_event(&mut event).unwrap();
        source.get_event(&mut event).unwrap();
        assert_eq!(event.run_number(), 0);
        assert_eq!(event.event_number(), 0);
    }

    #[test]
    fn events_can_be_processed_on_another_thread() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 2), SourceConfig::default());
        let mut handles = Vec::new();
        for _ in 0..2 {
            let mut event = Event::new();
            source.get_event(&mut event).unwrap();
            handles.push(std::thread::spawn(move || {
                let views = event.get(PARTICLE_COLLECTION).unwrap();
                let charges: Vec<f64> = views
                    .iter()
                    .filter_map(|v| event.resolve(v)?.get_f64("charge"))
                    .collect();
                assert_eq!(charges.len(), views.len());
                event.event_number()
            }));
        }
        let mut numbers: Vec<i32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![0, 1]);
    }

    #[test]
    fn close_then_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open(&sample(dir.path(), 2), SourceConfig::default());
        source.close();
        assert_eq!(source.state(), SourceState::Closed);
        assert!(!source.is_file_open());
        let mut event = Event::new();
        assert!(matches!(source.get_event(&mut event), Err(SourceError::NotOpen)));
    }

    #[test]
    fn registry_holds_file_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let source = open(&sample(dir.path(), 1), SourceConfig::default());
        assert!(source.registry().contains("edm4hep::SimTrackerHitData"));
        assert!(source.registry().contains("podio::ObjectID"));
    }
}
