use std::fmt;

use tracing::{debug, error, info, warn};

use edmio_format::{collection_table, ColumnReader, FormatError};
use edmio_store::{Event, EventStore, Materializer, SchemaRegistry};

use crate::config::SourceConfig;
use crate::error::{SourceError, SourceResult};

/// File name marker this source recognizes.
pub const FILE_MARKER: &str = ".edm";

/// Confidence reported by [`EventSource::check_openable`] for a recognized path.
pub const OPENABLE_CONFIDENCE: f64 = 0.01;

/// Lifecycle of an [`EventSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceState {
    Unopened,
    Open,
    Reading,
    Exhausted,
    Closed,
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unopened => "unopened",
            Self::Open => "open",
            Self::Reading => "reading",
            Self::Exhausted => "exhausted",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Outcome of [`EventSource::get_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    /// The event was filled.
    Event,
    /// No more events; the file has been closed.
    EndOfStream,
}

/// Streams events from one `.edm` file into [`Event`] contexts.
///
/// Each call to [`EventSource::get_event`] reads one event into a fresh
/// [`EventStore`], materializes its data collections into views, hands the
/// views and then the store to the event, and sets the run and event numbers
/// from the header collection. [`EventSource::finish_event`] releases the
/// event's wrappers early; otherwise they go when the event drops its store.
#[derive(Debug)]
pub struct EventSource {
    resource_name: String,
    config: SourceConfig,
    state: SourceState,
    reader: Option<ColumnReader>,
    materializer: Materializer,
    events_read: u64,
    events_in_file: u64,
    cycles: u64,
}

impl EventSource {
    pub fn new(resource_name: impl Into<String>, config: SourceConfig) -> Self {
        Self {
            resource_name: resource_name.into(),
            config,
            state: SourceState::Unopened,
            reader: None,
            materializer: Materializer::default(),
            events_read: 0,
            events_in_file: 0,
            cycles: 0,
        }
    }

    /// How confident this source is that it can read `path`.
    ///
    /// Returns a small positive value for paths carrying the `.edm` marker so
    /// a more specific source can still win, and 0 otherwise.
    pub fn check_openable(path: &str) -> f64 {
        if path.contains(FILE_MARKER) {
            OPENABLE_CONFIDENCE
        } else {
            0.0
        }
    }

    pub fn description() -> &'static str {
        "edmio columnar event file reader"
    }

    /// Open the file, apply the collection projection, and load its schemas.
    ///
    /// Opening a source that already has its file open does nothing. A file
    /// written by a newer schema version is refused with
    /// [`SourceError::VersionMismatch`].
    pub fn open(&mut self) -> SourceResult<()> {
        if self.reader.is_some() {
            return Ok(());
        }

        let mut reader = match ColumnReader::open(&self.resource_name) {
            Ok(reader) => reader,
            Err(FormatError::VersionTooNew { file, build }) => {
                error!(
                    path = %self.resource_name,
                    file_version = %file,
                    build_version = %build,
                    "file schema version is newer than this build"
                );
                return Err(SourceError::VersionMismatch {
                    path: self.resource_name.clone(),
                    file,
                    build,
                });
            }
            Err(source) => {
                error!(path = %self.resource_name, error = %source, "problem opening file");
                return Err(SourceError::Open {
                    path: self.resource_name.clone(),
                    source,
                });
            }
        };

        let mut registry = SchemaRegistry::with_builtins();
        for schema in reader.schemas() {
            if let Err(e) = registry.register(schema.clone()) {
                error!(path = %self.resource_name, error = %e, "incompatible schema in file");
                return Err(SourceError::Open {
                    path: self.resource_name.clone(),
                    source: FormatError::Store(e),
                });
            }
        }

        if self.config.print_collection_table {
            info!("\n{}", collection_table(&reader));
        }
        apply_projection(&mut reader, &self.config);

        self.events_in_file = reader.num_events();
        self.events_read = 0;
        self.cycles = 0;
        self.materializer = Materializer::new(registry);
        self.reader = Some(reader);
        self.state = SourceState::Open;
        info!(
            path = %self.resource_name,
            events = self.events_in_file,
            "opened event source"
        );
        Ok(())
    }

    /// Fill `event` with the next event of the file.
    ///
    /// Anything `event` held before is dropped, and on error `event` is left
    /// empty. A failed read still advances the cursor, so the next call moves
    /// on to the following event. At the end of the file the source either
    /// starts over (recycle mode) or closes the file and returns
    /// [`FetchStatus::EndOfStream`]. A file with no events always ends the
    /// stream.
    pub fn get_event(&mut self, event: &mut Event) -> SourceResult<FetchStatus> {
        match self.state {
            SourceState::Unopened | SourceState::Closed => return Err(SourceError::NotOpen),
            SourceState::Exhausted => return Ok(FetchStatus::EndOfStream),
            SourceState::Open | SourceState::Reading => {}
        }

        if self.events_read >= self.events_in_file {
            if self.config.recycle_forever && self.events_in_file > 0 {
                self.cycles += 1;
                info!(cycle = self.cycles, "end of file reached; recycling from first event");
                self.events_read = 0;
            } else {
                self.reader = None;
                self.state = SourceState::Exhausted;
                info!(
                    path = %self.resource_name,
                    events = self.events_in_file,
                    "end of file reached; closing"
                );
                return Ok(FetchStatus::EndOfStream);
            }
        }

        event.reset();
        let reader = self.reader.as_ref().ok_or(SourceError::NotOpen)?;
        let index = self.events_read;
        self.events_read += 1;
        self.state = SourceState::Reading;
        let mut store = reader.get_event(index).inspect_err(|e| {
            warn!(index, error = %e, "failed to read event; skipping");
        })?;

        let mut next = Event::new();
        let summary = self.materializer.materialize_event(&mut store, &mut next)?;
        let header = read_header(&store, &self.config.header_collection, self.materializer.registry());
        next.attach_store(store);
        if let Some((run_number, event_number)) = header {
            next.set_run_number(run_number);
            next.set_event_number(event_number);
        }
        *event = next;

        debug!(
            index,
            run = event.run_number(),
            event = event.event_number(),
            collections = summary.collections,
            objects = summary.objects,
            "event materialized"
        );
        Ok(FetchStatus::Event)
    }

    /// Release the event's wrappers now. Returns how many were released.
    ///
    /// The event keeps its views; they stop resolving.
    pub fn finish_event(&self, event: &mut Event) -> usize {
        event.store_mut().map_or(0, EventStore::clear)
    }

    /// Close the file. Further reads fail with [`SourceError::NotOpen`].
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            info!(path = %self.resource_name, events_read = self.events_read, "closed event source");
        }
        self.state = SourceState::Closed;
    }

    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Events read since the last wrap-around.
    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    pub fn events_in_file(&self) -> u64 {
        self.events_in_file
    }

    /// Times the source wrapped back to the first event.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_file_open(&self) -> bool {
        self.reader.is_some()
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn reader(&self) -> Option<&ColumnReader> {
        self.reader.as_ref()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        self.materializer.registry()
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        info!(path = %self.resource_name, state = %self.state, "closing event source");
    }
}

/// Include list first (everything off, then each entry on), exclude list after.
fn apply_projection(reader: &mut ColumnReader, config: &SourceConfig) {
    if !config.include_collections.is_empty() {
        debug!("disabling reading of all collections");
        reader.set_collection_enabled("*", false);
        for name in &config.include_collections {
            match reader.set_collection_enabled(name, true) {
                0 => warn!(collection = %name, "collection not found in file"),
                n => info!(collection = %name, matched = n, "enabled read of collection(s)"),
            }
        }
    }
    for name in &config.exclude_collections {
        match reader.set_collection_enabled(name, false) {
            0 => warn!(collection = %name, "collection not found in file"),
            n => info!(collection = %name, matched = n, "disabled read of collection(s)"),
        }
    }
}

/// Run and event number from the header collection.
///
/// One record is expected. With more than one the last wins.
fn read_header(store: &EventStore, name: &str, registry: &SchemaRegistry) -> Option<(i32, i32)> {
    let Some(raw) = store.data_vector(name) else {
        debug!(collection = name, "no header collection in event");
        return None;
    };
    if raw.len() > 1 {
        warn!(collection = name, records = raw.len(), "multiple header records; using the last");
    }
    let record = raw.record(raw.len().checked_sub(1)?)?;
    let schema = registry.get(&raw.type_name)?;
    let run = schema.decode_field(record, "runNumber")?.as_i64()?;
    let event = schema.decode_field(record, "eventNumber")?.as_i64()?;
    Some((i32::try_from(run).ok()?, i32::try_from(event).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openable_only_with_marker() {
        assert_eq!(EventSource::check_openable("run42.edm"), OPENABLE_CONFIDENCE);
        assert_eq!(EventSource::check_openable("/data/run.edm.bak"), OPENABLE_CONFIDENCE);
        assert_eq!(EventSource::check_openable("run42.root"), 0.0);
        assert!(EventSource::check_openable("x.edm") < 1.0);
    }

    #[test]
    fn get_event_before_open_fails() {
        let mut source = EventSource::new("missing.edm", SourceConfig::default());
        assert_eq!(source.state(), SourceState::Unopened);
        let mut event = Event::new();
        assert!(matches!(source.get_event(&mut event), Err(SourceError::NotOpen)));
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.edm");
        let mut source = EventSource::new(path.to_string_lossy(), SourceConfig::default());
        let err = source.open().unwrap_err();
        assert!(matches!(err, SourceError::Open { source: FormatError::Io(_), .. }));
        assert!(!source.is_file_open());
        assert_eq!(source.state(), SourceState::Unopened);
    }

    #[test]
    fn close_without_open() {
        let mut source = EventSource::new("x.edm", SourceConfig::default());
        source.close();
        assert_eq!(source.state(), SourceState::Closed);
        let mut event = Event::new();
        assert!(matches!(source.get_event(&mut event), Err(SourceError::NotOpen)));
    }

    #[test]
    fn finish_without_store_releases_nothing() {
        let source = EventSource::new("x.edm", SourceConfig::default());
        let mut event = Event::new();
        assert_eq!(source.finish_event(&mut event), 0);
    }

    #[test]
    fn description_mentions_format() {
        assert!(EventSource::description().contains("edmio"));
    }
}
