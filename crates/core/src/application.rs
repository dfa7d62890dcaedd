use crate::country::CountryResolver;
use crate::dedup::Deduplicator;
use crate::domain::{GroupId, GroupReference, NormalizedGroupRecord};
use crate::errors::{FetchError, StoreError};
use crate::ports::{Geocoder, GroupFetcher, RecordStore, RecordWriter, Result};
use crate::utils::{is_platform_url, with_default_scheme};
use tracing::{debug, info, warn};

/// Decision taken for one group reference
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Emitted(NormalizedGroupRecord),
    SkippedDuplicate(GroupId),
    SkippedFetchFailed {
        reference: GroupReference,
        cause: FetchError,
    },
    /// Listing entry whose URL is not hosted on the platform
    SkippedOffPlatform(GroupReference),
}

/// Resolves group references into normalized records for a single run.
///
/// The pipeline owns the run's deduplication state, so a record is emitted at most once
/// per identifier for as long as the pipeline lives.
pub struct GroupResolutionPipeline<'a> {
    fetcher: &'a dyn GroupFetcher,
    countries: CountryResolver<'a>,
    dedup: Deduplicator<'a>,
}

impl<'a> GroupResolutionPipeline<'a> {
    pub fn new(fetcher: &'a dyn GroupFetcher, geocoder: &'a dyn Geocoder, store: &'a dyn RecordStore) -> Self {
        Self::with_resolver(fetcher, CountryResolver::new(geocoder), store)
    }

    pub fn with_resolver(
        fetcher: &'a dyn GroupFetcher,
        countries: CountryResolver<'a>,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            fetcher,
            countries,
            dedup: Deduplicator::new(store),
        }
    }

    /// Resolves one reference. Only a store failure is returned as an error; every
    /// per-reference problem is reported in the outcome.
    pub fn resolve_one(&mut self, reference: GroupReference) -> std::result::Result<PipelineOutcome, StoreError> {
        // the store must be readable before anything is fetched
        self.dedup.known_ids()?;

        let url = match &reference {
            GroupReference::Url(url) => url.clone(),
            GroupReference::Listing(entry) => {
                let url = with_default_scheme(&entry.url);
                if !is_platform_url(&url) {
                    debug!(url = %entry.url, "listing entry is not hosted on the platform");
                    return Ok(PipelineOutcome::SkippedOffPlatform(reference));
                }
                url
            }
        };

        let raw = match self.fetcher.fetch_group_by_url(&url) {
            Ok(raw) => raw,
            Err(cause) => {
                warn!(url = %reference, "group fetch failed: {cause}");
                return Ok(PipelineOutcome::SkippedFetchFailed { reference, cause });
            }
        };
        let raw = match &reference {
            GroupReference::Listing(entry) => raw.merge_listing(entry),
            GroupReference::Url(_) => raw,
        };

        let country = self.countries.resolve(&raw);

        if self.dedup.is_duplicate(&raw.id)? {
            debug!(group = %raw.id, url = %reference, "group already imported");
            return Ok(PipelineOutcome::SkippedDuplicate(raw.id));
        }
        self.dedup.mark_seen(raw.id.clone());

        Ok(PipelineOutcome::Emitted(NormalizedGroupRecord {
            name: raw.name,
            meetup_id: raw.id,
            meetup_url: raw.url,
            country: country.display_name().to_string(),
        }))
    }

    /// Lazily resolves references in input order, one outcome per reference.
    /// The known identifiers are loaded up front, so an unavailable store fails here
    /// before any reference is fetched.
    pub fn resolve_many<I>(&mut self, references: I) -> std::result::Result<ResolveMany<'_, 'a, I::IntoIter>, StoreError>
    where
        I: IntoIterator<Item = GroupReference>,
    {
        self.dedup.known_ids()?;
        Ok(ResolveMany {
            pipeline: self,
            references: references.into_iter(),
        })
    }

    pub fn deduplicator(&self) -> &Deduplicator<'a> {
        &self.dedup
    }
}

/// Iterator returned by [`GroupResolutionPipeline::resolve_many`]
pub struct ResolveMany<'p, 'a, I> {
    pipeline: &'p mut GroupResolutionPipeline<'a>,
    references: I,
}

impl<I> Iterator for ResolveMany<'_, '_, I>
where
    I: Iterator<Item = GroupReference>,
{
    type Item = std::result::Result<PipelineOutcome, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let reference = self.references.next()?;
        Some(self.pipeline.resolve_one(reference))
    }
}

/// Tally of one import run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub emitted: Vec<NormalizedGroupRecord>,
    pub duplicates: Vec<GroupId>,
    pub fetch_failures: Vec<(GroupReference, FetchError)>,
    pub off_platform: usize,
}

/// Application service: resolves a batch, emits the new records and optionally persists them
pub struct ImportServiceImpl<'a> {
    fetcher: &'a dyn GroupFetcher,
    geocoder: &'a dyn Geocoder,
    store: &'a dyn RecordStore,
    writer: &'a dyn RecordWriter,
}

impl<'a> ImportServiceImpl<'a> {
    /// Creates a new ImportServiceImpl with the given dependencies
    pub fn new(
        fetcher: &'a dyn GroupFetcher,
        geocoder: &'a dyn Geocoder,
        store: &'a dyn RecordStore,
        writer: &'a dyn RecordWriter,
    ) -> Self {
        Self {
            fetcher,
            geocoder,
            store,
            writer,
        }
    }

    /// Runs one import over the references: resolves, writes emitted records, and
    /// appends them to the store when `persist` is set
    pub fn execute_import(&self, references: Vec<GroupReference>, persist: bool) -> Result<RunReport> {
        let mut pipeline = GroupResolutionPipeline::new(self.fetcher, self.geocoder, self.store);
        let mut report = RunReport::default();

        for outcome in pipeline.resolve_many(references)? {
            match outcome? {
                PipelineOutcome::Emitted(record) => report.emitted.push(record),
                PipelineOutcome::SkippedDuplicate(id) => report.duplicates.push(id),
                PipelineOutcome::SkippedFetchFailed { reference, cause } => {
                    report.fetch_failures.push((reference, cause))
                }
                PipelineOutcome::SkippedOffPlatform(_) => report.off_platform += 1,
            }
        }

        self.writer.write(&report.emitted)?;
        if persist && !report.emitted.is_empty() {
            self.store.append_records(&report.emitted)?;
        }

        info!(
            emitted = report.emitted.len(),
            duplicates = report.duplicates.len(),
            fetch_failures = report.fetch_failures.len(),
            off_platform = report.off_platform,
            "import run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddressComponent, Coordinates, GeocodeResult, ListingEntry, RawGroupRecord};
    use crate::errors::GeocodeError;
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct FakeFetcher {
        groups: HashMap<String, RawGroupRecord>,
        requested: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_group(mut self, url: &str, id: u64, name: &str) -> Self {
            self.groups.insert(
                url.to_string(),
                RawGroupRecord {
                    id: GroupId::from(id),
                    name: name.to_string(),
                    url: url.to_string(),
                    country_code: None,
                    coordinates: None,
                },
            );
            self
        }

        fn with_record(mut self, url: &str, record: RawGroupRecord) -> Self {
            self.groups.insert(url.to_string(), record);
            self
        }
    }

    impl GroupFetcher for FakeFetcher {
        fn fetch_group_by_url(&self, url: &str) -> std::result::Result<RawGroupRecord, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            self.groups
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(url.to_string()))
        }
    }

    struct FakeGeocoder {
        status: &'static str,
        country: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl FakeGeocoder {
        fn new(status: &'static str, country: Option<&'static str>) -> Self {
            Self {
                status,
                country,
                calls: Cell::new(0),
            }
        }
    }

    impl Geocoder for FakeGeocoder {
        fn fetch_geocode(&self, _coordinates: Coordinates) -> std::result::Result<GeocodeResult, GeocodeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(GeocodeResult {
                status: self.status.to_string(),
                address_components: self
                    .country
                    .map(|name| AddressComponent {
                        types: vec!["country".to_string(), "political".to_string()],
                        long_name: name.to_string(),
                    })
                    .into_iter()
                    .collect(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        records: RefCell<Vec<NormalizedGroupRecord>>,
        preloaded: HashSet<GroupId>,
        unavailable: bool,
    }

    impl RecordStore for MemoryStore {
        fn list_known_identifiers(&self) -> std::result::Result<HashSet<GroupId>, StoreError> {
            if self.unavailable {
                return Err(StoreError::Unavailable("no such table: groups".into()));
            }
            let mut ids = self.preloaded.clone();
            ids.extend(self.records.borrow().iter().map(|r| r.meetup_id.clone()));
            Ok(ids)
        }

        fn append_records(&self, records: &[NormalizedGroupRecord]) -> std::result::Result<(), StoreError> {
            self.records.borrow_mut().extend_from_slice(records);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CapturingWriter {
        written: RefCell<Vec<NormalizedGroupRecord>>,
    }

    impl RecordWriter for CapturingWriter {
        fn write(&self, records: &[NormalizedGroupRecord]) -> Result<()> {
            self.written.borrow_mut().extend_from_slice(records);
            Ok(())
        }
    }

    fn listing(url: &str, code: Option<&str>, coordinates: Option<Coordinates>) -> GroupReference {
        GroupReference::Listing(ListingEntry {
            url: url.to_string(),
            country_code: code.map(str::to_string),
            coordinates,
        })
    }

    fn url(url: &str) -> GroupReference {
        GroupReference::Url(url.to_string())
    }

    fn collect(pipeline: &mut GroupResolutionPipeline<'_>, refs: Vec<GroupReference>) -> Vec<PipelineOutcome> {
        pipeline
            .resolve_many(refs)
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_listing_with_country_code_is_emitted() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/Berlin-PHP/", 1, "Berlin PHP");
        let geocoder = FakeGeocoder::new("OK", Some("Austria"));
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing("https://www.meetup.com/Berlin-PHP/", Some("de"), None))
            .unwrap();

        assert_eq!(
            outcome,
            PipelineOutcome::Emitted(NormalizedGroupRecord {
                name: "Berlin PHP".to_string(),
                meetup_id: GroupId::from(1u64),
                meetup_url: "https://www.meetup.com/Berlin-PHP/".to_string(),
                country: "Germany".to_string(),
            })
        );
        assert_eq!(geocoder.calls.get(), 0);
    }

    #[test]
    fn test_zero_results_geocode_emits_unknown_country() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/X/", 2, "X");
        let geocoder = FakeGeocoder::new("ZERO_RESULTS", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing(
                "https://www.meetup.com/X/",
                None,
                Some(Coordinates::new(52.52, 13.405)),
            ))
            .unwrap();

        match outcome {
            PipelineOutcome::Emitted(record) => assert_eq!(record.country, "unknown"),
            other => panic!("expected emitted record, got {other:?}"),
        }
        assert_eq!(geocoder.calls.get(), 1);
    }

    #[test]
    fn test_platform_country_code_takes_precedence_over_listing() {
        let fetcher = FakeFetcher::default().with_record(
            "https://www.meetup.com/vienna-php/",
            RawGroupRecord {
                id: GroupId::from(3u64),
                name: "Vienna PHP".to_string(),
                url: "https://www.meetup.com/vienna-php/".to_string(),
                country_code: Some("at".to_string()),
                coordinates: None,
            },
        );
        let geocoder = FakeGeocoder::new("OK", Some("Germany"));
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing("https://www.meetup.com/vienna-php/", Some("de"), None))
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Emitted(ref r) if r.country == "Austria"));
    }

    #[test]
    fn test_unrecognized_platform_code_uses_listing_code() {
        let fetcher = FakeFetcher::default().with_record(
            "https://www.meetup.com/Berlin-PHP/",
            RawGroupRecord {
                id: GroupId::from(4u64),
                name: "Berlin PHP".to_string(),
                url: "https://www.meetup.com/Berlin-PHP/".to_string(),
                country_code: Some("XX".to_string()),
                coordinates: None,
            },
        );
        let geocoder = FakeGeocoder::new("ZERO_RESULTS", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing(
                "https://www.meetup.com/Berlin-PHP/",
                Some("de"),
                Some(Coordinates::new(52.52, 13.405)),
            ))
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Emitted(ref r) if r.country == "Germany"));
        assert_eq!(geocoder.calls.get(), 0);
    }

    #[test]
    fn test_unrecognized_listing_code_falls_back_to_geocoding() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/X/", 6, "X");
        let geocoder = FakeGeocoder::new("OK", Some("Germany"));
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing(
                "https://www.meetup.com/X/",
                Some("QQ"),
                Some(Coordinates::new(52.52, 13.405)),
            ))
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Emitted(ref r) if r.country == "Germany"));
        assert_eq!(geocoder.calls.get(), 1);
    }

    #[test]
    fn test_listing_url_without_scheme_is_fetched() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/phpug/", 8, "PHPUG");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline
            .resolve_one(listing("www.meetup.com/phpug/", Some("de"), None))
            .unwrap();

        assert!(matches!(outcome, PipelineOutcome::Emitted(ref r) if r.name == "PHPUG"));
        assert_eq!(*fetcher.requested.borrow(), vec!["https://www.meetup.com/phpug/".to_string()]);
    }

    #[test]
    fn test_fetch_failure_does_not_stop_batch() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/b/", 20, "B");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcomes = collect(
            &mut pipeline,
            vec![url("https://www.meetup.com/missing/"), url("https://www.meetup.com/b/")],
        );

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            &outcomes[0],
            PipelineOutcome::SkippedFetchFailed { cause: FetchError::NotFound(_), reference }
                if reference.url() == "https://www.meetup.com/missing/"
        ));
        assert!(matches!(&outcomes[1], PipelineOutcome::Emitted(r) if r.meetup_id == GroupId::from(20u64)));
    }

    #[test]
    fn test_same_group_twice_in_batch() {
        let fetcher = FakeFetcher::default()
            .with_group("https://www.meetup.com/a/", 10, "A")
            .with_group("https://www.meetup.com/c/", 30, "C");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcomes = collect(
            &mut pipeline,
            vec![
                url("https://www.meetup.com/a/"),
                url("https://www.meetup.com/c/"),
                url("https://www.meetup.com/a/"),
            ],
        );

        assert!(matches!(&outcomes[0], PipelineOutcome::Emitted(r) if r.name == "A"));
        assert!(matches!(&outcomes[1], PipelineOutcome::Emitted(r) if r.name == "C"));
        assert_eq!(outcomes[2], PipelineOutcome::SkippedDuplicate(GroupId::from(10u64)));
        assert_eq!(pipeline.deduplicator().seen_this_run(), 2);
    }

    #[test]
    fn test_preloaded_identifier_is_duplicate() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/a/", 10, "A");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore {
            preloaded: [GroupId::from(10u64)].into_iter().collect(),
            ..MemoryStore::default()
        };
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        assert_eq!(
            pipeline.resolve_one(url("https://www.meetup.com/a/")).unwrap(),
            PipelineOutcome::SkippedDuplicate(GroupId::from(10u64))
        );
    }

    #[test]
    fn test_second_run_after_persisting_skips_everything() {
        let fetcher = FakeFetcher::default()
            .with_group("https://www.meetup.com/a/", 10, "A")
            .with_group("https://www.meetup.com/b/", 20, "B");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let writer = CapturingWriter::default();
        let service = ImportServiceImpl::new(&fetcher, &geocoder, &store, &writer);
        let batch = vec![
            url("https://www.meetup.com/a/"),
            url("https://www.meetup.com/missing/"),
            url("https://www.meetup.com/b/"),
        ];

        let first = service.execute_import(batch.clone(), true).unwrap();
        let second = service.execute_import(batch, true).unwrap();

        let first_ids: Vec<GroupId> = first.emitted.iter().map(|r| r.meetup_id.clone()).collect();
        assert_eq!(first_ids, vec![GroupId::from(10u64), GroupId::from(20u64)]);
        assert!(second.emitted.is_empty());
        assert_eq!(second.duplicates, first_ids);
        assert_eq!(second.fetch_failures.len(), 1);
        assert_eq!(store.records.borrow().len(), 2);
        assert_eq!(writer.written.borrow().len(), 2);
    }

    #[test]
    fn test_without_persist_store_is_untouched() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/a/", 10, "A");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let writer = CapturingWriter::default();
        let service = ImportServiceImpl::new(&fetcher, &geocoder, &store, &writer);

        let report = service.execute_import(vec![url("https://www.meetup.com/a/")], false).unwrap();

        assert_eq!(report.emitted.len(), 1);
        assert!(store.records.borrow().is_empty());
    }

    #[test]
    fn test_off_platform_listing_is_not_fetched() {
        let fetcher = FakeFetcher::default().with_group("https://www.phpug.de/", 5, "PHPUG");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let reference = listing("https://www.phpug.de/", Some("de"), None);
        let outcome = pipeline.resolve_one(reference.clone()).unwrap();

        assert_eq!(outcome, PipelineOutcome::SkippedOffPlatform(reference));
        assert!(fetcher.requested.borrow().is_empty());
    }

    #[test]
    fn test_direct_url_is_not_domain_filtered() {
        let fetcher = FakeFetcher::default().with_group("https://www.phpug.de/", 5, "PHPUG");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore::default();
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let outcome = pipeline.resolve_one(url("https://www.phpug.de/")).unwrap();

        assert!(matches!(outcome, PipelineOutcome::Emitted(_)));
    }

    #[test]
    fn test_store_unavailable_aborts_before_fetching() {
        let fetcher = FakeFetcher::default().with_group("https://www.meetup.com/a/", 10, "A");
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore {
            unavailable: true,
            ..MemoryStore::default()
        };
        let mut pipeline = GroupResolutionPipeline::new(&fetcher, &geocoder, &store);

        let result = pipeline.resolve_many(vec![url("https://www.meetup.com/a/")]);

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(fetcher.requested.borrow().is_empty());
    }

    #[test]
    fn test_store_unavailable_fails_import_service() {
        let fetcher = FakeFetcher::default();
        let geocoder = FakeGeocoder::new("OK", None);
        let store = MemoryStore {
            unavailable: true,
            ..MemoryStore::default()
        };
        let writer = CapturingWriter::default();
        let service = ImportServiceImpl::new(&fetcher, &geocoder, &store, &writer);

        assert!(service.execute_import(vec![url("https://www.meetup.com/a/")], true).is_err());
        assert!(writer.written.borrow().is_empty());
    }
}
