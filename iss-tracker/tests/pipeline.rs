use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use iss_tracker::config::{CanvasConfig, TrackerConfig};
use iss_tracker::model::{
    Coordinate, CrewRoster, IssDataSource, LocationClassification, ReverseGeocoder,
};
use iss_tracker::module::map::{Layer, MapFeature, MapSource, MapStyle};
use iss_tracker::{Pipeline, TrackerError, TrackerResult};

struct StubIss {
    position: (f64, f64),
    crew: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl IssDataSource for StubIss {
    async fn fetch_position(&self) -> TrackerResult<Coordinate> {
        Ok(Coordinate::new(self.position.0, self.position.1).unwrap())
    }

    async fn fetch_crew(&self) -> TrackerResult<CrewRoster> {
        let mut roster = CrewRoster::new();
        for (craft, name) in &self.crew {
            roster.add(craft, name);
        }
        Ok(roster)
    }
}

struct StubGeocoder(Option<&'static str>);

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn reverse(&self, _coordinate: Coordinate) -> TrackerResult<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

struct FailingGeocoder;

#[async_trait]
impl ReverseGeocoder for FailingGeocoder {
    async fn reverse(&self, _coordinate: Coordinate) -> TrackerResult<Option<String>> {
        Err(TrackerError::GeocodeTimeout { timeout_secs: 10 })
    }
}

/// Records every map request
#[derive(Default)]
struct RecordingMap {
    requests: Mutex<Vec<(Coordinate, f64)>>,
}

#[async_trait]
impl MapSource for RecordingMap {
    async fn features(
        &self,
        center: Coordinate,
        radius_m: f64,
        _style: &MapStyle,
    ) -> TrackerResult<Vec<MapFeature>> {
        self.requests.lock().unwrap().push((center, radius_m));
        Ok(vec![MapFeature {
            id: 1,
            layer: Layer::Building,
            tags: [("building".to_string(), "yes".to_string())].into_iter().collect(),
            points: vec![
                (center.latitude(), center.longitude()),
                (center.latitude() + 0.001, center.longitude()),
                (center.latitude() + 0.001, center.longitude() + 0.001),
                (center.latitude(), center.longitude()),
            ],
        }])
    }
}

fn crew() -> Vec<(&'static str, &'static str)> {
    vec![
        ("ISS", "Oleg Kononenko"),
        ("ISS", "Nikolai Chub"),
        ("Tiangong", "Ye Guangfu"),
        ("ISS", "Tracy Caldwell Dyson"),
    ]
}

fn test_config(radius_m: f64) -> (TrackerConfig, PathBuf) {
    let dir = std::env::temp_dir().join(format!("iss-tracker-e2e-{}", uuid::Uuid::now_v7()));
    let mut config = TrackerConfig::default();
    config.output_path = dir.join("output.png");
    config.render.radius_m = radius_m;
    config.render.fonts_dir = None;
    config.render.land = CanvasConfig { width_in: 3.0, height_in: 5.0, dpi: 36.0 };
    config.render.ocean = CanvasConfig { width_in: 5.0, height_in: 4.0, dpi: 36.0 };
    (config, dir)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[tokio::test]
async fn test_empty_address_renders_ocean_panel() {
    let (config, dir) = test_config(30_000.0);
    let map = Arc::new(RecordingMap::default());
    let pipeline = Pipeline::new(
        &config,
        Arc::new(StubIss { position: (38.6910, 75.9310), crew: crew() }),
        Arc::new(StubGeocoder(None)),
        map.clone(),
    );

    let rendered = pipeline.run_on(date()).await.unwrap();

    assert_eq!(rendered.classification, LocationClassification::Ocean);
    assert_eq!(rendered.path, config.output_path);
    assert!(rendered.bytes > 0);
    assert!(std::fs::metadata(&rendered.path).unwrap().len() > 0);
    // ocean path never asks for map data
    assert!(map.requests.lock().unwrap().is_empty());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_south_atlantic_is_ocean() {
    let (config, dir) = test_config(30_000.0);
    let pipeline = Pipeline::new(
        &config,
        Arc::new(StubIss { position: (-44.4614, -30.4322), crew: crew() }),
        Arc::new(StubGeocoder(Some("South Atlantic Ocean"))),
        Arc::new(RecordingMap::default()),
    );

    let rendered = pipeline.run_on(date()).await.unwrap();
    assert_eq!(rendered.classification, LocationClassification::Ocean);
    assert_eq!((rendered.width, rendered.height), (180, 144));

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_land_address_renders_map_with_radius() {
    let (config, dir) = test_config(1_000.0);
    let map = Arc::new(RecordingMap::default());
    let pipeline = Pipeline::new(
        &config,
        Arc::new(StubIss { position: (39.7817, -89.6501), crew: crew() }),
        Arc::new(StubGeocoder(Some("Main Street, Springfield"))),
        map.clone(),
    );

    let rendered = pipeline.run_on(date()).await.unwrap();

    assert_eq!(rendered.classification, LocationClassification::Land);
    assert_eq!((rendered.width, rendered.height), (108, 180));
    assert!(std::fs::metadata(&rendered.path).unwrap().len() > 0);

    let requests = map.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, Coordinate::new(39.7817, -89.6501).unwrap());
    assert_eq!(requests[0].1, 1_000.0);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_second_run_overwrites_output() {
    let (config, dir) = test_config(1_000.0);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&config.output_path, b"stale").unwrap();

    let pipeline = Pipeline::new(
        &config,
        Arc::new(StubIss { position: (38.6910, 75.9310), crew: crew() }),
        Arc::new(StubGeocoder(None)),
        Arc::new(RecordingMap::default()),
    );
    pipeline.run_on(date()).await.unwrap();
    let rendered = pipeline.run_on(date()).await.unwrap();

    let written = std::fs::read(&config.output_path).unwrap();
    assert_ne!(written, b"stale");
    assert_eq!(written.len() as u64, rendered.bytes);
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_geocode_failure_aborts_without_output() {
    let (config, dir) = test_config(30_000.0);
    let pipeline = Pipeline::new(
        &config,
        Arc::new(StubIss { position: (38.6910, 75.9310), crew: crew() }),
        Arc::new(FailingGeocoder),
        Arc::new(RecordingMap::default()),
    );

    let err = pipeline.run_on(date()).await.unwrap_err();
    assert!(matches!(err, TrackerError::GeocodeTimeout { .. }));
    assert!(!config.output_path.exists());

    let _ = std::fs::remove_dir_all(dir);
}
