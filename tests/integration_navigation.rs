use std::sync::Arc;
use std::time::{Duration, Instant};

use egui::Vec2;
use threadpool::ThreadPool;
use walkers::MapMemory;

use ski_slope_map::data::ski_data::{Coordinate, SkiDataset};
use ski_slope_map::errors::error_types::ErrorTypes;
use ski_slope_map::ui::fly_to::{FlyToController, Watched, FLY_TO_DURATION, FLY_TO_ZOOM};
use ski_slope_map::ui::locate::{GeoFix, LocateControl, Locator, LOCATE_MAX_ZOOM};
use ski_slope_map::ui::places;
use ski_slope_map::ui::selector::AreaSelector;

const VIEWPORT: Vec2 = Vec2::new(1280.0, 800.0);

const DATASET: &str = r#"{
    "ski_areas": {"Bansko": [41.8, 23.5], "Alpbach": [47.4, 11.9]},
    "tile_url": "https://tiles.example.org/{z}/{x}/{y}.png"
}"#;

fn setup() -> (AreaSelector, Watched<Coordinate>, FlyToController, MapMemory) {
    let dataset = SkiDataset::from_json(DATASET.as_bytes()).unwrap();
    let mut memory = MapMemory::default();
    memory.set_zoom(places::HOME_ZOOM as f32).unwrap();
    (
        AreaSelector::new(&dataset.ski_areas),
        Watched::new(),
        FlyToController::new(),
        memory,
    )
}

#[test]
fn test_selecting_an_area_flies_there() {
    let (mut selector, mut target, mut fly_to, mut memory) = setup();

    let labels: Vec<&str> = selector.options().iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Alpbach", "Bansko"]);

    let picked = selector.select("Bansko").unwrap();
    target.set(picked);
    assert_eq!(target.get(), Some(Coordinate::new(41.8, 23.5)));

    assert!(fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 0.0));
    assert_eq!(fly_to.flights_started(), 1);
    let flight = fly_to.current().unwrap();
    assert_eq!(flight.target(), Coordinate::new(41.8, 23.5));
    assert_eq!(flight.target_zoom(), FLY_TO_ZOOM);
    assert_eq!(flight.duration(), FLY_TO_DURATION);

    // Past the end of the flight the map rests on the target.
    assert!(!fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 10.0));
    let center = memory.detached().unwrap();
    assert!((center.lat() - 41.8).abs() < 1e-6);
    assert!((center.lon() - 23.5).abs() < 1e-6);
    assert!((f64::from(memory.zoom()) - FLY_TO_ZOOM).abs() < 1e-6);
}

#[test]
fn test_clearing_does_not_move_the_map() {
    let (mut selector, target, mut fly_to, mut memory) = setup();

    selector.clear();
    assert!(!fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 0.0));
    assert_eq!(fly_to.flights_started(), 0);
    assert!(memory.detached().is_none());
}

#[test]
fn test_same_area_twice_flies_once() {
    let (mut selector, mut target, mut fly_to, mut memory) = setup();

    target.set(selector.select("Alpbach").unwrap());
    fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 0.0);
    fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 5.0);

    target.set(selector.select("Alpbach").unwrap());
    fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 6.0);
    assert_eq!(fly_to.flights_started(), 1);

    target.set(selector.select("Bansko").unwrap());
    fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 7.0);
    assert_eq!(fly_to.flights_started(), 2);
}

struct Innsbruck;

impl Locator for Innsbruck {
    fn locate(&self) -> Result<GeoFix, ErrorTypes> {
        Ok(GeoFix {
            coordinate: Coordinate::new(47.26, 11.39),
            accuracy: 5.0,
        })
    }
}

#[test]
fn test_locating_mid_flight_wins() {
    let (mut selector, mut target, mut fly_to, mut memory) = setup();
    let pool = ThreadPool::new(1);
    let mut locate = LocateControl::new(Arc::new(Innsbruck));

    target.set(selector.select("Bansko").unwrap());
    assert!(fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 0.0));
    assert!(locate.request(&pool, || ()));

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut located = false;
    while !located && Instant::now() < deadline {
        if locate.poll(&mut memory, VIEWPORT).is_some() {
            fly_to.cancel();
            located = true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(located);

    assert!(!fly_to.update(&target, &mut memory, places::home(), VIEWPORT, 0.5));
    let center = memory.detached().unwrap();
    assert!((center.lat() - 47.26).abs() < 1e-9);
    assert!((center.lon() - 11.39).abs() < 1e-9);
    assert_eq!(f64::from(memory.zoom()), LOCATE_MAX_ZOOM);
}
