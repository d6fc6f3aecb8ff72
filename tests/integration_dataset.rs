use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use threadpool::ThreadPool;

use ski_slope_map::config::DataSource;
use ski_slope_map::data::loader::{fetch_dataset, DataLoader, LoadState};
use ski_slope_map::data::ski_data::Coordinate;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ski_slope_map_{}_{}", std::process::id(), name));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

fn wait_for(loader: &mut DataLoader) -> LoadState {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !matches!(loader.poll(), LoadState::Loading) {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    loader.state().clone()
}

#[test]
fn test_loads_dataset_from_file() {
    let path = write_temp(
        "ok.json",
        r#"{"ski_areas": {"Alpbach": [47.4, 11.9], "Nowhere": [123.0, 0.0]},
            "tile_url": "https://tiles.example.org/{z}/{x}/{y}.png"}"#,
    );
    let pool = ThreadPool::new(1);
    let mut loader = DataLoader::new(DataSource::File(path.clone()));
    loader.start(&pool, || ());

    match wait_for(&mut loader) {
        LoadState::Ready(dataset) => {
            assert_eq!(dataset.len(), 1);
            assert_eq!(dataset.ski_areas["Alpbach"], Coordinate::new(47.4, 11.9));
        }
        other => panic!("unexpected state {:?}", other),
    }
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_non_json_body_is_an_error() {
    let path = write_temp("bad.json", "<html>Not Found</html>");
    let pool = ThreadPool::new(1);
    let mut loader = DataLoader::new(DataSource::File(path.clone()));
    loader.start(&pool, || ());

    match wait_for(&mut loader) {
        LoadState::Error(e) => assert_eq!(e.code(), 105),
        other => panic!("unexpected state {:?}", other),
    }
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_missing_file_is_an_error() {
    let source = DataSource::parse("/nonexistent/ski_slope_map/map_data.json");
    assert_eq!(fetch_dataset(&source).unwrap_err().code(), 101);
}
