use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use egui::Vec2;
use log::{info, warn};
use threadpool::ThreadPool;
use walkers::MapMemory;

use crate::data::ski_data::Coordinate;
use crate::errors::error_types::ErrorTypes;
use crate::ui::tiles::GeoBounds;

/// The view never zooms in further than this when centering on the user.
pub const LOCATE_MAX_ZOOM: f64 = 16.0;
/// Accuracy assumed for IP based positions (roughly a city).
pub const IP_ACCURACY_METERS: f64 = 5000.0;

/// A position reported by a [`Locator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub coordinate: Coordinate,
    /// Radius of the uncertainty circle, in metres.
    pub accuracy: f64,
}

/// Source of the user's current position.
pub trait Locator: Send + Sync {
    /// Blocks until a position is known or the lookup failed.
    fn locate(&self) -> Result<GeoFix, ErrorTypes>;
}

/// Locates the user from the public IP address, trying each service in turn.
pub struct IpLocator {
    services: Vec<IpService>,
}

struct IpService {
    url: &'static str,
    lat_key: &'static str,
    lon_key: &'static str,
}

impl Default for IpLocator {
    fn default() -> Self {
        Self {
            services: vec![
                IpService {
                    url: "https://ipapi.co/json/",
                    lat_key: "latitude",
                    lon_key: "longitude",
                },
                IpService {
                    url: "http://ip-api.com/json/",
                    lat_key: "lat",
                    lon_key: "lon",
                },
            ],
        }
    }
}

impl IpLocator {
    fn query(service: &IpService) -> Result<Coordinate, ErrorTypes> {
        let body = reqwest::blocking::get(service.url)
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|e| ErrorTypes::new(201, format!("{} failed: {}", service.url, e)))?;
        parse_ip_response(&body, service.lat_key, service.lon_key)
    }
}

impl Locator for IpLocator {
    fn locate(&self) -> Result<GeoFix, ErrorTypes> {
        let mut last_error = ErrorTypes::new(203, "No geolocation service configured".to_string());
        for service in &self.services {
            match Self::query(service) {
                Ok(coordinate) => {
                    return Ok(GeoFix {
                        coordinate,
                        accuracy: IP_ACCURACY_METERS,
                    })
                }
                Err(e) => {
                    warn!("Geolocation via {} failed: {}", service.url, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

/// Extracts a coordinate from an IP geolocation JSON body.
pub fn parse_ip_response(body: &str, lat_key: &str, lon_key: &str) -> Result<Coordinate, ErrorTypes> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ErrorTypes::new(202, format!("Invalid geolocation response: {}", e)))?;

    match (
        value.get(lat_key).and_then(|v| v.as_f64()),
        value.get(lon_key).and_then(|v| v.as_f64()),
    ) {
        (Some(lat), Some(lon)) if Coordinate::new(lat, lon).is_valid() => Ok(Coordinate::new(lat, lon)),
        _ => Err(ErrorTypes::new(
            202,
            format!("Geolocation response has no usable {}/{}", lat_key, lon_key),
        )),
    }
}

/// Zoom that fits the fix's accuracy circle in `viewport`, capped at
/// [`LOCATE_MAX_ZOOM`].
pub fn locate_zoom(fix: &GeoFix, viewport: Vec2) -> f64 {
    GeoBounds::around(fix.coordinate, fix.accuracy)
        .fit_zoom(viewport, 0.0)
        .min(LOCATE_MAX_ZOOM)
}

/// "Show my location" button state. The lookup runs on the worker pool; the
/// view is moved once the answer arrives.
pub struct LocateControl {
    locator: Arc<dyn Locator>,
    pending: Option<Receiver<Result<GeoFix, ErrorTypes>>>,
}

impl LocateControl {
    pub fn new(locator: Arc<dyn Locator>) -> Self {
        Self {
            locator,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a lookup unless one is already running.
    ///
    /// # Returns
    /// `true` if a lookup was started.
    pub fn request(&mut self, pool: &ThreadPool, on_done: impl FnOnce() + Send + 'static) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let (sender, receiver) = mpsc::channel();
        let locator = Arc::clone(&self.locator);
        self.pending = Some(receiver);
        pool.execute(move || {
            let _ = sender.send(locator.locate());
            on_done();
        });
        true
    }

    /// Applies a finished lookup to the map.
    ///
    /// # Returns
    /// The fix the view was moved to, if one arrived this frame.
    pub fn poll(&mut self, memory: &mut MapMemory, viewport: Vec2) -> Option<GeoFix> {
        let result = match self.pending.as_ref()?.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(ErrorTypes::new(
                203,
                "Geolocation worker stopped without a result".to_string(),
            )),
        };
        self.pending = None;

        match result {
            Ok(fix) => {
                let zoom = locate_zoom(&fix, viewport);
                info!(
                    "Located at [{:.4}, {:.4}], zoom {}",
                    fix.coordinate.lat, fix.coordinate.lon, zoom
                );
                memory.center_at(fix.coordinate.to_position());
                if let Err(e) = memory.set_zoom(zoom as f32) {
                    warn!("Locate zoom {} rejected: {:?}", zoom, e);
                }
                Some(fix)
            }
            Err(e) => {
                warn!("Could not determine the current location: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::{Duration, Instant};

    struct FixedLocator(Result<GeoFix, ErrorTypes>);

    impl Locator for FixedLocator {
        fn locate(&self) -> Result<GeoFix, ErrorTypes> {
            self.0.clone()
        }
    }

    fn poll_until_done(control: &mut LocateControl, memory: &mut MapMemory) -> Option<GeoFix> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let fix = control.poll(memory, Vec2::new(1280.0, 800.0));
            if !control.is_pending() {
                return fix;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_parse_ipapi_response() {
        let body = r#"{"ip": "192.0.2.1", "city": "Innsbruck", "latitude": 47.26, "longitude": 11.39}"#;
        assert_eq!(
            parse_ip_response(body, "latitude", "longitude").unwrap(),
            Coordinate::new(47.26, 11.39)
        );
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let body = r#"{"status": "fail", "message": "reserved range"}"#;
        assert_eq!(parse_ip_response(body, "lat", "lon").unwrap_err().code(), 202);
        assert_eq!(parse_ip_response("rate limited", "lat", "lon").unwrap_err().code(), 202);
    }

    #[test]
    fn test_zoom_is_capped() {
        let precise = GeoFix {
            coordinate: Coordinate::new(47.26, 11.39),
            accuracy: 5.0,
        };
        assert_eq!(locate_zoom(&precise, Vec2::new(1280.0, 800.0)), LOCATE_MAX_ZOOM);

        let coarse = GeoFix {
            coordinate: Coordinate::new(47.26, 11.39),
            accuracy: IP_ACCURACY_METERS,
        };
        let zoom = locate_zoom(&coarse, Vec2::new(1280.0, 800.0));
        assert!(zoom < LOCATE_MAX_ZOOM && zoom > 8.0);
    }

    #[test]
    fn test_success_recenters_map() {
        let fix = GeoFix {
            coordinate: Coordinate::new(47.26, 11.39),
            accuracy: 5.0,
        };
        let pool = ThreadPool::new(1);
        let mut control = LocateControl::new(Arc::new(FixedLocator(Ok(fix))));
        let mut memory = MapMemory::default();

        assert!(control.request(&pool, || ()));
        assert!(!control.request(&pool, || ()));

        assert_eq!(poll_until_done(&mut control, &mut memory), Some(fix));
        let center = memory.detached().unwrap();
        assert!((center.lat() - 47.26).abs() < 1e-9);
        assert_eq!(f64::from(memory.zoom()), LOCATE_MAX_ZOOM);
    }

    #[test]
    fn test_failure_leaves_view_alone() {
        let pool = ThreadPool::new(1);
        let error = ErrorTypes::new(201, "permission denied".to_string());
        let mut control = LocateControl::new(Arc::new(FixedLocator(Err(error))));
        let mut memory = MapMemory::default();
        let zoom_before = memory.zoom();

        assert!(control.request(&pool, || ()));
        assert_eq!(poll_until_done(&mut control, &mut memory), None);
        assert!(memory.detached().is_none());
        assert_eq!(memory.zoom(), zoom_before);
        assert!(control.request(&pool, || ()));
    }
}
