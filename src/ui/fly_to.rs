use egui::Vec2;
use log::{debug, warn};
use walkers::{MapMemory, Position};

use crate::data::ski_data::Coordinate;
use crate::ui::tiles::{from_world, to_world, world_size};

/// Zoom level the view settles on after flying to a ski area.
pub const FLY_TO_ZOOM: f64 = 13.0;
/// Length of the fly-to animation, in seconds.
pub const FLY_TO_DURATION: f64 = 1.5;

/// Curvature of the zoom-out/zoom-in path.
const RHO: f64 = 1.42;

/// A value other components set and observers react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Watched<T> {
    value: Option<T>,
}

impl<T> Default for Watched<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Copy + PartialEq> Watched<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn get(&self) -> Option<T> {
        self.value
    }
}

/// Remembers the last value it saw and reports when a different one shows up.
///
/// Detection is by value: setting the same coordinate twice in a row is
/// reported once.
#[derive(Debug, Clone)]
pub struct ChangeDetector<T> {
    last: Option<T>,
}

impl<T> Default for ChangeDetector<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: Copy + PartialEq> ChangeDetector<T> {
    pub fn changed(&mut self, current: Option<T>) -> Option<T> {
        if current.is_some() && current != self.last {
            self.last = current;
            current
        } else {
            None
        }
    }
}

/// One frame of a camera animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyFrame {
    pub center: Coordinate,
    pub zoom: f64,
    pub finished: bool,
}

/// Smooth zoom-and-pan between two views along the van Wijk and Nuij optimal
/// path, eased out over a fixed duration.
#[derive(Debug, Clone)]
pub struct FlyAnimation {
    from: (f64, f64),
    to: (f64, f64),
    start_zoom: f64,
    target: Coordinate,
    target_zoom: f64,
    w0: f64,
    u1: f64,
    r0: f64,
    path_length: f64,
    started_at: f64,
    duration: f64,
}

impl FlyAnimation {
    /// Plans a flight.
    ///
    /// # Arguments
    /// * `from` / `start_zoom` - The current view.
    /// * `target` / `target_zoom` - Where the view ends up.
    /// * `viewport` - Size of the map on screen, in points.
    /// * `started_at` - Clock value (seconds) at which the flight starts.
    /// * `duration` - Length of the flight in seconds.
    pub fn new(
        from: Coordinate,
        start_zoom: f64,
        target: Coordinate,
        target_zoom: f64,
        viewport: Vec2,
        started_at: f64,
        duration: f64,
    ) -> Self {
        let scale = world_size(start_zoom);
        let project = |c: Coordinate| {
            let (x, y) = to_world(c);
            (x * scale, y * scale)
        };
        let from_px = project(from);
        let to_px = project(target);

        let w0 = f64::from(viewport.x.max(viewport.y)).max(1.0);
        let w1 = w0 * 2f64.powf(start_zoom - target_zoom);
        let distance = (to_px.0 - from_px.0).hypot(to_px.1 - from_px.1);
        let u1 = if distance > 0.0 { distance } else { 1.0 };

        let r0 = Self::r(false, w0, w1, u1);
        let r1 = Self::r(true, w0, w1, u1);

        Self {
            from: from_px,
            to: to_px,
            start_zoom,
            target,
            target_zoom,
            w0,
            u1,
            r0,
            path_length: (r1 - r0) / RHO,
            started_at,
            duration: duration.max(f64::EPSILON),
        }
    }

    fn r(end: bool, w0: f64, w1: f64, u1: f64) -> f64 {
        let rho2 = RHO * RHO;
        let (sign, w) = if end { (-1.0, w1) } else { (1.0, w0) };
        let t1 = w1 * w1 - w0 * w0 + sign * rho2 * rho2 * u1 * u1;
        let b1 = 2.0 * w * rho2 * u1;
        let b = t1 / b1;
        let sq = (b * b + 1.0).sqrt() - b;
        if sq < 1e-9 {
            -18.0
        } else {
            sq.ln()
        }
    }

    /// Visible width at path position `s`, relative to the start scale.
    fn width(&self, s: f64) -> f64 {
        self.w0 * (self.r0.cosh() / (self.r0 + RHO * s).cosh())
    }

    /// Distance travelled at path position `s`, in start-zoom pixels.
    fn travelled(&self, s: f64) -> f64 {
        self.w0 * (self.r0.cosh() * (self.r0 + RHO * s).tanh() - self.r0.sinh()) / (RHO * RHO)
    }

    fn ease_out(t: f64) -> f64 {
        1.0 - (1.0 - t).powf(1.5)
    }

    /// View at clock value `now`.
    pub fn sample(&self, now: f64) -> FlyFrame {
        let t = ((now - self.started_at) / self.duration).max(0.0);
        if t >= 1.0 {
            return FlyFrame {
                center: self.target,
                zoom: self.target_zoom,
                finished: true,
            };
        }

        let s = Self::ease_out(t) * self.path_length;
        let k = self.travelled(s) / self.u1;
        let scale = world_size(self.start_zoom);
        let x = self.from.0 + (self.to.0 - self.from.0) * k;
        let y = self.from.1 + (self.to.1 - self.from.1) * k;

        FlyFrame {
            center: from_world(x / scale, y / scale),
            zoom: self.start_zoom + (self.w0 / self.width(s)).log2(),
            finished: false,
        }
    }

    pub fn target(&self) -> Coordinate {
        self.target
    }

    pub fn target_zoom(&self) -> f64 {
        self.target_zoom
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }
}

/// Reacts to changes of the target coordinate by flying the map there.
#[derive(Debug, Default)]
pub struct FlyToController {
    detector: ChangeDetector<Coordinate>,
    animation: Option<FlyAnimation>,
    flights_started: usize,
}

impl FlyToController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an arbitrary flight, replacing the one in progress.
    pub fn start(&mut self, animation: FlyAnimation) {
        debug!(
            "Flying to [{:.4}, {:.4}] at zoom {}",
            animation.target.lat, animation.target.lon, animation.target_zoom
        );
        self.flights_started += 1;
        self.animation = Some(animation);
    }

    /// Runs once per frame: starts a flight when `target` changed and advances
    /// the current one.
    ///
    /// # Arguments
    /// * `target` - The watched target coordinate.
    /// * `memory` - The map's memory; its center and zoom are driven here.
    /// * `home` - The center the map shows while it is not detached.
    /// * `viewport` - Size of the map on screen.
    /// * `now` - Clock value in seconds.
    ///
    /// # Returns
    /// `true` while an animation is running.
    pub fn update(
        &mut self,
        target: &Watched<Coordinate>,
        memory: &mut MapMemory,
        home: Position,
        viewport: Vec2,
        now: f64,
    ) -> bool {
        if let Some(coordinate) = self.detector.changed(target.get()) {
            let center = Coordinate::from_position(memory.detached().unwrap_or(home));
            self.start(FlyAnimation::new(
                center,
                f64::from(memory.zoom()),
                coordinate,
                FLY_TO_ZOOM,
                viewport,
                now,
                FLY_TO_DURATION,
            ));
        }

        let Some(animation) = &self.animation else {
            return false;
        };

        let frame = animation.sample(now);
        memory.center_at(frame.center.to_position());
        if let Err(e) = memory.set_zoom(frame.zoom as f32) {
            warn!("Fly-to zoom {} rejected: {:?}", frame.zoom, e);
        }

        if frame.finished {
            self.animation = None;
        }
        !frame.finished
    }

    /// Stops the running flight where it is. The view was set by something
    /// else; the last seen target is kept so it does not fly again.
    pub fn cancel(&mut self) {
        if self.animation.take().is_some() {
            debug!("Flight cancelled");
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn current(&self) -> Option<&FlyAnimation> {
        self.animation.as_ref()
    }

    /// Number of flights started so far.
    pub fn flights_started(&self) -> usize {
        self.flights_started
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 800.0);

    fn alpbach() -> Coordinate {
        Coordinate::new(47.4, 11.9)
    }

    fn bansko() -> Coordinate {
        Coordinate::new(41.8, 23.5)
    }

    #[test]
    fn test_change_detector_is_value_based() {
        let mut detector = ChangeDetector::default();
        assert_eq!(detector.changed(None), None);
        assert_eq!(detector.changed(Some(alpbach())), Some(alpbach()));
        assert_eq!(detector.changed(Some(alpbach())), None);
        assert_eq!(detector.changed(Some(bansko())), Some(bansko()));
        assert_eq!(detector.changed(Some(alpbach())), Some(alpbach()));
    }

    #[test]
    fn test_animation_starts_at_origin() {
        let flight = FlyAnimation::new(alpbach(), 6.0, bansko(), 13.0, VIEWPORT, 10.0, 1.5);
        let frame = flight.sample(10.0);

        assert!(!frame.finished);
        assert!((frame.center.lat - 47.4).abs() < 1e-6);
        assert!((frame.center.lon - 11.9).abs() < 1e-6);
        assert!((frame.zoom - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_animation_ends_exactly_on_target() {
        let flight = FlyAnimation::new(alpbach(), 6.0, bansko(), 13.0, VIEWPORT, 10.0, 1.5);

        assert!(!flight.sample(11.4).finished);
        let frame = flight.sample(11.5);
        assert!(frame.finished);
        assert_eq!(frame.center, bansko());
        assert_eq!(frame.zoom, 13.0);
    }

    #[test]
    fn test_long_flight_zooms_out_midway() {
        let flight = FlyAnimation::new(alpbach(), 13.0, bansko(), 13.0, VIEWPORT, 0.0, 1.5);
        let mid = flight.sample(0.5);

        assert!(mid.zoom < 13.0);
        assert!(mid.center.lon > 11.9 && mid.center.lon < 23.5);
    }

    #[test]
    fn test_zoom_only_flight_keeps_center() {
        let flight = FlyAnimation::new(alpbach(), 6.0, alpbach(), 13.0, VIEWPORT, 0.0, 1.5);
        let mid = flight.sample(0.75);

        assert!((mid.center.lat - 47.4).abs() < 1e-9);
        assert!((mid.center.lon - 11.9).abs() < 1e-9);
        assert!(mid.zoom > 6.0 && mid.zoom < 13.0);
    }

    #[test]
    fn test_controller_flies_once_per_distinct_target() {
        let mut controller = FlyToController::new();
        let mut memory = MapMemory::default();
        let mut target = Watched::new();
        let home = Position::from_lon_lat(16.01, 47.85);

        assert!(!controller.update(&target, &mut memory, home, VIEWPORT, 0.0));
        assert_eq!(controller.flights_started(), 0);

        target.set(bansko());
        assert!(controller.update(&target, &mut memory, home, VIEWPORT, 0.0));
        assert_eq!(controller.flights_started(), 1);
        let flight = controller.current().unwrap();
        assert_eq!(flight.target(), bansko());
        assert_eq!(flight.target_zoom(), FLY_TO_ZOOM);
        assert_eq!(flight.duration(), FLY_TO_DURATION);

        target.set(bansko());
        controller.update(&target, &mut memory, home, VIEWPORT, 0.5);
        assert_eq!(controller.flights_started(), 1);

        assert!(!controller.update(&target, &mut memory, home, VIEWPORT, 2.0));
        assert!(!controller.is_animating());
        let center = memory.detached().unwrap();
        assert!((center.lat() - 41.8).abs() < 1e-9);
        assert!((center.lon() - 23.5).abs() < 1e-9);
        assert_eq!(f64::from(memory.zoom()), FLY_TO_ZOOM);
    }

    #[test]
    fn test_cancel_keeps_the_view_set_mid_flight() {
        let mut controller = FlyToController::new();
        let mut memory = MapMemory::default();
        let mut target = Watched::new();
        let home = Position::from_lon_lat(16.01, 47.85);

        target.set(bansko());
        assert!(controller.update(&target, &mut memory, home, VIEWPORT, 0.0));

        let innsbruck = Position::from_lon_lat(11.39, 47.26);
        memory.center_at(innsbruck);
        controller.cancel();
        assert!(!controller.is_animating());

        assert!(!controller.update(&target, &mut memory, home, VIEWPORT, 0.5));
        let center = memory.detached().unwrap();
        assert!((center.lat() - 47.26).abs() < 1e-9);
        assert!((center.lon() - 11.39).abs() < 1e-9);
        assert_eq!(controller.flights_started(), 1);
    }
}
