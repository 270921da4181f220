use shade_engine::{
    Light, LightColor, LightId, LightingConfig, LightingError, LightingSystem,
    OccluderSet, Point, Rect, Rgb, Segment,
};

/// Wires a [`LightingSystem`] to the browser.
///
/// JavaScript refers to lights by plain `u32` handles, which this runner maps
/// to pool ids. Walls are collected here and handed to the system as a new
/// occluder set on the next tick after they change. `applied` is the set the
/// system currently uses, restored if a rebuild is rejected.
pub struct LightingRunner {
    system: LightingSystem,
    config: LightingConfig,
    walls: OccluderSet,
    applied: OccluderSet,
    walls_dirty: bool,
    handles: Vec<Option<LightId>>,
}

impl LightingRunner {
    pub fn new(config_json: &str) -> Result<Self, LightingError> {
        let config = LightingConfig::from_json(config_json)?;
        let walls = Self::bounds(&config);
        let system = LightingSystem::from_config(&config, &walls)?;
        let handles = system.lights().iter().map(|(id, _)| Some(id)).collect();
        Ok(Self {
            system,
            config,
            applied: walls.clone(),
            walls,
            walls_dirty: false,
            handles,
        })
    }

    fn bounds(config: &LightingConfig) -> OccluderSet {
        let size = Point::new(config.width as f64, config.height as f64);
        OccluderSet::with_bounds(Rect::from_size(Point::ZERO, size))
    }

    // ---- Walls ----

    pub fn add_wall_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.walls.add_rect(Rect::from_size(Point::new(x, y), Point::new(w, h)));
        self.walls_dirty = true;
    }

    pub fn add_wall_segment(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.walls.add_segment(Segment::new(Point::new(x1, y1), Point::new(x2, y2)));
        self.walls_dirty = true;
    }

    /// Drop every wall, keeping the scene bounds.
    pub fn clear_walls(&mut self) {
        self.walls = Self::bounds(&self.config);
        self.walls_dirty = true;
    }

    // ---- Lights ----

    fn track(&mut self, light: Light) -> u32 {
        let id = self.system.add_light(light);
        self.handles.push(Some(id));
        (self.handles.len() - 1) as u32
    }

    fn id(&self, handle: u32) -> Option<LightId> {
        self.handles.get(handle as usize).copied().flatten()
    }

    pub fn add_light(
        &mut self,
        x: f64,
        y: f64,
        color: Rgb,
        range: u32,
        piercing: u32,
        variants: u32,
    ) -> Result<u32, LightingError> {
        let light = Light::new(Point::new(x, y), LightColor::Fixed(color), range, variants)?
            .with_piercing(piercing);
        Ok(self.track(light))
    }

    pub fn add_rainbow_light(
        &mut self,
        x: f64,
        y: f64,
        hue_start: f64,
        loop_time: f64,
        range: u32,
        variants: u32,
    ) -> Result<u32, LightingError> {
        let color = LightColor::Rainbow { hue_start, loop_time };
        let light = Light::new(Point::new(x, y), color, range, variants)?;
        Ok(self.track(light))
    }

    /// Returns false if the handle was unknown or already removed.
    pub fn remove_light(&mut self, handle: u32) -> bool {
        let Some(id) = self.id(handle) else {
            return false;
        };
        self.handles[handle as usize] = None;
        self.system.remove_light(id).is_ok()
    }

    /// Returns false if the handle was unknown or already removed.
    pub fn set_light_position(&mut self, handle: u32, x: f64, y: f64) -> bool {
        match self.id(handle) {
            Some(id) => self.system.set_light_position(id, Point::new(x, y)).is_ok(),
            None => false,
        }
    }

    pub fn light_count(&self) -> u32 {
        self.system.lights().len() as u32
    }

    // ---- Frame ----

    /// Run one frame: rebuild occluders if walls changed, then update lights.
    ///
    /// A rejected wall set is dropped in favour of the last accepted one; the
    /// frame still runs and the rejection is returned afterwards.
    pub fn tick(&mut self, dt: f64) -> Result<(), LightingError> {
        let rebuilt = if self.walls_dirty {
            self.walls_dirty = false;
            self.rebuild_occluders()
        } else {
            Ok(())
        };
        self.system.tick(dt)?;
        rebuilt
    }

    fn rebuild_occluders(&mut self) -> Result<(), LightingError> {
        match self.system.set_occluders(&self.walls) {
            Ok(()) => {
                self.applied = self.walls.clone();
                Ok(())
            }
            Err(err) => {
                log::warn!("shade: walls rejected ({err}), keeping previous occluders");
                self.walls = self.applied.clone();
                Err(err)
            }
        }
    }

    /// Light an RGBA8 scene image of the configured size in place.
    pub fn apply_rgba(&self, rgba: &mut [u8]) {
        self.system.apply_rgba(rgba);
    }

    // ---- Pointer accessors for direct memory reads ----

    pub fn buffer_ptr(&self) -> *const u8 {
        self.system.buffer().as_bytes().as_ptr()
    }

    pub fn buffer_len(&self) -> u32 {
        self.system.buffer().as_bytes().len() as u32
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> LightingRunner {
        LightingRunner::new(r#"{"width": 64, "height": 48, "mask_blur": 0}"#).unwrap()
    }

    #[test]
    fn buffer_matches_config() {
        let mut r = runner();
        r.tick(0.016).unwrap();
        assert_eq!(r.width(), 64);
        assert_eq!(r.height(), 48);
        assert_eq!(r.buffer_len(), 64 * 48 * 3);
        assert!(!r.buffer_ptr().is_null());
    }

    #[test]
    fn bad_config_is_rejected() {
        assert!(LightingRunner::new("not json").is_err());
    }

    #[test]
    fn lights_from_config_get_handles() {
        let r = LightingRunner::new(
            r#"{"width": 64, "height": 48, "lights": [{"position": [10.0, 10.0], "range": 8}]}"#,
        )
        .unwrap();
        assert_eq!(r.light_count(), 1);
        assert!(r.id(0).is_some());
    }

    #[test]
    fn walls_cast_shadows_after_tick() {
        let mut r = runner();
        let handle = r.add_light(10.0, 24.0, Rgb::WHITE, 30, 0, 1).unwrap();
        r.add_wall_rect(20.0, 0.0, 4.0, 40.0);
        r.tick(0.016).unwrap();

        let mut lit = vec![255u8; 64 * 48 * 4];
        r.apply_rgba(&mut lit);
        let px = |x: usize, y: usize| lit[(y * 64 + x) * 4];
        assert!(px(12, 24) > 0);
        assert_eq!(px(30, 10), 0);
        assert_eq!(lit[3], 255);

        assert!(r.set_light_position(handle, 40.0, 24.0));
        assert!(r.remove_light(handle));
        assert!(!r.remove_light(handle));
        assert!(!r.set_light_position(handle, 1.0, 1.0));
        assert_eq!(r.light_count(), 0);
    }

    #[test]
    fn wall_past_the_scene_edge_still_ticks() {
        let mut r = runner();
        r.add_light(40.0, 14.0, Rgb::WHITE, 30, 0, 1).unwrap();
        r.tick(0.016).unwrap();

        r.add_wall_rect(60.0, 10.0, 8.0, 8.0);
        assert!(r.tick(0.016).is_ok());
        assert!(r.tick(0.016).is_ok());
        assert_eq!(r.applied.len(), r.walls.len());

        let mut lit = vec![255u8; 64 * 48 * 4];
        r.apply_rgba(&mut lit);
        let px = |x: usize, y: usize| lit[(y * 64 + x) * 4];
        assert!(px(50, 14) > 0);
        assert_eq!(px(63, 14), 0);
    }

    #[test]
    fn rejected_walls_fall_back_to_the_last_accepted_set() {
        let mut r = runner();
        r.add_wall_rect(10.0, 10.0, 4.0, 4.0);
        r.tick(0.016).unwrap();
        let accepted = r.walls.len();

        // a set with no enclosing rectangle at all
        r.walls = OccluderSet::new();
        r.add_wall_segment(0.0, 0.0, 10.0, 0.0);
        assert!(r.tick(0.016).is_err());
        assert_eq!(r.walls.len(), accepted);
        assert!(r.tick(0.016).is_ok());
    }

    #[test]
    fn invalid_lights_are_errors() {
        let mut r = runner();
        assert!(r.add_light(1.0, 1.0, Rgb::WHITE, 0, 0, 1).is_err());
        assert!(r.add_rainbow_light(1.0, 1.0, 0.0, 5.0, 10, 0).is_err());
        assert_eq!(r.light_count(), 0);
    }

    #[test]
    fn clearing_walls_keeps_bounds() {
        let mut r = runner();
        r.add_wall_segment(5.0, 5.0, 5.0, 20.0);
        r.clear_walls();
        assert_eq!(r.walls.len(), 4);
        assert!(r.tick(0.016).is_ok());
    }
}
