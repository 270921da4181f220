//! Frame-by-frame orchestration of the lighting pipeline.
//!
//! Lights are persistent: they stay in the pool until explicitly removed.
//! Each tick recomputes visibility and masks on the configured cadence,
//! advances falloff variants, and rebuilds the global light buffer.

use crate::api::config::LightingConfig;
use crate::api::types::{LightId, Rgb};
use crate::components::light::Light;
use crate::components::occluder::OccluderSet;
use crate::core::geometry::Point;
use crate::core::pool::LightPool;
use crate::core::time::{Cadence, FrameClock};
use crate::core::visibility::VisibilityCalculator;
use crate::error::LightingError;
use crate::renderer::buffer::RgbImage;
use crate::systems::compositor::{GlobalLightMask, LightBlend};
use crate::systems::mask::LightMaskGenerator;

/// Owns the lights, the occluders and the light buffer for one scene.
pub struct LightingSystem {
    calculator: VisibilityCalculator,
    masks: LightMaskGenerator,
    global: GlobalLightMask,
    lights: LightPool,
    clock: FrameClock,
    mask_cadence: Cadence,
    variant_cadence: Cadence,
    blend: LightBlend,
}

impl LightingSystem {
    /// Build a system for `occluders`, spawning every light the config lists.
    pub fn from_config(config: &LightingConfig, occluders: &OccluderSet) -> Result<Self, LightingError> {
        let calculator = VisibilityCalculator::new(occluders)?;
        let mut lights = LightPool::new();
        for desc in &config.lights {
            lights.insert(Light::from_desc(desc)?);
        }
        log::debug!(
            "lighting: {}x{} scene, {} occluder segments, {} lights",
            config.width,
            config.height,
            calculator.segments().len(),
            lights.len()
        );
        Ok(Self {
            calculator,
            masks: LightMaskGenerator::new(config.mask_blur),
            global: GlobalLightMask::new(config.width, config.height, config.ambient, config.blur),
            lights,
            clock: FrameClock::new(),
            mask_cadence: Cadence::new(config.mask_interval),
            variant_cadence: Cadence::new(config.variant_interval),
            blend: config.blend,
        })
    }

    /// Replace the occluders. Every light is recomputed on the next tick.
    /// On error the previous occluders stay in place.
    pub fn set_occluders(&mut self, occluders: &OccluderSet) -> Result<(), LightingError> {
        self.calculator = VisibilityCalculator::new(occluders)?;
        for (_, light) in self.lights.iter_mut() {
            light.invalidate();
        }
        log::debug!("lighting: occluders rebuilt, {} segments", occluders.len());
        Ok(())
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = self.lights.insert(light);
        log::debug!("lighting: added light {:?}", id);
        id
    }

    pub fn remove_light(&mut self, id: LightId) -> Result<Light, LightingError> {
        let light = self.lights.remove(id).ok_or(LightingError::UnknownLight(id))?;
        log::debug!("lighting: removed light {:?}", id);
        Ok(light)
    }

    /// Remove lights that don't match a predicate.
    pub fn retain_lights<F: FnMut(LightId, &Light) -> bool>(&mut self, f: F) {
        self.lights.retain(f);
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(id)
    }

    /// Move a light. Its mask follows on the next recompute.
    pub fn set_light_position(&mut self, id: LightId, position: Point) -> Result<(), LightingError> {
        let light = self.lights.get_mut(id).ok_or(LightingError::UnknownLight(id))?;
        light.position = position;
        Ok(())
    }

    pub fn lights(&self) -> &LightPool {
        &self.lights
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn set_ambient(&mut self, ambient: Rgb) {
        self.global.set_ambient(ambient);
    }

    pub fn blend(&self) -> LightBlend {
        self.blend
    }

    pub fn set_blend(&mut self, blend: LightBlend) {
        self.blend = blend;
    }

    /// Advance one frame of `dt` seconds and rebuild the light buffer.
    pub fn tick(&mut self, dt: f64) -> Result<(), LightingError> {
        let frame = self.clock.advance(dt);
        let recompute = self.mask_cadence.fires(frame);
        let advance_variants = self.variant_cadence.fires(frame);

        for (_, light) in self.lights.iter_mut() {
            let falloff_changed = advance_variants && light.next_variant();
            if recompute || light.needs_update() {
                let polygon = self.calculator.visible_polygon(light.position);
                light.update_mask(polygon, &mut self.masks)?;
            } else if falloff_changed {
                light.remask(&mut self.masks)?;
            }
        }

        self.global.update(self.lights.lights(), self.clock.elapsed());
        Ok(())
    }

    /// Light a scene image with the current buffer.
    pub fn apply(&self, scene: &mut RgbImage) {
        self.global.apply(scene, self.blend);
    }

    /// Light an RGBA8 scene image with the current buffer.
    pub fn apply_rgba(&self, rgba: &mut [u8]) {
        self.global.apply_rgba(rgba, self.blend);
    }

    /// The light buffer of the last tick.
    pub fn buffer(&self) -> &RgbImage {
        self.global.buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::LightDesc;
    use crate::components::light::LightColor;
    use crate::core::geometry::{Rect, Segment};
    use crate::systems::falloff::FalloffShape;

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn room(size: f64) -> OccluderSet {
        OccluderSet::with_bounds(Rect::from_size(pt(0.0, 0.0), pt(size, size)))
    }

    fn config(size: u32) -> LightingConfig {
        LightingConfig {
            width: size,
            height: size,
            mask_blur: 0,
            ..LightingConfig::default()
        }
    }

    fn white(x: f64, y: f64, range: u32) -> Light {
        Light::new(pt(x, y), LightColor::default(), range, 1).unwrap()
    }

    #[test]
    fn light_in_an_empty_room() {
        let mut system = LightingSystem::from_config(&config(100), &room(100.0)).unwrap();
        let id = system.add_light(white(50.0, 50.0, 50));
        system.tick(1.0 / 60.0).unwrap();

        let light = system.light(id).unwrap();
        assert_eq!(light.polygon().len(), 4);
        let alpha = light.alpha().unwrap();
        assert_eq!(alpha.get(0, 0), 0);
        assert_eq!(alpha.get(99, 99), 0);
        assert!(alpha.get(50, 50) > 0);

        assert!(system.buffer().get(50, 50).unwrap().r > 200);
        assert_eq!(system.buffer().get(0, 0).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn spawns_lights_from_config() {
        let mut cfg = config(100);
        cfg.lights = vec![
            LightDesc {
                position: [20.0, 20.0],
                range: 10,
                ..LightDesc::default()
            },
            LightDesc {
                position: [70.0, 70.0],
                range: 10,
                variants: 3,
                shape: FalloffShape::Speckle,
                ..LightDesc::default()
            },
        ];
        let system = LightingSystem::from_config(&cfg, &room(100.0)).unwrap();
        assert_eq!(system.lights().len(), 2);
    }

    #[test]
    fn invalid_light_in_config_fails() {
        let mut cfg = config(100);
        cfg.lights = vec![LightDesc {
            range: 0,
            ..LightDesc::default()
        }];
        let err = LightingSystem::from_config(&cfg, &room(100.0)).err().unwrap();
        assert!(matches!(err, LightingError::InvalidRange));
    }

    #[test]
    fn unbounded_occluders_are_rejected() {
        let mut walls = OccluderSet::new();
        walls.add_segment(Segment::new(pt(0.0, 0.0), pt(10.0, 0.0)));
        let err = LightingSystem::from_config(&config(10), &walls).err().unwrap();
        assert!(matches!(err, LightingError::Unbounded));

        let mut system = LightingSystem::from_config(&config(10), &room(10.0)).unwrap();
        assert!(system.set_occluders(&walls).is_err());
    }

    #[test]
    fn masks_are_throttled_between_recomputes() {
        let mut cfg = config(100);
        cfg.mask_interval = 3;
        let mut system = LightingSystem::from_config(&cfg, &room(100.0)).unwrap();
        let id = system.add_light(white(30.0, 30.0, 10));

        // frame 1: new light, computed regardless of cadence
        system.tick(0.016).unwrap();
        assert_eq!(system.light(id).unwrap().seen_from(), pt(30.0, 30.0));

        // frame 2: stale mask kept, but drawn where the light is now
        system.set_light_position(id, pt(60.0, 60.0)).unwrap();
        system.tick(0.016).unwrap();
        assert_eq!(system.light(id).unwrap().seen_from(), pt(30.0, 30.0));
        assert!(system.buffer().get(60, 60).unwrap().r > 200);
        assert_eq!(system.buffer().get(30, 30).unwrap(), Rgb::BLACK);

        // frame 3: recomputed
        system.tick(0.016).unwrap();
        assert_eq!(system.light(id).unwrap().seen_from(), pt(60.0, 60.0));
    }

    #[test]
    fn occluder_change_forces_recompute() {
        let mut cfg = config(100);
        cfg.mask_interval = 50;
        let mut system = LightingSystem::from_config(&cfg, &room(100.0)).unwrap();
        let id = system.add_light(white(50.0, 50.0, 40));
        system.tick(0.016).unwrap();
        assert_eq!(system.light(id).unwrap().polygon().len(), 4);

        let mut walls = room(100.0);
        walls.add_rect(Rect::from_size(pt(60.0, 40.0), pt(10.0, 20.0)));
        system.set_occluders(&walls).unwrap();
        assert!(system.light(id).unwrap().needs_update());

        system.tick(0.016).unwrap();
        let light = system.light(id).unwrap();
        assert!(light.polygon().len() > 4);
        // behind the pillar, relative to the mask's top-left at (10, 10)
        assert_eq!(light.alpha().unwrap().get(75 - 10, 50 - 10), 0);
    }

    #[test]
    fn variants_advance_on_their_own_cadence() {
        let mut cfg = config(60);
        cfg.mask_interval = 100;
        cfg.variant_interval = 2;
        let mut system = LightingSystem::from_config(&cfg, &room(60.0)).unwrap();
        let light = Light::new(pt(30.0, 30.0), LightColor::default(), 12, 3)
            .unwrap()
            .with_shape(FalloffShape::Speckle);
        let id = system.add_light(light);

        system.tick(0.016).unwrap();
        let first = system.light(id).unwrap().alpha().unwrap().clone();
        assert_eq!(system.light(id).unwrap().variant().index(), 0);

        system.tick(0.016).unwrap();
        let light = system.light(id).unwrap();
        assert_eq!(light.variant().index(), 1);
        assert_ne!(light.alpha().unwrap(), &first);
    }

    #[test]
    fn removing_twice_is_an_error() {
        let mut system = LightingSystem::from_config(&config(50), &room(50.0)).unwrap();
        let id = system.add_light(white(25.0, 25.0, 5));
        assert!(system.remove_light(id).is_ok());
        let err = system.remove_light(id).unwrap_err();
        assert!(matches!(err, LightingError::UnknownLight(stale) if stale == id));
        assert!(system.set_light_position(id, pt(1.0, 1.0)).is_err());
    }

    #[test]
    fn removed_lights_stop_contributing() {
        let mut system = LightingSystem::from_config(&config(50), &room(50.0)).unwrap();
        let id = system.add_light(white(25.0, 25.0, 10));
        system.tick(0.016).unwrap();
        assert!(system.buffer().get(25, 25).unwrap().r > 0);
        system.retain_lights(|light_id, _| light_id != id);
        system.tick(0.016).unwrap();
        assert_eq!(system.buffer().get(25, 25).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn apply_uses_the_configured_blend() {
        let mut cfg = config(20);
        cfg.ambient = Rgb::new(128, 128, 128);
        let mut system = LightingSystem::from_config(&cfg, &room(20.0)).unwrap();
        system.tick(0.016).unwrap();

        let mut scene = RgbImage::filled(20, 20, Rgb::new(200, 200, 200));
        system.apply(&mut scene);
        assert_eq!(scene.get(3, 3).unwrap(), Rgb::new(100, 100, 100));

        system.set_blend(LightBlend::Additive);
        let mut rgba = vec![100u8; 20 * 20 * 4];
        system.apply_rgba(&mut rgba);
        assert_eq!(&rgba[0..4], &[228, 228, 228, 100]);
    }

    #[test]
    fn rainbow_follows_the_frame_clock() {
        let mut system = LightingSystem::from_config(&config(40), &room(40.0)).unwrap();
        let color = LightColor::Rainbow { hue_start: 0.0, loop_time: 6.0 };
        system.add_light(Light::new(pt(20.0, 20.0), color, 10, 1).unwrap());

        system.tick(0.0).unwrap();
        let red = system.buffer().get(20, 20).unwrap();
        assert!(red.r > 200 && red.g == 0 && red.b == 0);

        system.tick(2.0).unwrap();
        let green = system.buffer().get(20, 20).unwrap();
        assert!(green.g > 200 && green.r == 0);
    }
}
