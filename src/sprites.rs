//! Procedural pixel art. The game ships no image files: player, enemy, star and orb textures are
//! painted into RGBA buffers at startup and registered with Bevy's asset storage.
//!
//! Frames are authored in tiny logical pixels (16x20 for the player) with a y-down canvas, then
//! drawn at `SPRITE_SCALE` with nearest sampling (set on the `ImagePlugin` in `main`).

use std::time::Duration;

use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::sprite::Anchor;

pub struct SpriteArtPlugin;

impl Plugin for SpriteArtPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, build_sprite_sheets);
    }
}

pub const SPRITE_SCALE: f32 = 3.0;
pub const PLAYER_FRAME: UVec2 = UVec2::new(16, 20);
pub const PLAYER_FRAMES: u32 = 4;
pub const ENEMY_FRAME: UVec2 = UVec2::new(16, 18);
pub const ENEMY_FRAMES: u32 = 2;

const STAR_SIZE: u32 = 25;
const ORB_SIZE: u32 = 18;

/// Handles to every generated texture. Kept alive for the whole run.
#[derive(Resource, Clone)]
pub struct SpriteSheets {
    pub player: Handle<Image>,
    pub player_layout: Handle<TextureAtlasLayout>,
    pub enemy: Handle<Image>,
    pub enemy_layout: Handle<TextureAtlasLayout>,
    pub star: Handle<Image>,
    /// White disc, tinted per pickup kind.
    pub orb: Handle<Image>,
}

type Rgba = [u8; 4];

const fn hex(rgb: u32) -> Rgba {
    [(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xff]
}

struct PlayerPalette;

impl PlayerPalette {
    const SKIN: Rgba = hex(0xf2c29b);
    const HAT: Rgba = hex(0xd2b48c);
    const COAT: Rgba = hex(0xb22222);
    const PANTS: Rgba = hex(0x1f1f1f);
    const BOOTS: Rgba = hex(0x5a3d2b);
    const SHIRT: Rgba = hex(0xe6e6e6);
    const EYE: Rgba = hex(0x111111);
}

struct SelenitePalette;

impl SelenitePalette {
    const SKIN: Rgba = hex(0xb5d08a);
    const SHELL: Rgba = hex(0x6c8d3e);
    const LIMB: Rgba = hex(0x3d5c2a);
    const EYE: Rgba = hex(0x101010);
    const HIGHLIGHT: Rgba = hex(0xdfeacc);
}

/// A y-down RGBA8 pixel buffer.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let mut px = [0; 4];
        px.copy_from_slice(&self.data[i..i + 4]);
        Some(px)
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        self.data[i..i + 4].copy_from_slice(&color);
    }

    /// Fills a rectangle, snapping the origin to the nearest pixel. Anything off-canvas is
    /// clipped.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: u32, h: u32, color: Rgba) {
        let x0 = x.round() as i32;
        let y0 = y.round() as i32;
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                self.set(x0 + dx, y0 + dy, color);
            }
        }
    }

    pub fn into_image(self) -> Image {
        Image::new(
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            self.data,
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::RENDER_WORLD | RenderAssetUsages::MAIN_WORLD,
        )
    }
}

/// Frames laid out left to right in one strip.
struct FrameStrip {
    canvas: PixelCanvas,
    frame: UVec2,
}

impl FrameStrip {
    fn new(frame: UVec2, count: u32) -> Self {
        Self {
            canvas: PixelCanvas::new(frame.x * count, frame.y),
            frame,
        }
    }

    fn painter(&mut self, index: u32) -> FramePainter<'_> {
        FramePainter {
            canvas: &mut self.canvas,
            ox: (index * self.frame.x) as f32,
        }
    }
}

struct FramePainter<'a> {
    canvas: &'a mut PixelCanvas,
    ox: f32,
}

impl FramePainter<'_> {
    fn p(&mut self, x: f32, y: f32, w: u32, h: u32, color: Rgba) {
        self.canvas.fill_rect(self.ox + x, y, w, h, color);
    }
}

/// Frame 0 idle, 1 and 2 walk, 3 jump.
pub fn paint_player_strip() -> PixelCanvas {
    type C = PlayerPalette;
    let mut strip = FrameStrip::new(PLAYER_FRAME, PLAYER_FRAMES);

    for frame in 0..PLAYER_FRAMES {
        let mut p = strip.painter(frame);

        // Top hat
        p.p(2.0, 2.0, 12, 1, C::HAT);
        p.p(4.0, 0.0, 8, 2, C::HAT);

        p.p(5.0, 3.0, 6, 4, C::SKIN);
        p.p(9.0, 4.0, 1, 1, C::EYE);

        p.p(6.0, 7.0, 4, 1, C::SHIRT);

        p.p(4.0, 8.0, 8, 6, C::COAT);
        p.p(5.0, 9.0, 1, 2, C::SHIRT);
        p.p(10.0, 9.0, 1, 2, C::SHIRT);

        match frame {
            1 => {
                p.p(3.0, 9.0, 1, 4, C::COAT);
                p.p(12.0, 10.0, 1, 3, C::COAT);
            }
            2 => {
                p.p(3.0, 10.0, 1, 3, C::COAT);
                p.p(12.0, 9.0, 1, 4, C::COAT);
            }
            _ => {
                p.p(3.0, 9.0, 1, 4, C::COAT);
                p.p(12.0, 9.0, 1, 4, C::COAT);
            }
        }

        p.p(5.0, 14.0, 6, 3, C::PANTS);

        match frame {
            1 => {
                p.p(5.0, 17.0, 2, 2, C::PANTS);
                p.p(9.0, 17.0, 2, 1, C::PANTS);
            }
            2 => {
                p.p(5.0, 17.0, 2, 1, C::PANTS);
                p.p(9.0, 17.0, 2, 2, C::PANTS);
            }
            3 => p.p(6.0, 17.0, 4, 1, C::PANTS),
            _ => {
                p.p(5.0, 17.0, 2, 2, C::PANTS);
                p.p(9.0, 17.0, 2, 2, C::PANTS);
            }
        }

        if frame == 3 {
            p.p(6.0, 18.0, 4, 1, C::BOOTS);
        } else {
            p.p(5.0, 19.0, 2, 1, C::BOOTS);
            p.p(9.0, 19.0, 2, 1, C::BOOTS);
        }
    }

    strip.canvas
}

/// Two-frame walk. The eye sits on the right; flipping the sprite turns it around.
pub fn paint_selenite_strip() -> PixelCanvas {
    type C = SelenitePalette;
    let mut strip = FrameStrip::new(ENEMY_FRAME, ENEMY_FRAMES);

    for frame in 0..ENEMY_FRAMES {
        let mut p = strip.painter(frame);
        let stride_a = frame == 0;

        p.p(6.0, 0.0, 4, 2, C::SKIN);
        p.p(5.0, 2.0, 6, 2, C::SKIN);
        p.p(8.3, 1.0, 1, 1, C::EYE);
        p.p(7.0, 4.0, 2, 1, C::SKIN);

        // Ribbed shell
        p.p(4.0, 5.0, 8, 7, C::SHELL);
        for rib_y in [6.0, 8.0, 10.0] {
            p.p(5.0, rib_y, 6, 1, C::HIGHLIGHT);
        }

        let (left_arm, right_arm) = if stride_a { ((6.0, 4), (7.0, 3)) } else { ((7.0, 3), (6.0, 4)) };
        p.p(3.0, left_arm.0, 1, left_arm.1, C::LIMB);
        p.p(12.0, right_arm.0, 1, right_arm.1, C::LIMB);

        p.p(6.0, 12.0, 4, 1, C::SHELL);

        let (left_leg, right_leg) = if stride_a { (4, 3) } else { (3, 4) };
        p.p(6.0, 13.0, 2, left_leg, C::LIMB);
        p.p(8.0, 13.0, 2, right_leg, C::LIMB);

        p.p(6.0, 17.0, 2, 1, C::LIMB);
        p.p(8.0, 17.0, 2, 1, C::LIMB);
    }

    strip.canvas
}

/// Five-pointed star, point up.
pub fn paint_star(size: u32, inner: f32, outer: f32) -> PixelCanvas {
    let mut canvas = PixelCanvas::new(size, size);
    let c = size as f32 * 0.5;
    let points: Vec<Vec2> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / 5.0;
            Vec2::new(c + r * angle.cos(), c + r * angle.sin())
        })
        .collect();

    for y in 0..size {
        for x in 0..size {
            if point_in_polygon(Vec2::new(x as f32 + 0.5, y as f32 + 0.5), &points) {
                canvas.set(x as i32, y as i32, [0xff; 4]);
            }
        }
    }
    canvas
}

pub fn paint_disc(size: u32) -> PixelCanvas {
    let mut canvas = PixelCanvas::new(size, size);
    let r = size as f32 * 0.5;
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5 - r, y as f32 + 0.5 - r);
            if d.length_squared() <= r * r {
                canvas.set(x as i32, y as i32, [0xff; 4]);
            }
        }
    }
    canvas
}

fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Anchor that puts the transform at the body's center while the sprite's bottom edge sits on
/// the body's bottom edge, so feet touch the ground even when the art is taller than the body.
pub fn feet_anchor(body_height: f32, sprite_height: f32) -> Anchor {
    Anchor::Custom(Vec2::new(0.0, (body_height - sprite_height) * 0.5 / sprite_height))
}

/// Loops a list of atlas indices at a fixed rate.
#[derive(Component, Debug)]
pub struct SpriteAnimator {
    frames: &'static [usize],
    timer: Timer,
    cursor: usize,
}

impl SpriteAnimator {
    pub fn new(frames: &'static [usize], fps: f32) -> Self {
        Self {
            frames,
            timer: Timer::new(frame_time(fps), TimerMode::Repeating),
            cursor: 0,
        }
    }

    /// Switches clips; re-selecting the running clip keeps its phase.
    pub fn set_clip(&mut self, frames: &'static [usize], fps: f32) {
        if self.frames == frames {
            return;
        }
        *self = Self::new(frames, fps);
    }

    pub fn tick(&mut self, delta: Duration) -> usize {
        self.timer.tick(delta);
        let len = self.frames.len().max(1);
        self.cursor = (self.cursor + self.timer.times_finished_this_tick() as usize) % len;
        self.frames.get(self.cursor).copied().unwrap_or(0)
    }
}

fn frame_time(fps: f32) -> Duration {
    Duration::from_secs_f32(1.0 / fps.max(0.01))
}

fn build_sprite_sheets(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    let sheets = SpriteSheets {
        player: images.add(paint_player_strip().into_image()),
        player_layout: layouts.add(TextureAtlasLayout::from_grid(
            PLAYER_FRAME,
            PLAYER_FRAMES,
            1,
            None,
            None,
        )),
        enemy: images.add(paint_selenite_strip().into_image()),
        enemy_layout: layouts.add(TextureAtlasLayout::from_grid(
            ENEMY_FRAME,
            ENEMY_FRAMES,
            1,
            None,
            None,
        )),
        star: images.add(paint_star(STAR_SIZE, 6.0, 12.0).into_image()),
        orb: images.add(paint_disc(ORB_SIZE).into_image()),
    };
    commands.insert_resource(sheets);
    debug!("Generated sprite sheets");
}
