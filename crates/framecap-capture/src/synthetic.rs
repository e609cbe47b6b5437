//! In-memory backends.
//!
//! Each type is a cheap handle over shared state: hand one clone to
//! [`crate::ScreenCapture`] and keep another to draw into the "screen" and
//! inspect what the engine did. The engine is single-threaded, so
//! `Rc<RefCell<_>>` is enough.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use framecap_core::{Backend, BackendFault, Rect, WindowGeometry, WindowPixelFormat};

use crate::host::{
    GlPrimitives, OffscreenTarget, RendererId, RendererPrimitives, SurfaceId, SurfaceInfo,
    SurfacePrimitives, TextureId, VideoHost,
};

fn copy_prefix(dst: &mut [u8], src: &[u8]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

// ── Host ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct HostState {
    geometry: Option<WindowGeometry>,
    backend: Option<Backend>,
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticHost {
    state: Rc<RefCell<HostState>>,
}

impl SyntheticHost {
    pub fn new(geometry: Option<WindowGeometry>, backend: Option<Backend>) -> Self {
        Self { state: Rc::new(RefCell::new(HostState { geometry, backend })) }
    }

    pub fn set_geometry(&self, geometry: Option<WindowGeometry>) {
        self.state.borrow_mut().geometry = geometry;
    }

    pub fn set_backend(&self, backend: Option<Backend>) {
        self.state.borrow_mut().backend = backend;
    }
}

impl VideoHost for SyntheticHost {
    fn window_geometry(&self) -> Option<WindowGeometry> {
        self.state.borrow().geometry
    }

    fn active_backend(&self) -> Option<Backend> {
        self.state.borrow().backend
    }
}

// ── Accelerated context ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GlState {
    /// RGBA, bottom row first.
    default_fb: Vec<u8>,
    targets: HashMap<u32, Vec<u8>>,
    next_id: u32,
    created: usize,
    fail_create: bool,
}

/// Accelerated context whose default framebuffer is a plain RGBA byte array.
#[derive(Debug, Clone, Default)]
pub struct SyntheticGl {
    state: Rc<RefCell<GlState>>,
}

impl SyntheticGl {
    pub fn new(width: u32, height: u32) -> Self {
        let state = GlState {
            default_fb: vec![0; width as usize * height as usize * 4],
            ..GlState::default()
        };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Replaces the default framebuffer contents (bottom row first).
    pub fn set_default_framebuffer(&self, pixels: &[u8]) {
        copy_prefix(&mut self.state.borrow_mut().default_fb, pixels);
    }

    pub fn default_framebuffer(&self) -> Vec<u8> {
        self.state.borrow().default_fb.clone()
    }

    pub fn target_pixels(&self, target: OffscreenTarget) -> Option<Vec<u8>> {
        self.state.borrow().targets.get(&target.0).cloned()
    }

    pub fn created_targets(&self) -> usize {
        self.state.borrow().created
    }

    pub fn live_targets(&self) -> usize {
        self.state.borrow().targets.len()
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.state.borrow_mut().fail_create = fail;
    }
}

impl GlPrimitives for SyntheticGl {
    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<OffscreenTarget, BackendFault> {
        let mut state = self.state.borrow_mut();
        if state.fail_create {
            return Err(BackendFault::new("framebuffer incomplete"));
        }
        state.next_id += 1;
        state.created += 1;
        let id = state.next_id;
        state.targets.insert(id, vec![0; width as usize * height as usize * 4]);
        Ok(OffscreenTarget(id))
    }

    fn blit_from_default(&mut self, target: OffscreenTarget, _width: u32, _height: u32) {
        let mut state = self.state.borrow_mut();
        let GlState { default_fb, targets, .. } = &mut *state;
        if let Some(pixels) = targets.get_mut(&target.0) {
            copy_prefix(pixels, default_fb);
        }
    }

    fn blit_to_default(&mut self, target: OffscreenTarget, _width: u32, _height: u32) {
        let mut state = self.state.borrow_mut();
        let GlState { default_fb, targets, .. } = &mut *state;
        if let Some(pixels) = targets.get(&target.0) {
            copy_prefix(default_fb, pixels);
        }
    }

    fn read_pixels(&mut self, target: OffscreenTarget, _width: u32, _height: u32, out: &mut [u8]) {
        if let Some(pixels) = self.state.borrow().targets.get(&target.0) {
            copy_prefix(out, pixels);
        }
    }

    fn delete_offscreen(&mut self, target: OffscreenTarget) {
        self.state.borrow_mut().targets.remove(&target.0);
    }
}

// ── Software surfaces ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Surface {
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    red_mask: u32,
    src_alpha: bool,
    clip: Rect,
    pixels: Vec<u8>,
    locked: bool,
}

impl Surface {
    fn new(width: u32, height: u32, bytes_per_pixel: usize, red_mask: u32) -> Self {
        Self {
            width,
            height,
            bytes_per_pixel,
            red_mask,
            src_alpha: false,
            clip: Rect::new(0, 0, width, height),
            pixels: vec![0; width as usize * height as usize * bytes_per_pixel],
            locked: false,
        }
    }

    fn pitch(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }

    /// Copies `src` into this surface, limited to the clip rectangle.
    fn blit_from(&mut self, src: &Surface) {
        let x0 = self.clip.x.max(0) as usize;
        let y0 = self.clip.y.max(0) as usize;
        let x1 = (x0 + self.clip.width as usize).min(self.width.min(src.width) as usize);
        let y1 = (y0 + self.clip.height as usize).min(self.height.min(src.height) as usize);
        if x0 >= x1 {
            return;
        }
        let (bpp, dst_pitch, src_pitch) = (self.bytes_per_pixel, self.pitch(), src.pitch());
        for y in y0..y1 {
            let dst = &mut self.pixels[y * dst_pitch + x0 * bpp..y * dst_pitch + x1 * bpp];
            let from = &src.pixels[y * src_pitch + x0 * bpp..];
            copy_prefix(dst, from);
        }
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    surfaces: HashMap<u32, Surface>,
    video: Option<u32>,
    next_id: u32,
    blit_alpha_states: Vec<bool>,
    fail_lock: bool,
    fail_display_format: bool,
}

impl SurfaceState {
    fn video_mut(&mut self) -> Option<&mut Surface> {
        let id = self.video?;
        self.surfaces.get_mut(&id)
    }

    fn video(&self) -> Option<&Surface> {
        self.surfaces.get(&self.video?)
    }
}

/// Software video surface plus whatever surfaces the engine allocates.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSurfaces {
    state: Rc<RefCell<SurfaceState>>,
}

impl SyntheticSurfaces {
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize, red_mask: u32) -> Self {
        let mut state = SurfaceState { next_id: 1, video: Some(1), ..SurfaceState::default() };
        state.surfaces.insert(1, Surface::new(width, height, bytes_per_pixel, red_mask));
        Self { state: Rc::new(RefCell::new(state)) }
    }

    pub fn remove_video_surface(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = state.video.take() {
            state.surfaces.remove(&id);
        }
    }

    /// Simulates a window resize the engine has not been told about.
    pub fn resize_video(&self, width: u32, height: u32) {
        if let Some(video) = self.state.borrow_mut().video_mut() {
            let mut resized = Surface::new(width, height, video.bytes_per_pixel, video.red_mask);
            resized.src_alpha = video.src_alpha;
            *video = resized;
        }
    }

    pub fn set_video_pixels(&self, pixels: &[u8]) {
        if let Some(video) = self.state.borrow_mut().video_mut() {
            copy_prefix(&mut video.pixels, pixels);
        }
    }

    pub fn video_pixels(&self) -> Vec<u8> {
        self.state.borrow().video().map(|s| s.pixels.clone()).unwrap_or_default()
    }

    pub fn set_video_src_alpha(&self, enabled: bool) {
        if let Some(video) = self.state.borrow_mut().video_mut() {
            video.src_alpha = enabled;
        }
    }

    pub fn video_src_alpha(&self) -> bool {
        self.state.borrow().video().is_some_and(|s| s.src_alpha)
    }

    pub fn set_video_clip(&self, rect: Rect) {
        if let Some(video) = self.state.borrow_mut().video_mut() {
            video.clip = rect;
        }
    }

    pub fn video_clip(&self) -> Rect {
        self.state.borrow().video().map(|s| s.clip).unwrap_or_default()
    }

    pub fn src_alpha(&self, surface: SurfaceId) -> Option<bool> {
        self.state.borrow().surfaces.get(&surface.0).map(|s| s.src_alpha)
    }

    /// Source alpha flag of the source surface at each blit, in order.
    pub fn blit_alpha_states(&self) -> Vec<bool> {
        self.state.borrow().blit_alpha_states.clone()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.borrow().surfaces.len()
    }

    pub fn set_fail_lock(&self, fail: bool) {
        self.state.borrow_mut().fail_lock = fail;
    }

    pub fn set_fail_display_format(&self, fail: bool) {
        self.state.borrow_mut().fail_display_format = fail;
    }
}

impl SurfacePrimitives for SyntheticSurfaces {
    fn video_surface(&mut self) -> Option<SurfaceId> {
        self.state.borrow().video.map(SurfaceId)
    }

    fn surface_info(&self, surface: SurfaceId) -> SurfaceInfo {
        let state = self.state.borrow();
        match state.surfaces.get(&surface.0) {
            Some(s) => SurfaceInfo {
                width: s.width,
                height: s.height,
                bytes_per_pixel: s.bytes_per_pixel,
                red_mask: s.red_mask,
                src_alpha: s.src_alpha,
            },
            None => SurfaceInfo { width: 0, height: 0, bytes_per_pixel: 0, red_mask: 0, src_alpha: false },
        }
    }

    fn display_format(&mut self, surface: SurfaceId) -> Result<SurfaceId, BackendFault> {
        let mut state = self.state.borrow_mut();
        if state.fail_display_format {
            return Err(BackendFault::new("out of memory"));
        }
        let copy = state
            .surfaces
            .get(&surface.0)
            .cloned()
            .ok_or_else(|| BackendFault::new("invalid surface"))?;
        state.next_id += 1;
        let id = state.next_id;
        state.surfaces.insert(id, copy);
        Ok(SurfaceId(id))
    }

    fn set_alpha(&mut self, surface: SurfaceId, enabled: bool) {
        if let Some(s) = self.state.borrow_mut().surfaces.get_mut(&surface.0) {
            s.src_alpha = enabled;
        }
    }

    fn blit(&mut self, src: SurfaceId, dst: SurfaceId) -> Result<(), BackendFault> {
        let mut state = self.state.borrow_mut();
        let source = state
            .surfaces
            .get(&src.0)
            .cloned()
            .ok_or_else(|| BackendFault::new("invalid source surface"))?;
        state.blit_alpha_states.push(source.src_alpha);
        let target = state
            .surfaces
            .get_mut(&dst.0)
            .ok_or_else(|| BackendFault::new("invalid destination surface"))?;
        target.blit_from(&source);
        Ok(())
    }

    fn lock(&mut self, surface: SurfaceId) -> Result<(), BackendFault> {
        let mut state = self.state.borrow_mut();
        if state.fail_lock {
            return Err(BackendFault::new("surface is busy"));
        }
        let s = state
            .surfaces
            .get_mut(&surface.0)
            .ok_or_else(|| BackendFault::new("invalid surface"))?;
        s.locked = true;
        Ok(())
    }

    fn copy_pixels(&self, surface: SurfaceId, out: &mut [u8]) {
        if let Some(s) = self.state.borrow().surfaces.get(&surface.0) {
            if s.locked {
                copy_prefix(out, &s.pixels);
            }
        }
    }

    fn unlock(&mut self, surface: SurfaceId) {
        if let Some(s) = self.state.borrow_mut().surfaces.get_mut(&surface.0) {
            s.locked = false;
        }
    }

    fn clip_rect(&self, surface: SurfaceId) -> Rect {
        self.state.borrow().surfaces.get(&surface.0).map(|s| s.clip).unwrap_or_default()
    }

    fn set_clip_rect(&mut self, surface: SurfaceId, rect: Option<Rect>) {
        if let Some(s) = self.state.borrow_mut().surfaces.get_mut(&surface.0) {
            s.clip = rect.unwrap_or(Rect::new(0, 0, s.width, s.height));
        }
    }

    fn free_surface(&mut self, surface: SurfaceId) {
        self.state.borrow_mut().surfaces.remove(&surface.0);
    }
}

// ── Hardware renderer ─────────────────────────────────────────────────────────

#[derive(Debug)]
struct RendererState {
    attached: bool,
    format: WindowPixelFormat,
    /// Render target, top row first.
    screen: Vec<u8>,
    pitch: usize,
    textures: HashMap<u32, Vec<u8>>,
    next_id: u32,
    created: usize,
    copies: usize,
    fail_create_texture: bool,
    fail_read: bool,
    fail_copy: bool,
}

/// Renderer whose render target is a plain byte array.
#[derive(Debug, Clone)]
pub struct SyntheticRenderer {
    state: Rc<RefCell<RendererState>>,
}

impl SyntheticRenderer {
    pub fn new(width: u32, height: u32, format: WindowPixelFormat) -> Self {
        let pitch = width as usize * format.bytes_per_pixel();
        let state = RendererState {
            attached: true,
            format,
            screen: vec![0; pitch * height as usize],
            pitch,
            textures: HashMap::new(),
            next_id: 0,
            created: 0,
            copies: 0,
            fail_create_texture: false,
            fail_read: false,
            fail_copy: false,
        };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    pub fn detach_renderer(&self) {
        self.state.borrow_mut().attached = false;
    }

    pub fn set_screen(&self, pixels: &[u8]) {
        copy_prefix(&mut self.state.borrow_mut().screen, pixels);
    }

    pub fn screen(&self) -> Vec<u8> {
        self.state.borrow().screen.clone()
    }

    /// The caller-side texture update path. Returns `false` for an unknown texture.
    pub fn update_texture(&self, texture: TextureId, pixels: &[u8]) -> bool {
        match self.state.borrow_mut().textures.get_mut(&texture.0) {
            Some(data) => {
                copy_prefix(data, pixels);
                true
            }
            None => false,
        }
    }

    pub fn texture_copies(&self) -> usize {
        self.state.borrow().copies
    }

    pub fn created_textures(&self) -> usize {
        self.state.borrow().created
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn set_fail_create_texture(&self, fail: bool) {
        self.state.borrow_mut().fail_create_texture = fail;
    }

    pub fn set_fail_read(&self, fail: bool) {
        self.state.borrow_mut().fail_read = fail;
    }

    pub fn set_fail_copy(&self, fail: bool) {
        self.state.borrow_mut().fail_copy = fail;
    }
}

impl RendererPrimitives for SyntheticRenderer {
    fn renderer(&mut self) -> Option<RendererId> {
        self.state.borrow().attached.then_some(RendererId(1))
    }

    fn window_pixel_format(&self) -> WindowPixelFormat {
        self.state.borrow().format
    }

    fn create_streaming_texture(
        &mut self,
        _renderer: RendererId,
        format: WindowPixelFormat,
        width: u32,
        height: u32,
    ) -> Result<TextureId, BackendFault> {
        let mut state = self.state.borrow_mut();
        if state.fail_create_texture {
            return Err(BackendFault::new("Texture dimensions are limited"));
        }
        state.next_id += 1;
        state.created += 1;
        let id = state.next_id;
        let len = width as usize * height as usize * format.bytes_per_pixel();
        state.textures.insert(id, vec![0; len]);
        Ok(TextureId(id))
    }

    fn read_pixels(&mut self, _renderer: RendererId, out: &mut [u8], pitch: usize) -> Result<(), BackendFault> {
        let state = self.state.borrow();
        if state.fail_read {
            return Err(BackendFault::new("Couldn't read render target"));
        }
        if pitch == 0 || state.pitch == 0 {
            return Ok(());
        }
        for (dst, src) in out.chunks_mut(pitch).zip(state.screen.chunks(state.pitch)) {
            copy_prefix(dst, src);
        }
        Ok(())
    }

    fn copy_texture(&mut self, _renderer: RendererId, texture: TextureId) -> Result<(), BackendFault> {
        let mut state = self.state.borrow_mut();
        if state.fail_copy {
            return Err(BackendFault::new("Renderer lost"));
        }
        let RendererState { screen, textures, copies, .. } = &mut *state;
        let pixels = textures
            .get(&texture.0)
            .ok_or_else(|| BackendFault::new("Invalid texture"))?;
        copy_prefix(screen, pixels);
        *copies += 1;
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.state.borrow_mut().textures.remove(&texture.0);
    }
}
