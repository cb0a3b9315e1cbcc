//! Canvas resource pool.
//!
//! Offscreen surfaces are expensive to create (the cosmic backend shapes
//! through a shared font system, a browser canvas would allocate a DOM
//! node). The pool hands out released surfaces LIFO and only calls its
//! factory when empty.

use crate::surface::{FixedPitchSurface, Surface};

pub type SurfaceFactory = Box<dyn FnMut() -> Option<Box<dyn Surface>>>;

pub struct CanvasPool {
    pool: Vec<Box<dyn Surface>>,
    factory: SurfaceFactory,
    capacity: usize,
    created: usize,
}

impl CanvasPool {
    /// Pool that keeps at most `capacity` released surfaces. `factory`
    /// returns `None` when the platform cannot provide a surface.
    pub fn new(
        capacity: usize,
        factory: impl FnMut() -> Option<Box<dyn Surface>> + 'static,
    ) -> Self {
        Self {
            pool: Vec::with_capacity(capacity),
            factory: Box::new(factory),
            capacity,
            created: 0,
        }
    }

    /// Pool of headless [`FixedPitchSurface`]s.
    pub fn fixed_pitch(capacity: usize) -> Self {
        Self::new(capacity, || {
            Some(Box::new(FixedPitchSurface::new()) as Box<dyn Surface>)
        })
    }

    pub fn acquire(&mut self) -> Option<Box<dyn Surface>> {
        if let Some(surface) = self.pool.pop() {
            return Some(surface);
        }
        let surface = (self.factory)();
        match surface {
            Some(_) => {
                self.created += 1;
                log::trace!("CanvasPool: created surface #{}", self.created);
            }
            None => log::warn!("CanvasPool: surface factory returned nothing"),
        }
        surface
    }

    /// Return a surface. Dropped when the pool is already full.
    pub fn release(&mut self, surface: Box<dyn Surface>) {
        if self.pool.len() < self.capacity {
            self.pool.push(surface);
        }
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Surfaces built by the factory so far.
    pub fn created(&self) -> usize {
        self.created
    }
}
