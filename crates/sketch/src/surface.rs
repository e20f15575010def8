use crate::types::SurfaceDimensions;

/// A render target whose backing store can be resized to match its display size.
pub trait DrawingSurface {
    /// Size the surface currently occupies on screen, in physical pixels.
    fn display_size(&self) -> SurfaceDimensions;
    /// Size of the store the trail is drawn into.
    fn backing_size(&self) -> SurfaceDimensions;
    /// Reallocates the backing store. Previous contents are discarded.
    fn resize_backing(&mut self, size: SurfaceDimensions);
}

/// Makes the backing store match the display size.
///
/// Returns `true` when the backing store was resized. A display size with a
/// zero-length axis is not applied; the last usable size is kept.
pub fn sync<S>(surface: &mut S) -> bool
where
    S: DrawingSurface + ?Sized,
{
    let display_size = surface.display_size();
    if display_size.is_empty() || display_size == surface.backing_size() {
        return false;
    }
    tracing::debug!(
        width = display_size.width,
        height = display_size.height,
        "resizing drawing buffer"
    );
    surface.resize_backing(display_size);
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory surface that records every backing-store reallocation.
    #[derive(Debug, Default)]
    pub(crate) struct FakeSurface {
        pub display: SurfaceDimensions,
        pub backing: SurfaceDimensions,
        pub resizes: Vec<SurfaceDimensions>,
    }

    impl FakeSurface {
        pub(crate) fn new(display: (u32, u32), backing: (u32, u32)) -> Self {
            Self {
                display: SurfaceDimensions::new(display.0, display.1),
                backing: SurfaceDimensions::new(backing.0, backing.1),
                resizes: Vec::new(),
            }
        }
    }

    impl DrawingSurface for FakeSurface {
        fn display_size(&self) -> SurfaceDimensions {
            self.display
        }

        fn backing_size(&self) -> SurfaceDimensions {
            self.backing
        }

        fn resize_backing(&mut self, size: SurfaceDimensions) {
            self.backing = size;
            self.resizes.push(size);
        }
    }

    #[test]
    fn sync_grows_backing_to_display() {
        let mut surface = FakeSurface::new((1024, 768), (800, 600));
        assert!(sync(&mut surface));
        assert_eq!(surface.backing, SurfaceDimensions::new(1024, 768));
    }

    #[test]
    fn sync_is_idempotent() {
        let mut surface = FakeSurface::new((1024, 768), (800, 600));
        sync(&mut surface);
        assert!(!sync(&mut surface));
        assert_eq!(surface.resizes.len(), 1);
    }

    #[test]
    fn sync_ignores_collapsed_display() {
        let mut surface = FakeSurface::new((0, 768), (800, 600));
        assert!(!sync(&mut surface));
        assert_eq!(surface.backing, SurfaceDimensions::new(800, 600));
        assert!(surface.resizes.is_empty());
    }
}
