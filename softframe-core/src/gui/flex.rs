//! Declarative parent-relative placement.
//!
//! Each edge of a flex region is a ratio of the parent's given space in
//! whole percent plus a pixel offset. A region of `0% .. 100%` with zero
//! offsets fills its parent.

use crate::base::geometry::IRect;

/// One edge: `ratio` percent of the parent dimension plus `offset` pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlexDimension {
    pub ratio: i32,
    pub offset: i32,
}

impl FlexDimension {
    pub const fn new(ratio: i32, offset: i32) -> Self {
        Self { ratio, offset }
    }

    pub const fn pixels(offset: i32) -> Self {
        Self { ratio: 0, offset }
    }

    fn resolve(&self, origin: i32, size: i32) -> i32 {
        origin + size * self.ratio / 100 + self.offset
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlexRegion {
    pub left: FlexDimension,
    pub top: FlexDimension,
    pub right: FlexDimension,
    pub bottom: FlexDimension,
}

impl Default for FlexRegion {
    fn default() -> Self {
        Self::fill()
    }
}

impl FlexRegion {
    pub const fn new(left: FlexDimension, top: FlexDimension, right: FlexDimension, bottom: FlexDimension) -> Self {
        Self { left, top, right, bottom }
    }

    /// The whole parent.
    pub const fn fill() -> Self {
        Self::new(
            FlexDimension::new(0, 0),
            FlexDimension::new(0, 0),
            FlexDimension::new(100, 0),
            FlexDimension::new(100, 0),
        )
    }

    /// Fixed pixel placement in the parent.
    pub const fn pixels(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(
            FlexDimension::pixels(left),
            FlexDimension::pixels(top),
            FlexDimension::pixels(right),
            FlexDimension::pixels(bottom),
        )
    }

    /// Resolve against the space the parent offers.
    pub fn resolve(&self, given_space: IRect) -> IRect {
        IRect::from_corners(
            self.left.resolve(given_space.left(), given_space.width()),
            self.top.resolve(given_space.top(), given_space.height()),
            self.right.resolve(given_space.left(), given_space.width()),
            self.bottom.resolve(given_space.top(), given_space.height()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_matches_the_given_space() {
        let space = IRect::new(10, 20, 100, 50);
        assert_eq!(FlexRegion::fill().resolve(space), space);
    }

    #[test]
    fn ratios_and_offsets_combine() {
        let region = FlexRegion::new(
            FlexDimension::new(50, -5),
            FlexDimension::new(0, 10),
            FlexDimension::new(100, -10),
            FlexDimension::new(50, 0),
        );
        let resolved = region.resolve(IRect::new(0, 0, 200, 100));
        assert_eq!(resolved, IRect::from_corners(95, 10, 190, 50));
    }

    #[test]
    fn pixel_regions_ignore_the_parent_size() {
        let region = FlexRegion::pixels(10, 10, 30, 30);
        assert_eq!(region.resolve(IRect::new(0, 0, 640, 480)), IRect::from_corners(10, 10, 30, 30));
        assert_eq!(region.resolve(IRect::new(0, 0, 64, 48)), IRect::from_corners(10, 10, 30, 30));
    }
}
