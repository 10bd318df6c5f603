//! Image display.

use crate::base::geometry::{IRect, IVector2};
use crate::draw::{CopyFrom, draw_alpha_filter};
use crate::filter::{Sampler, resize_rgba};
use crate::gui::attributes::AttributeValue;
use crate::gui::component::{Component, ComponentCore};
use crate::image::pixel::Raster;
use crate::image::ImageRgba;
use std::any::Any;

pub struct Picture {
    core: ComponentCore,
    image: Option<ImageRgba>,
    /// Stretch the image over the whole location instead of drawing it at
    /// its natural size.
    stretch: bool,
    /// Composite with alpha instead of overwriting.
    filtered: bool,
    scaled_cache: Option<ImageRgba>,
}

impl Picture {
    pub fn new() -> Picture {
        Picture { core: ComponentCore::new(), image: None, stretch: true, filtered: true, scaled_cache: None }
    }

    pub fn set_image(&mut self, image: Option<ImageRgba>) {
        self.image = image;
        self.scaled_cache = None;
        self.core.mark_child_changed();
    }
}

impl Default for Picture {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Picture {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }
    fn class_name(&self) -> &'static str {
        "Picture"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn is_container(&self) -> bool {
        false
    }

    fn desired_dimensions(&mut self) -> IVector2 {
        match &self.image {
            Some(image) => IVector2::new(image.width(), image.height()),
            None => IVector2::new(32, 32),
        }
    }

    fn changed_location(&mut self, old_location: IRect, new_location: IRect) {
        if old_location.size() != new_location.size() {
            self.scaled_cache = None;
        }
    }

    fn draw_self(&mut self, target: &ImageRgba, relative_location: IRect) {
        let Some(image) = &self.image else {
            return;
        };
        let same_size =
            image.width() == relative_location.width() && image.height() == relative_location.height();
        let drawn = if !self.stretch || same_size {
            image.clone()
        } else {
            let stale = match &self.scaled_cache {
                Some(cached) => {
                    cached.width() != relative_location.width()
                        || cached.height() != relative_location.height()
                }
                None => true,
            };
            if stale {
                self.scaled_cache = resize_rgba(
                    image,
                    Sampler::Linear,
                    relative_location.width(),
                    relative_location.height(),
                )
                .ok();
            }
            match &self.scaled_cache {
                Some(scaled) => scaled.clone(),
                None => return,
            }
        };
        if self.filtered {
            draw_alpha_filter(target, &drawn, relative_location.left(), relative_location.top());
        } else {
            target.draw_copy(&drawn, relative_location.left(), relative_location.top());
        }
    }

    fn class_attribute(&self, name: &str) -> Option<AttributeValue> {
        if name.eq_ignore_ascii_case("Stretch") {
            Some(AttributeValue::Boolean(self.stretch))
        } else if name.eq_ignore_ascii_case("Filtered") {
            Some(AttributeValue::Boolean(self.filtered))
        } else {
            None
        }
    }

    fn set_class_attribute(&mut self, name: &str, value: &AttributeValue) -> bool {
        if name.eq_ignore_ascii_case("Stretch") {
            if let Some(stretch) = value.as_boolean() {
                self.stretch = stretch;
                self.scaled_cache = None;
                return true;
            }
        } else if name.eq_ignore_ascii_case("Filtered") {
            if let Some(filtered) = value.as_boolean() {
                self.filtered = filtered;
                return true;
            }
        }
        false
    }

    fn class_attribute_names(&self) -> &'static [&'static str] {
        &["Stretch", "Filtered"]
    }
}
