//! Visual themes: parametric image generation per component class.
//!
//! A theme maps class names ("Button", "Panel", "ScrollUp", ...) to a
//! generator with by-name integer arguments: Width, Height, Red, Green,
//! Blue, and the state flags Pressed, Focused and Hover. The theme also
//! advertises which state flags each class actually reads through a
//! listener mask, so components invalidate their cached imagery only when a
//! listened-to bit changes. Themes can be customized from a TOML document.

use crate::base::geometry::IVector2;
use crate::filter::generate_rgba;
use crate::image::color::Color;
use crate::image::ImageRgba;
use serde::Deserialize;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("could not parse the theme document: {0}")]
    BadDocument(String),
}

/// Which state flags a themed class reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateListenMask {
    pub pressed: bool,
    pub focused: bool,
    pub hover: bool,
}

/// The by-name integer arguments of one generation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeRequest {
    pub width: i32,
    pub height: i32,
    pub red: i32,
    pub green: i32,
    pub blue: i32,
    pub pressed: bool,
    pub focused: bool,
    pub hover: bool,
}

impl ThemeRequest {
    pub fn new(width: i32, height: i32, color: Color) -> ThemeRequest {
        ThemeRequest {
            width,
            height,
            red: color.red,
            green: color.green,
            blue: color.blue,
            pressed: false,
            focused: false,
            hover: false,
        }
    }

    pub fn with_states(mut self, pressed: bool, focused: bool, hover: bool) -> ThemeRequest {
        self.pressed = pressed;
        self.focused = focused;
        self.hover = hover;
        self
    }
}

/// Built-in generator shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Generator {
    /// Flat fill with a thin border.
    Panel,
    /// Beveled rounded box reacting to pressed/hover.
    Button,
    /// Sunken box with a focus border, for text and list editing areas.
    Field,
    /// Arrow button pointing along `direction`.
    Arrow { direction: (i32, i32) },
    /// Scroll bar knob.
    Knob,
}

#[derive(Clone, Debug)]
struct ClassStyle {
    generator: Generator,
    /// Overrides the component color when set.
    color: Option<Color>,
    corner_radius: i32,
    listeners: StateListenMask,
}

struct ThemeInner {
    name: String,
    classes: HashMap<String, ClassStyle>,
    fallback: ClassStyle,
}

/// A shared, immutable theme. Components keep a handle and regenerate
/// cached imagery when the theme changes.
#[derive(Clone)]
pub struct Theme {
    inner: Rc<ThemeInner>,
}

fn built_in_classes() -> HashMap<String, ClassStyle> {
    let mut classes = HashMap::new();
    let all = StateListenMask { pressed: true, focused: true, hover: true };
    let quiet = StateListenMask::default();
    classes.insert("Panel".into(), ClassStyle { generator: Generator::Panel, color: None, corner_radius: 0, listeners: quiet });
    classes.insert("Toolbar".into(), ClassStyle { generator: Generator::Panel, color: None, corner_radius: 0, listeners: quiet });
    classes.insert("Button".into(), ClassStyle { generator: Generator::Button, color: None, corner_radius: 3, listeners: all });
    classes.insert("MenuItem".into(), ClassStyle { generator: Generator::Button, color: None, corner_radius: 0, listeners: StateListenMask { pressed: true, focused: false, hover: true } });
    classes.insert("MenuList".into(), ClassStyle { generator: Generator::Field, color: None, corner_radius: 0, listeners: quiet });
    classes.insert("ListBox".into(), ClassStyle { generator: Generator::Field, color: None, corner_radius: 0, listeners: StateListenMask { pressed: false, focused: true, hover: false } });
    classes.insert("TextBox".into(), ClassStyle { generator: Generator::Field, color: None, corner_radius: 0, listeners: StateListenMask { pressed: false, focused: true, hover: false } });
    classes.insert("ScrollUp".into(), ClassStyle { generator: Generator::Arrow { direction: (0, -1) }, color: None, corner_radius: 0, listeners: StateListenMask { pressed: true, focused: false, hover: true } });
    classes.insert("ScrollDown".into(), ClassStyle { generator: Generator::Arrow { direction: (0, 1) }, color: None, corner_radius: 0, listeners: StateListenMask { pressed: true, focused: false, hover: true } });
    classes.insert("ScrollKnob".into(), ClassStyle { generator: Generator::Knob, color: None, corner_radius: 2, listeners: StateListenMask { pressed: true, focused: false, hover: true } });
    classes
}

/// TOML form of a theme: global name plus per-class overrides.
#[derive(Deserialize)]
struct ThemeSpec {
    #[serde(default)]
    name: String,
    #[serde(default)]
    classes: HashMap<String, ClassSpec>,
}

#[derive(Deserialize)]
struct ClassSpec {
    red: Option<i32>,
    green: Option<i32>,
    blue: Option<i32>,
    corner_radius: Option<i32>,
    /// Any of "Pressed", "Focused", "Hover"; replaces the default mask.
    listens: Option<Vec<String>>,
}

impl Theme {
    /// The built-in theme with its default colors.
    pub fn built_in() -> Theme {
        Theme {
            inner: Rc::new(ThemeInner {
                name: "built-in".into(),
                classes: built_in_classes(),
                fallback: ClassStyle {
                    generator: Generator::Panel,
                    color: None,
                    corner_radius: 0,
                    listeners: StateListenMask::default(),
                },
            }),
        }
    }

    /// Customize the built-in generators from a TOML document.
    pub fn from_toml(document: &str) -> Result<Theme, ThemeError> {
        let spec: ThemeSpec = toml::from_str(document).map_err(|e| ThemeError::BadDocument(e.to_string()))?;
        let mut classes = built_in_classes();
        for (class_name, class_spec) in spec.classes {
            let style = classes.entry(class_name).or_insert_with(|| ClassStyle {
                generator: Generator::Panel,
                color: None,
                corner_radius: 0,
                listeners: StateListenMask::default(),
            });
            if let (Some(red), Some(green), Some(blue)) = (class_spec.red, class_spec.green, class_spec.blue) {
                style.color = Some(Color::opaque(red, green, blue));
            }
            if let Some(corner_radius) = class_spec.corner_radius {
                style.corner_radius = corner_radius;
            }
            if let Some(listens) = class_spec.listens {
                let mut mask = StateListenMask::default();
                for flag in listens {
                    match flag.as_str() {
                        "Pressed" => mask.pressed = true,
                        "Focused" => mask.focused = true,
                        "Hover" => mask.hover = true,
                        other => log::warn!("unknown theme listener flag {other:?}"),
                    }
                }
                style.listeners = mask;
            }
        }
        Ok(Theme {
            inner: Rc::new(ThemeInner {
                name: if spec.name.is_empty() { "custom".into() } else { spec.name },
                classes,
                fallback: ClassStyle {
                    generator: Generator::Panel,
                    color: None,
                    corner_radius: 0,
                    listeners: StateListenMask::default(),
                },
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True when both handles refer to the same theme.
    pub fn same_as(&self, other: &Theme) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn class(&self, class_name: &str) -> &ClassStyle {
        match self.inner.classes.get(class_name) {
            Some(style) => style,
            None => {
                // Missing classes fall back to the panel look.
                &self.inner.fallback
            }
        }
    }

    /// The state flags a class reads, for cache invalidation.
    pub fn listener_mask(&self, class_name: &str) -> StateListenMask {
        self.class(class_name).listeners
    }

    /// Generate the image for a class at the requested size, color and
    /// state. Non-positive sizes return a 1x1 image.
    pub fn generate_image(&self, class_name: &str, request: ThemeRequest) -> ImageRgba {
        let style = self.class(class_name);
        let width = request.width.max(1);
        let height = request.height.max(1);
        let base = style.color.unwrap_or(Color::opaque(request.red, request.green, request.blue)).saturate();
        let image = match style.generator {
            Generator::Panel => generate_rgba(width, height, |x, y| {
                let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                if edge { shade(base, -40) } else { base }
            }),
            Generator::Button => {
                let radius = style.corner_radius.min(width / 2).min(height / 2);
                let fill = if request.pressed {
                    shade(base, -50)
                } else if request.hover {
                    shade(base, 25)
                } else {
                    base
                };
                generate_rgba(width, height, |x, y| {
                    if !inside_rounded_box(x, y, width, height, radius) {
                        return Color::new(0, 0, 0, 0);
                    }
                    if on_rounded_border(x, y, width, height, radius) {
                        return if request.focused { shade(base, 70) } else { shade(base, -80) };
                    }
                    // A soft vertical bevel, flipped while pressed.
                    let ramp = (y * 30 / height.max(1)) - 15;
                    shade(fill, if request.pressed { ramp } else { -ramp })
                })
            }
            Generator::Field => {
                let border = if request.focused { shade(base, 70) } else { shade(base, -60) };
                let fill = shade(base, 55);
                generate_rgba(width, height, |x, y| {
                    let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                    if edge { border } else { fill }
                })
            }
            Generator::Arrow { direction } => {
                let fill = if request.pressed { shade(base, -50) } else if request.hover { shade(base, 25) } else { base };
                let arrow = shade(base, -100);
                let center = IVector2::new(width / 2, height / 2);
                generate_rgba(width, height, |x, y| {
                    let edge = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                    if edge {
                        return shade(base, -80);
                    }
                    // A filled triangle pointing along the direction.
                    let along = (x - center.x) * direction.0 + (y - center.y) * direction.1;
                    let across = (x - center.x) * direction.1.abs() + (y - center.y) * direction.0.abs();
                    let reach = width.min(height) / 4;
                    if along <= reach / 2 && along >= -reach && across.abs() <= (along + reach) / 2 {
                        arrow
                    } else {
                        fill
                    }
                })
            }
            Generator::Knob => {
                let radius = style.corner_radius.min(width / 2).min(height / 2);
                let fill = if request.pressed { shade(base, -30) } else if request.hover { shade(base, 35) } else { shade(base, 15) };
                generate_rgba(width, height, |x, y| {
                    if !inside_rounded_box(x, y, width, height, radius) {
                        return Color::new(0, 0, 0, 0);
                    }
                    if on_rounded_border(x, y, width, height, radius) { shade(base, -70) } else { fill }
                })
            }
        };
        image.unwrap_or_else(|_| ImageRgba::create(1, 1).expect("smallest image"))
    }
}

fn shade(color: Color, amount: i32) -> Color {
    Color::new(color.red + amount, color.green + amount, color.blue + amount, color.alpha).saturate()
}

fn corner_distance_squared(x: i32, y: i32, width: i32, height: i32, radius: i32) -> Option<i32> {
    let corner_x = if x < radius {
        Some(radius - 1)
    } else if x >= width - radius {
        Some(width - radius)
    } else {
        None
    };
    let corner_y = if y < radius {
        Some(radius - 1)
    } else if y >= height - radius {
        Some(height - radius)
    } else {
        None
    };
    match (corner_x, corner_y) {
        (Some(cx), Some(cy)) => {
            let dx = x - cx;
            let dy = y - cy;
            Some(dx * dx + dy * dy)
        }
        _ => None,
    }
}

fn inside_rounded_box(x: i32, y: i32, width: i32, height: i32, radius: i32) -> bool {
    match corner_distance_squared(x, y, width, height, radius) {
        Some(distance) => distance <= radius * radius,
        None => true,
    }
}

fn on_rounded_border(x: i32, y: i32, width: i32, height: i32, radius: i32) -> bool {
    if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
        return true;
    }
    match corner_distance_squared(x, y, width, height, radius) {
        Some(distance) => distance > (radius - 1) * (radius - 1),
        None => false,
    }
}

/// Regenerates a themed image only when size, color or a listened-to state
/// flag changed since the last call.
pub struct ThemeImageCache {
    image: Option<ImageRgba>,
    key: Option<ThemeRequest>,
}

impl ThemeImageCache {
    pub fn new() -> ThemeImageCache {
        ThemeImageCache { image: None, key: None }
    }

    /// Drop the cached image, forcing regeneration on the next fetch.
    pub fn invalidate(&mut self) {
        self.image = None;
        self.key = None;
    }

    /// Fetch the image for `request`, masking out state flags the class
    /// does not listen to before comparing with the cached key.
    pub fn fetch(&mut self, theme: &Theme, class_name: &str, request: ThemeRequest) -> ImageRgba {
        let mask = theme.listener_mask(class_name);
        let masked = ThemeRequest {
            pressed: request.pressed && mask.pressed,
            focused: request.focused && mask.focused,
            hover: request.hover && mask.hover,
            ..request
        };
        if self.key != Some(masked) || self.image.is_none() {
            self.image = Some(theme.generate_image(class_name, masked));
            self.key = Some(masked);
        }
        self.image.clone().expect("image cached above")
    }
}

impl Default for ThemeImageCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::pixel::Raster;

    #[test]
    fn generated_images_match_the_requested_size() {
        let theme = Theme::built_in();
        let image = theme.generate_image("Button", ThemeRequest::new(30, 20, Color::opaque(130, 130, 130)));
        assert_eq!((image.width(), image.height()), (30, 20));
        // Unknown classes fall back instead of failing.
        let fallback = theme.generate_image("Nonexistent", ThemeRequest::new(8, 8, Color::opaque(1, 2, 3)));
        assert_eq!((fallback.width(), fallback.height()), (8, 8));
    }

    #[test]
    fn pressed_buttons_render_differently() {
        let theme = Theme::built_in();
        let request = ThemeRequest::new(20, 12, Color::opaque(130, 130, 130));
        let idle = theme.generate_image("Button", request);
        let pressed = theme.generate_image("Button", request.with_states(true, false, false));
        assert!(crate::image::max_difference_rgba(&idle, &pressed) > 0);
    }

    #[test]
    fn cache_regenerates_only_for_listened_state_changes() {
        let theme = Theme::built_in();
        let mut cache = ThemeImageCache::new();
        let request = ThemeRequest::new(16, 16, Color::opaque(100, 100, 100));
        let first = cache.fetch(&theme, "Panel", request);
        // Panel listens to no state flags, so a pressed request reuses the
        // cached image.
        let second = cache.fetch(&theme, "Panel", request.with_states(true, true, true));
        assert!(first.shares_buffer(&second));
        // Buttons listen to pressed, so the image regenerates.
        let idle = cache.fetch(&theme, "Button", request);
        let pressed = cache.fetch(&theme, "Button", request.with_states(true, false, false));
        assert!(!idle.shares_buffer(&pressed));
    }

    #[test]
    fn toml_overrides_colors_and_listeners() {
        let theme = Theme::from_toml(
            r#"
            name = "slate"
            [classes.Button]
            red = 40
            green = 44
            blue = 52
            corner_radius = 1
            listens = ["Pressed"]
            "#,
        )
        .unwrap();
        assert_eq!(theme.name(), "slate");
        let mask = theme.listener_mask("Button");
        assert!(mask.pressed && !mask.hover && !mask.focused);
        // The override wins over the requested color.
        let image = theme.generate_image("Button", ThemeRequest::new(9, 9, Color::opaque(200, 0, 0)));
        let center = image.read_color_clamp(4, 4);
        assert!(center.red < 100, "expected the slate override, got {center:?}");
    }

    #[test]
    fn bad_theme_documents_are_an_error() {
        assert!(Theme::from_toml("classes = 5").is_err());
    }
}
